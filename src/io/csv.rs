use csv::{ReaderBuilder, Trim, WriterBuilder};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::column::{ColumnOptions, ColumnType};
use crate::config::TableConfig;
use crate::error::Result;
use crate::series::parse_time;
use crate::table::Table;
use crate::value::Value;

/// CSV読み込みのオプション
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// 先頭行をヘッダーとして扱う
    pub has_header: bool,
    pub delimiter: u8,
    /// 受け付ける日時フォーマット（空の場合はテーブル設定のもの）
    pub time_formats: Vec<String>,
    pub config: TableConfig,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            has_header: true,
            delimiter: b',',
            time_formats: Vec::new(),
            config: TableConfig::default(),
        }
    }
}

impl CsvOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Adds a timestamp format. Formats are tried in the order they were added.
    pub fn accept_date(mut self, format: &str) -> Self {
        self.time_formats.push(format.to_string());
        self
    }

    pub fn config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    fn formats(&self) -> &[String] {
        if self.time_formats.is_empty() {
            &self.config.time_formats
        } else {
            &self.time_formats
        }
    }
}

/// CSVファイルからテーブルを読み込む
pub fn import<P: AsRef<Path>>(name: &str, path: P, options: &CsvOptions) -> Result<Table> {
    let file = File::open(path.as_ref())?;
    import_reader(name, file, options)
}

/// Reads a table from any CSV source.
///
/// Each column gets the first type of `int64`, `float64`, `bool` and `time`
/// that accepts every non-empty cell, else `string`. Empty cells are null.
pub fn import_reader<R: Read>(name: &str, reader: R, options: &CsvOptions) -> Result<Table> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(options.has_header)
        .delimiter(options.delimiter)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut headers: Vec<String> = if options.has_header {
        rdr.headers()?.iter().map(|h| h.to_string()).collect()
    } else {
        Vec::new()
    };

    // データを列ごとに収集
    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    let mut rows = 0;
    for result in rdr.records() {
        let record = result?;
        while cells.len() < record.len() {
            cells.push(vec![String::new(); rows]);
        }
        for (i, column) in cells.iter_mut().enumerate() {
            column.push(record.get(i).unwrap_or("").to_string());
        }
        rows += 1;
    }
    // ヘッダーがない列は "column_0", "column_1" などとする
    for i in headers.len()..cells.len() {
        headers.push(format!("column_{}", i));
    }

    let formats = options.formats().to_vec();
    let mut table = Table::with_config(name, options.config.clone());
    for (header, column) in headers.iter().zip(cells) {
        let ctype = infer_type(&column, &formats);
        log::debug!("csv column '{}' inferred as {}", header, ctype);
        let values: Vec<Value> = column
            .into_iter()
            .map(|cell| if cell.is_empty() { Value::Null } else { Value::String(cell) })
            .collect();
        let column_options = ColumnOptions::new()
            .values(values)
            .time_formats(formats.iter().cloned());
        table.add_column(header, ctype, column_options)?;
    }
    Ok(table)
}

fn is_bool(cell: &str) -> bool {
    cell.eq_ignore_ascii_case("true") || cell.eq_ignore_ascii_case("false")
}

fn infer_type(cells: &[String], formats: &[String]) -> ColumnType {
    let present: Vec<&str> = cells
        .iter()
        .map(String::as_str)
        .filter(|c| !c.is_empty())
        .collect();
    if present.is_empty() {
        return ColumnType::STRING;
    }
    if present.iter().all(|c| c.parse::<i64>().is_ok()) {
        ColumnType::INT64
    } else if present.iter().all(|c| c.parse::<f64>().is_ok()) {
        ColumnType::FLOAT64
    } else if present.iter().all(|c| is_bool(c)) {
        ColumnType::BOOL
    } else if present.iter().all(|c| parse_time(c, formats).is_some()) {
        ColumnType::TIME
    } else {
        ColumnType::STRING
    }
}

/// テーブルの表示列をCSVとして書き出す
pub fn export<W: Write>(table: &Table, writer: W) -> Result<()> {
    let table = table.materialized()?;
    let columns = table.visible_columns();
    let mut wtr = WriterBuilder::new().from_writer(writer);

    wtr.write_record(columns.iter().map(|c| c.name()))?;
    for i in 0..table.num_rows() {
        wtr.write_record(columns.iter().map(|c| c.series().get(i).render()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// CSVファイルに書き込む
pub fn export_file<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    export(table, file)
}
