//! Text rendering of tables

use std::fmt::{self, Display};
use std::io::Write;

use super::Table;
use crate::column::Column;
use crate::error::Result;

/// 表示オプション
#[derive(Debug, Clone)]
pub struct PrintOptions {
    pub column_name: bool,
    pub column_label: bool,
    pub column_type: bool,
    pub row_number: bool,
    /// 最大表示行数（Noneの場合はテーブル設定の値）
    pub max_rows: Option<usize>,
    /// Restricts the output to these columns
    pub select_columns: Option<Vec<String>>,
}

impl Default for PrintOptions {
    fn default() -> Self {
        PrintOptions {
            column_name: true,
            column_label: false,
            column_type: true,
            row_number: true,
            max_rows: None,
            select_columns: None,
        }
    }
}

impl PrintOptions {
    pub fn max_rows(mut self, rows: usize) -> Self {
        self.max_rows = Some(rows);
        self
    }

    pub fn select_columns(mut self, names: &[&str]) -> Self {
        self.select_columns = Some(names.iter().map(|s| s.to_string()).collect());
        self
    }
}

impl Table {
    /// Writes the visible columns as aligned text.
    ///
    /// When the table has more rows than `max_rows`, the first and last
    /// halves are printed around a `...` line.
    pub fn print<W: Write>(&self, writer: &mut W, options: &PrintOptions) -> Result<()> {
        let text = self.render(options)?;
        writer.write_all(text.as_bytes())?;
        Ok(())
    }

    fn render(&self, options: &PrintOptions) -> Result<String> {
        let table = self.materialized()?;
        let columns: Vec<&Column> = table
            .visible_columns()
            .into_iter()
            .filter(|c| match &options.select_columns {
                Some(names) => names.iter().any(|n| n == c.name()),
                None => true,
            })
            .collect();

        let mut lines: Vec<Vec<String>> = Vec::new();
        let number = |label: &str| if options.row_number { vec![label.to_string()] } else { Vec::new() };
        let header = |f: &dyn Fn(&Column) -> String| {
            let mut line = number("");
            line.extend(columns.iter().map(|&c| f(c)));
            line
        };
        if options.column_name {
            lines.push(header(&|c| c.name().to_string()));
        }
        if options.column_label {
            lines.push(header(&|c| c.label().to_string()));
        }
        if options.column_type {
            lines.push(header(&|c| format!("<{}>", c.column_type())));
        }
        if let Some(first) = lines.first_mut() {
            if options.row_number {
                first[0] = "#".to_string();
            }
        }

        let max_rows = options.max_rows.unwrap_or(table.config().max_print_rows);
        let total = table.num_rows();
        let (head, tail) = if total > max_rows {
            let half = max_rows / 2;
            (half, total - half)
        } else {
            (total, total)
        };

        let record = |i: usize| {
            let mut line = number(&i.to_string());
            line.extend(columns.iter().map(|c| c.series().get(i).to_string()));
            line
        };
        lines.extend((0..head).map(&record));
        if head < tail {
            let mut line = number("...");
            line.extend(columns.iter().map(|_| "...".to_string()));
            lines.push(line);
        }
        lines.extend((tail.max(head)..total).map(&record));

        let width = lines.iter().map(Vec::len).max().unwrap_or(0);
        let mut widths = vec![0; width];
        for line in &lines {
            for (w, cell) in widths.iter_mut().zip(line) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        for line in &lines {
            let cells: Vec<String> = line
                .iter()
                .zip(&widths)
                .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
                .collect();
            out.push_str(cells.join("  ").trim_end());
            out.push('\n');
        }
        Ok(out)
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Table: {} ({} rows x {} columns)",
            self.name(),
            self.num_rows(),
            self.num_cols()
        )?;
        let text = self.render(&PrintOptions::default()).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
