//! Map, row and schema export

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Table;
use crate::column::{Column, ColumnType};
use crate::error::Result;
use crate::value::{JsonObject, Value};

/// エクスポートのオプション
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// 非表示列も出力する
    pub with_hidden: bool,
    /// Replacement for null cells in `to_map`, keyed by column type.
    /// A `Value::Null` entry keeps the nulls of that type.
    pub null_defaults: HashMap<ColumnType, Value>,
}

// 0001-01-01T00:00:00Z
const ZERO_TIME_SECS: i64 = -62_135_596_800;

impl Default for ExportOptions {
    /// Strings default to `""`, floats to `0.0`, arrays to `[]`, objects to
    /// `{}` and times to 0001-01-01. Nulls of other types stay null.
    fn default() -> Self {
        let mut null_defaults = HashMap::new();
        null_defaults.insert(ColumnType::STRING, Value::String(String::new()));
        null_defaults.insert(ColumnType::FLOAT32, Value::Float32(0.0));
        null_defaults.insert(ColumnType::FLOAT64, Value::Float64(0.0));
        null_defaults.insert(ColumnType::ARRAY, Value::Array(Vec::new()));
        null_defaults.insert(ColumnType::OBJECT, Value::Object(JsonObject::new()));
        null_defaults.insert(ColumnType::ARRAY_OBJECT, Value::ArrayObject(Vec::new()));
        if let Some(zero) = DateTime::<Utc>::from_timestamp(ZERO_TIME_SECS, 0) {
            null_defaults.insert(ColumnType::TIME, Value::Time(zero));
        }
        ExportOptions {
            with_hidden: false,
            null_defaults,
        }
    }
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hidden(mut self, with_hidden: bool) -> Self {
        self.with_hidden = with_hidden;
        self
    }

    pub fn null_default(mut self, ctype: ColumnType, value: impl Into<Value>) -> Self {
        self.null_defaults.insert(ctype, value.into());
        self
    }
}

/// Serializable description of a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    #[serde(rename = "cols")]
    pub columns: Vec<SchemaColumn>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub ctype: ColumnType,
}

impl Table {
    fn exported_columns<'a>(&'a self, options: &ExportOptions) -> Vec<&'a Column> {
        self.columns()
            .iter()
            .filter(|c| options.with_hidden || c.is_visible())
            .collect()
    }

    /// One name-keyed map per row
    pub fn to_map(&self, options: &ExportOptions) -> Result<Vec<HashMap<String, Value>>> {
        let table = self.materialized()?;
        let columns = table.exported_columns(options);
        let rows = (0..table.num_rows())
            .map(|i| {
                columns
                    .iter()
                    .map(|column| {
                        let mut value = column.series().get(i);
                        if value.is_null() {
                            if let Some(default) = options.null_defaults.get(column.column_type()) {
                                value = default.clone();
                            }
                        }
                        (column.name().to_string(), value)
                    })
                    .collect()
            })
            .collect();
        Ok(rows)
    }

    /// Header row of column names followed by one row per record
    pub fn to_rows(&self, options: &ExportOptions) -> Result<Vec<Vec<Value>>> {
        let table = self.materialized()?;
        let columns = table.exported_columns(options);
        let mut rows = Vec::with_capacity(table.num_rows() + 1);
        rows.push(columns.iter().map(|c| Value::from(c.name())).collect());
        rows.extend(table.records(&columns));
        Ok(rows)
    }

    pub fn to_schema(&self, options: &ExportOptions) -> Result<Schema> {
        let table = self.materialized()?;
        let columns = table.exported_columns(options);
        Ok(Schema {
            name: table.name().to_string(),
            columns: columns
                .iter()
                .map(|c| SchemaColumn {
                    name: c.name().to_string(),
                    ctype: c.column_type().clone(),
                })
                .collect(),
            rows: table.records(&columns),
        })
    }

    fn records(&self, columns: &[&Column]) -> Vec<Vec<Value>> {
        (0..self.num_rows())
            .map(|i| columns.iter().map(|c| c.series().get(i)).collect())
            .collect()
    }
}
