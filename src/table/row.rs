use std::collections::HashMap;

use super::Table;
use crate::value::Value;

/// 1行分の読み取り専用ビュー
///
/// Lookups are by column name and include hidden and computed columns.
#[derive(Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Row<'a> {
    pub(crate) fn new(table: &'a Table, index: usize) -> Self {
        Row { table, index }
    }

    /// 行番号
    pub fn index(&self) -> usize {
        self.index
    }

    /// Value of column `name`, `None` when the column does not exist
    pub fn get(&self, name: &str) -> Option<Value> {
        self.table
            .column(name)
            .map(|column| column.series().get(self.index))
    }

    /// Like `get`, with null for an unknown column
    pub fn value(&self, name: &str) -> Value {
        self.get(name).unwrap_or(Value::Null)
    }

    /// Values in column order
    pub fn values(&self) -> Vec<Value> {
        self.table
            .columns()
            .iter()
            .map(|column| column.series().get(self.index))
            .collect()
    }

    pub fn to_map(&self) -> HashMap<String, Value> {
        self.table
            .columns()
            .iter()
            .map(|column| (column.name().to_string(), column.series().get(self.index)))
            .collect()
    }
}

/// Iterator over the rows of a table
pub struct Rows<'a> {
    table: &'a Table,
    pos: usize,
}

impl<'a> Rows<'a> {
    pub(crate) fn new(table: &'a Table) -> Self {
        Rows { table, pos: 0 }
    }
}

impl<'a> Iterator for Rows<'a> {
    type Item = Row<'a>;

    fn next(&mut self) -> Option<Row<'a>> {
        if self.pos >= self.table.num_rows() {
            return None;
        }
        let row = Row::new(self.table, self.pos);
        self.pos += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.table.num_rows().saturating_sub(self.pos);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Rows<'_> {}
