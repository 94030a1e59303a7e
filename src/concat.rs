//! Row-wise concatenation of tables

use std::iter;

use ahash::AHashMap;

use crate::column::Column;
use crate::error::Result;
use crate::table::{Materialized, Table};

impl Table {
    /// Appends the rows of `others` below the rows of this table.
    ///
    /// The output columns are the union of the input columns in first-seen
    /// order. The first table defining a column fixes its type, label,
    /// attributes and visibility, and values from later tables are converted
    /// to that type. Rows of a table lacking a column are null there.
    /// Formulas are evaluated and the results stored as plain values.
    pub fn concat(&self, others: &[&Table]) -> Result<Table> {
        let inputs = iter::once(self)
            .chain(others.iter().copied())
            .map(Table::materialized)
            .collect::<Result<Vec<Materialized<'_>>>>()?;

        let mut columns: Vec<Column> = Vec::new();
        let mut positions: AHashMap<String, usize> = AHashMap::new();
        let mut total = 0;

        for input in &inputs {
            for column in input.columns() {
                if positions.contains_key(column.name()) {
                    continue;
                }
                if total > 0 {
                    log::debug!(
                        "concat on '{}' adds column '{}' after {} rows",
                        self.name(),
                        column.name(),
                        total
                    );
                }
                let mut series = column.series().empty_copy();
                series.grow(total);
                positions.insert(column.name().to_string(), columns.len());
                columns.push(column.stored_with(series));
            }

            let rows = input.num_rows();
            for column in &mut columns {
                let source = input.column(column.name());
                let target = column.series_mut();
                match source {
                    Some(source) => {
                        for value in source.series().iter() {
                            target.append(&value);
                        }
                    }
                    None => target.grow(rows),
                }
            }
            total += rows;
        }

        let mut out = self.derive(self.name());
        for column in columns {
            out.push_column(column)?;
        }
        log::debug!(
            "concatenated {} tables into '{}' ({} rows)",
            inputs.len(),
            out.name(),
            total
        );
        Ok(out)
    }
}
