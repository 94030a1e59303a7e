use std::cmp::Ordering;

use super::Table;
use crate::error::{Error, Result};

/// ソートキー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(column: &str) -> Self {
        SortKey {
            column: column.to_string(),
            descending: false,
        }
    }

    pub fn desc(column: &str) -> Self {
        SortKey {
            column: column.to_string(),
            descending: true,
        }
    }
}

impl From<&str> for SortKey {
    fn from(column: &str) -> Self {
        SortKey::asc(column)
    }
}

impl Table {
    /// Sorts the rows in place by `keys`, first key first.
    ///
    /// The sort is stable and uses each column's comparator, so nulls come
    /// last in ascending order and first in descending order. Pending
    /// formulas are evaluated first.
    pub fn sort(&mut self, keys: &[SortKey]) -> Result<()> {
        self.evaluate_expressions()?;
        let columns = keys
            .iter()
            .map(|key| {
                self.column_index(&key.column)
                    .map(|idx| (idx, key.descending))
                    .ok_or_else(|| Error::ColumnNotFound(key.column.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut order: Vec<usize> = (0..self.num_rows()).collect();
        order.sort_by(|&a, &b| {
            for &(idx, descending) in &columns {
                let ordering = self.columns[idx].series().compare(a, b);
                let ordering = if descending { ordering.reverse() } else { ordering };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });

        for column in &mut self.columns {
            let picked = column.series().pick(&order);
            column.set_series(picked);
        }
        Ok(())
    }

    /// Sorted copy of the table
    pub fn sorted(&self, keys: &[SortKey]) -> Result<Table> {
        let mut table = self.copy()?;
        table.sort(keys)?;
        Ok(table)
    }
}
