//! Relational joins
//!
//! Keys are written `[table].[field]`, `[field]` or `field` and parsed with
//! [`on`]. Key `i` of the left list is matched with key `i` of the right list
//! and every pair must hold for two rows to match.

use std::fmt::{self, Display};

use ahash::AHashMap;
use lazy_static::lazy_static;
use regex::Regex;

use crate::config::TableConfig;
use crate::error::{Error, Result};
use crate::table::Table;
use crate::value::KeyPart;

/// Qualifier of a key that may refer to either table
pub const ANY_TABLE: &str = "*";

lazy_static! {
    static ref QUALIFIED: Regex =
        Regex::new(r"^\[([^\[\]]+)\]\.\[([^\[\]]+)\]$").expect("qualified key pattern");
    static ref BRACKETED: Regex = Regex::new(r"^\[([^\[\]]+)\]$").expect("bracketed key pattern");
}

/// 結合キーの参照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOn {
    /// テーブル名（`*` は修飾なし）
    pub table: String,
    pub field: String,
}

impl JoinOn {
    pub fn new(table: &str, field: &str) -> Self {
        JoinOn {
            table: table.to_string(),
            field: field.to_string(),
        }
    }

    /// Parses one key reference. Text matching no known form is taken as an
    /// unqualified field name.
    pub fn parse(reference: &str) -> Self {
        if let Some(caps) = QUALIFIED.captures(reference) {
            return JoinOn::new(&caps[1], &caps[2]);
        }
        if let Some(caps) = BRACKETED.captures(reference) {
            return JoinOn::new(ANY_TABLE, &caps[1]);
        }
        JoinOn::new(ANY_TABLE, reference)
    }
}

/// Parses a list of key references
pub fn on(references: &[&str]) -> Vec<JoinOn> {
    references.iter().map(|r| JoinOn::parse(r)).collect()
}

/// 結合の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// 内部結合
    Inner,
    /// 左外部結合
    Left,
    /// 右外部結合
    Right,
    /// 完全外部結合
    Outer,
}

impl JoinType {
    fn keeps_left(&self) -> bool {
        matches!(self, JoinType::Left | JoinType::Outer)
    }

    fn keeps_right(&self) -> bool {
        matches!(self, JoinType::Right | JoinType::Outer)
    }
}

impl Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JoinType::Inner => "inner",
            JoinType::Left => "left",
            JoinType::Right => "right",
            JoinType::Outer => "outer",
        };
        f.write_str(name)
    }
}

// キー列の位置を解決する
fn resolve_keys(table: &Table, side: &str, keys: &[JoinOn]) -> Result<Vec<usize>> {
    keys.iter()
        .map(|key| {
            if key.table != ANY_TABLE && key.table != table.name() {
                return Err(Error::InvalidJoinSpec(format!(
                    "{} key '{}' refers to table '{}', expected '{}'",
                    side,
                    key.field,
                    key.table,
                    table.name()
                )));
            }
            table.column_index(&key.field).ok_or_else(|| {
                Error::InvalidJoinSpec(format!(
                    "{} key '{}' is not a column of '{}'",
                    side,
                    key.field,
                    table.name()
                ))
            })
        })
        .collect()
}

fn row_key(table: &Table, keys: &[usize], row: usize) -> Vec<KeyPart> {
    keys.iter()
        .map(|&idx| table.columns()[idx].series().get(row).key_part())
        .collect()
}

fn build_index(table: &Table, keys: &[usize]) -> AHashMap<Vec<KeyPart>, Vec<usize>> {
    let mut index: AHashMap<Vec<KeyPart>, Vec<usize>> = AHashMap::new();
    for row in 0..table.num_rows() {
        index.entry(row_key(table, keys, row)).or_default().push(row);
    }
    index
}

/// Matching `(left row, right row)` pairs sorted by left row, then right row.
/// The hash index is built over the smaller table and probed with the other.
fn matching_pairs(
    left: &Table,
    left_keys: &[usize],
    right: &Table,
    right_keys: &[usize],
) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    if right.num_rows() <= left.num_rows() {
        let index = build_index(right, right_keys);
        for l in 0..left.num_rows() {
            if let Some(rows) = index.get(&row_key(left, left_keys, l)) {
                pairs.extend(rows.iter().map(|&r| (l, r)));
            }
        }
    } else {
        log::trace!("join indexes the left table '{}'", left.name());
        let index = build_index(left, left_keys);
        for r in 0..right.num_rows() {
            if let Some(rows) = index.get(&row_key(right, right_keys, r)) {
                pairs.extend(rows.iter().map(|&l| (l, r)));
            }
        }
        pairs.sort_unstable();
    }
    pairs
}

impl Table {
    /// Joins `other` to this table.
    ///
    /// The output holds the visible columns of this table followed by the
    /// visible columns of `other`. A right column whose name is taken gets
    /// the configured suffix. Matching rows come in left-row order, and the
    /// matches of one left row keep right-row order.
    pub fn join(
        &self,
        other: &Table,
        how: JoinType,
        left_on: &[JoinOn],
        right_on: &[JoinOn],
    ) -> Result<Table> {
        if left_on.is_empty() || right_on.is_empty() {
            return Err(Error::InvalidJoinSpec("empty key list".to_string()));
        }
        if left_on.len() != right_on.len() {
            return Err(Error::InvalidJoinSpec(format!(
                "{} left keys for {} right keys",
                left_on.len(),
                right_on.len()
            )));
        }
        let left_keys = resolve_keys(self, "left", left_on)?;
        let right_keys = resolve_keys(other, "right", right_on)?;

        let left = self.materialized()?;
        let right = other.materialized()?;

        let pairs = matching_pairs(&left, &left_keys, &right, &right_keys);

        let mut left_rows: Vec<Option<usize>> = Vec::new();
        let mut right_rows: Vec<Option<usize>> = Vec::new();
        let mut matched = vec![false; right.num_rows()];
        let mut next = 0;
        for l in 0..left.num_rows() {
            let start = next;
            while next < pairs.len() && pairs[next].0 == l {
                let r = pairs[next].1;
                left_rows.push(Some(l));
                right_rows.push(Some(r));
                matched[r] = true;
                next += 1;
            }
            if start == next && how.keeps_left() {
                left_rows.push(Some(l));
                right_rows.push(None);
            }
        }
        if how.keeps_right() {
            for (r, _) in matched.iter().enumerate().filter(|(_, m)| !**m) {
                left_rows.push(None);
                right_rows.push(Some(r));
            }
        }

        let mut out = left.derive(left.name());
        for column in left.visible_columns() {
            out.push_column(column.stored_with(column.series().pick_nullable(&left_rows)))?;
        }
        let suffix = match self.config().join_suffix.as_str() {
            "" => TableConfig::default().join_suffix,
            suffix => suffix.to_string(),
        };
        for column in right.visible_columns() {
            let mut joined = column.stored_with(column.series().pick_nullable(&right_rows));
            let mut name = column.name().to_string();
            while out.has_column(&name) {
                name.push_str(&suffix);
            }
            joined.set_name(&name);
            out.push_column(joined)?;
        }

        log::debug!(
            "{} join of '{}' ({} rows) and '{}' ({} rows) produced {} rows",
            how,
            left.name(),
            left.num_rows(),
            right.name(),
            right.num_rows(),
            left_rows.len()
        );
        Ok(out)
    }

    /// 内部結合
    pub fn inner_join(&self, other: &Table, left_on: &[JoinOn], right_on: &[JoinOn]) -> Result<Table> {
        self.join(other, JoinType::Inner, left_on, right_on)
    }

    /// 左外部結合
    pub fn left_join(&self, other: &Table, left_on: &[JoinOn], right_on: &[JoinOn]) -> Result<Table> {
        self.join(other, JoinType::Left, left_on, right_on)
    }

    /// 右外部結合
    pub fn right_join(&self, other: &Table, left_on: &[JoinOn], right_on: &[JoinOn]) -> Result<Table> {
        self.join(other, JoinType::Right, left_on, right_on)
    }

    /// 完全外部結合
    pub fn outer_join(&self, other: &Table, left_on: &[JoinOn], right_on: &[JoinOn]) -> Result<Table> {
        self.join(other, JoinType::Outer, left_on, right_on)
    }
}
