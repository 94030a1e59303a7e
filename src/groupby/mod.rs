//! Row grouping
//!
//! [`Table::group_by`] evaluates every keyer on every row and partitions the
//! rows by the resulting key tuple. Groups keep first-occurrence order.

mod aggregate;

use std::fmt;
use std::sync::Arc;

use ahash::{AHashMap, RandomState};

use crate::column::ColumnType;
use crate::error::{Error, Result};
use crate::table::{Materialized, Row, Table};
use crate::value::{KeyPart, Value};

pub use aggregate::{aggregate, AggregateBy, AggregationType};

/// Key extraction function. `None` means the row has no key for this slot.
pub type Keyer = Arc<dyn Fn(&Row<'_>) -> Option<Value> + Send + Sync>;

/// グループ化の指定
#[derive(Clone)]
pub struct GroupBy {
    /// 出力列の名前
    pub name: String,
    /// 出力列の型（省略時は同名の元の列の型）
    pub ctype: Option<ColumnType>,
    pub keyer: Keyer,
}

impl GroupBy {
    pub fn new<F>(name: &str, keyer: F) -> Self
    where
        F: Fn(&Row<'_>) -> Option<Value> + Send + Sync + 'static,
    {
        GroupBy {
            name: name.to_string(),
            ctype: None,
            keyer: Arc::new(keyer),
        }
    }

    /// Groups by the value of column `name`
    pub fn column(name: &str) -> Self {
        let field = name.to_string();
        GroupBy::new(name, move |row| row.get(&field))
    }

    pub fn with_type(mut self, ctype: ColumnType) -> Self {
        self.ctype = Some(ctype);
        self
    }
}

impl fmt::Debug for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupBy")
            .field("name", &self.name)
            .field("ctype", &self.ctype)
            .finish()
    }
}

/// 行のグループ
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// Digest of the key tuple
    pub key: u64,
    /// Key tuple, one value per group-by spec
    pub buckets: Vec<Value>,
    /// Member rows in scan order
    pub rows: Vec<usize>,
    /// The group covers every row of the source table
    pub take_all: bool,
}

impl Group {
    /// Group spanning the whole table
    pub fn take_all() -> Self {
        Group {
            key: 0,
            buckets: Vec::new(),
            rows: Vec::new(),
            take_all: true,
        }
    }

    /// Number of member rows given the source row count
    pub fn size(&self, num_rows: usize) -> usize {
        if self.take_all {
            num_rows
        } else {
            self.rows.len()
        }
    }
}

/// グループ化の結果
pub struct Groups<'a> {
    source: Option<Materialized<'a>>,
    by: Vec<GroupBy>,
    groups: Vec<Group>,
}

// 固定シードなので同じキーは常に同じハッシュ値になる
fn hasher() -> RandomState {
    RandomState::with_seeds(
        0x243f_6a88_85a3_08d3,
        0x1319_8a2e_0370_7344,
        0xa409_3822_299f_31d0,
        0x082e_fa98_ec4e_6c89,
    )
}

fn key_hash(state: &RandomState, parts: &[KeyPart]) -> Result<u64> {
    let encoded = serde_json::to_vec(parts)?;
    Ok(state.hash_one(&encoded))
}

/// Splits the rows of `source` by their key tuples. `digest` maps a
/// normalized tuple to the 64-bit group key; equal digests of different
/// tuples still give different groups.
pub(crate) fn partition<F>(source: &Table, by: &[GroupBy], digest: F) -> Result<Vec<Group>>
where
    F: Fn(&[KeyPart]) -> Result<u64>,
{
    let mut groups: Vec<Group> = Vec::new();
    let mut keys: Vec<Vec<KeyPart>> = Vec::new();
    let mut index: AHashMap<u64, Vec<usize>> = AHashMap::new();

    for row in source.rows() {
        let buckets: Vec<Value> = by
            .iter()
            .map(|spec| (spec.keyer)(&row).unwrap_or(Value::Null))
            .collect();
        let parts: Vec<KeyPart> = buckets.iter().map(Value::key_part).collect();
        let hash = digest(&parts)?;

        let candidates = index.entry(hash).or_default();
        match candidates.iter().find(|&&g| keys[g] == parts) {
            Some(&g) => groups[g].rows.push(row.index()),
            None => {
                if !candidates.is_empty() {
                    log::warn!("group key hash collision on {:#x}", hash);
                }
                candidates.push(groups.len());
                keys.push(parts);
                groups.push(Group {
                    key: hash,
                    buckets,
                    rows: vec![row.index()],
                    take_all: false,
                });
            }
        }
    }
    Ok(groups)
}

impl<'a> Groups<'a> {
    /// Builds unbound groups from precomputed partitions
    pub fn from_partitions(by: Vec<GroupBy>, groups: Vec<Group>) -> Groups<'static> {
        Groups {
            source: None,
            by,
            groups,
        }
    }

    /// Attaches a source table
    pub fn bind(self, table: &Table) -> Result<Groups<'_>> {
        Ok(Groups {
            source: Some(table.materialized()?),
            by: self.by,
            groups: self.groups,
        })
    }

    pub fn table(&self) -> Option<&Table> {
        self.source.as_deref()
    }

    pub fn by(&self) -> &[GroupBy] {
        &self.by
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Aggregates every group into one output row
    pub fn aggregate(&self, aggs: &[AggregateBy]) -> Result<Table> {
        aggregate::aggregate_groups(self, aggs)
    }
}

impl fmt::Debug for Groups<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Groups")
            .field("table", &self.table().map(Table::name))
            .field("by", &self.by)
            .field("groups", &self.groups)
            .finish()
    }
}

impl Table {
    /// Partitions the rows by the tuple produced by `by`.
    ///
    /// Rows whose tuples are equal under the value comparator share a group.
    /// Pending formulas are evaluated on a private copy first.
    pub fn group_by(&self, by: Vec<GroupBy>) -> Result<Groups<'_>> {
        if by.is_empty() {
            return Err(Error::NoGroupBy);
        }
        let source = self.materialized()?;
        let state = hasher();
        let groups = partition(&source, &by, |parts| key_hash(&state, parts))?;

        log::debug!(
            "grouped {} rows of '{}' into {} groups",
            source.num_rows(),
            source.name(),
            groups.len()
        );
        Ok(Groups {
            source: Some(source),
            by,
            groups,
        })
    }

    /// Aggregates the whole table as a single group
    pub fn aggregate(&self, aggs: &[AggregateBy]) -> Result<Table> {
        let groups = Groups {
            source: Some(self.materialized()?),
            by: Vec::new(),
            groups: vec![Group::take_all()],
        };
        groups.aggregate(aggs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnOptions;
    use crate::values;

    fn orders() -> Table {
        let mut table = Table::new("orders");
        table
            .add_column("uid", ColumnType::INT, ColumnOptions::new().values(values![1, 1, 2, 2, 1]))
            .unwrap();
        table
            .add_column("name", ColumnType::STRING, ColumnOptions::new().values(values!["a", "a", "b", "b", "c"]))
            .unwrap();
        table
    }

    #[test]
    fn test_first_occurrence_order() {
        let table = orders();
        let groups = table
            .group_by(vec![GroupBy::column("uid")])
            .unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.groups()[0].buckets, values![1isize]);
        assert_eq!(groups.groups()[0].rows, vec![0, 1, 4]);
        assert_eq!(groups.groups()[1].rows, vec![2, 3]);
    }

    #[test]
    fn test_colliding_digests_keep_groups_apart() {
        let table = orders();
        let by = vec![GroupBy::column("name")];
        let groups = partition(&table, &by, |_| Ok(0x2a)).unwrap();
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.key == 0x2a));
        assert_eq!(groups[0].buckets, values!["a"]);
        assert_eq!(groups[0].rows, vec![0, 1]);
        assert_eq!(groups[1].buckets, values!["b"]);
        assert_eq!(groups[1].rows, vec![2, 3]);
        assert_eq!(groups[2].rows, vec![4]);

        let hashed = table.group_by(by).unwrap();
        let rows: Vec<Vec<usize>> = hashed.groups().iter().map(|g| g.rows.clone()).collect();
        assert_eq!(rows, vec![vec![0, 1], vec![2, 3], vec![4]]);
    }

    #[test]
    fn test_composite_keys_and_missing_key() {
        let table = orders();
        let groups = table
            .group_by(vec![
                GroupBy::column("uid"),
                GroupBy::new("initial", |row| {
                    row.value("name").as_str().filter(|s| *s != "c").map(Value::from)
                }),
            ])
            .unwrap();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups.groups()[2].buckets, values![1isize, Value::Null]);
        let total: usize = groups.groups().iter().map(|g| g.size(table.num_rows())).sum();
        assert_eq!(total, table.num_rows());
    }

    #[test]
    fn test_equal_numbers_share_group() {
        let mut table = Table::new("t");
        table
            .add_column("v", ColumnType::RAW, ColumnOptions::new().values(values![1, 1.0, 1i64, 2]))
            .unwrap();
        let groups = table.group_by(vec![GroupBy::column("v")]).unwrap();
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_no_group_by() {
        let table = orders();
        let err = table.group_by(Vec::new()).unwrap_err();
        assert!(matches!(err, Error::NoGroupBy));
        assert_eq!(err.kind(), crate::error::ErrorKind::Invariant);
    }

    #[test]
    fn test_unbound_partitions() {
        let groups = Groups::from_partitions(
            vec![GroupBy::column("uid")],
            vec![Group {
                key: 1,
                buckets: values![1],
                rows: vec![0],
                take_all: false,
            }],
        );
        assert!(groups.table().is_none());
        assert!(matches!(
            groups.aggregate(&[AggregateBy::new(AggregationType::Count, "name")]),
            Err(Error::NilTable)
        ));

        let table = orders();
        let bound = groups.bind(&table).unwrap();
        let out = bound
            .aggregate(&[AggregateBy::new(AggregationType::Count, "name")])
            .unwrap();
        assert_eq!(out.get(0, "count_name").unwrap(), Value::Int64(1));
    }
}
