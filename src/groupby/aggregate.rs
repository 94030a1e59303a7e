//! グループごとの集計

use std::fmt::{self, Display};
use std::str::FromStr;

use super::Groups;
use crate::column::{ColumnOptions, ColumnType};
use crate::error::{Error, Result};
use crate::series::SeriesTrait;
use crate::table::Table;
use crate::value::Value;

/// 集計関数の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregationType {
    /// 平均
    Avg,
    /// 件数（nullを除く）
    Count,
    /// 重複を除いた件数
    CountDistinct,
    /// 累積和の最終値
    Cusum,
    /// 最大値
    Max,
    /// 最小値
    Min,
    /// 中央値
    Median,
    /// 標準偏差（母集団）
    Stddev,
    /// 合計
    Sum,
    /// 分散（母集団）
    Variance,
    /// カンマ区切りの連結
    GroupConcat,
    /// 最初の値
    GroupAny,
}

impl AggregationType {
    pub const ALL: [AggregationType; 12] = [
        AggregationType::Avg,
        AggregationType::Count,
        AggregationType::CountDistinct,
        AggregationType::Cusum,
        AggregationType::Max,
        AggregationType::Min,
        AggregationType::Median,
        AggregationType::Stddev,
        AggregationType::Sum,
        AggregationType::Variance,
        AggregationType::GroupConcat,
        AggregationType::GroupAny,
    ];

    /// 関数名を文字列で取得
    pub fn name(&self) -> &'static str {
        match self {
            AggregationType::Avg => "avg",
            AggregationType::Count => "count",
            AggregationType::CountDistinct => "count_distinct",
            AggregationType::Cusum => "cusum",
            AggregationType::Max => "max",
            AggregationType::Min => "min",
            AggregationType::Median => "median",
            AggregationType::Stddev => "stddev",
            AggregationType::Sum => "sum",
            AggregationType::Variance => "variance",
            AggregationType::GroupConcat => "group_concat",
            AggregationType::GroupAny => "group_any",
        }
    }

    /// Output column type given the source column type
    pub fn output_type(&self, source: &ColumnType) -> ColumnType {
        match self {
            AggregationType::Count | AggregationType::CountDistinct => ColumnType::INT64,
            AggregationType::GroupConcat => ColumnType::RAW,
            AggregationType::GroupAny => source.clone(),
            _ => ColumnType::FLOAT64,
        }
    }

    /// Applies the reduction to `series`
    pub fn reduce(&self, series: &dyn SeriesTrait) -> Value {
        match self {
            AggregationType::Avg => series.avg(),
            AggregationType::Count => Value::Int64(series.count() as i64),
            AggregationType::CountDistinct => Value::Int64(series.count_distinct() as i64),
            AggregationType::Cusum => series.cusum(),
            AggregationType::Max => series.max(),
            AggregationType::Min => series.min(),
            AggregationType::Median => series.median(),
            AggregationType::Stddev => series.stddev(),
            AggregationType::Sum => series.sum(),
            AggregationType::Variance => series.variance(),
            AggregationType::GroupConcat => series.group_concat(),
            AggregationType::GroupAny => series.group_any(),
        }
    }
}

impl Display for AggregationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AggregationType {
    type Err = Error;

    /// 文字列から集計関数を解析
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.to_lowercase();
        AggregationType::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| Error::UnknownAggregation(s.to_string()))
    }
}

/// 集計の指定
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateBy {
    pub kind: AggregationType,
    /// 集計対象の列
    pub field: String,
    /// 出力列の名前（省略時は `<kind>_<field>`）
    pub alias: Option<String>,
}

impl AggregateBy {
    pub fn new(kind: AggregationType, field: &str) -> Self {
        AggregateBy {
            kind,
            field: field.to_string(),
            alias: None,
        }
    }

    pub fn alias(mut self, name: &str) -> Self {
        self.alias = Some(name.to_string());
        self
    }

    pub fn output_name(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => format!("{}_{}", self.kind, self.field),
        }
    }
}

/// Aggregates `groups`, failing with [`Error::NoGroups`] when there are none
pub fn aggregate(groups: Option<&Groups<'_>>, aggs: &[AggregateBy]) -> Result<Table> {
    match groups {
        Some(groups) => groups.aggregate(aggs),
        None => Err(Error::NoGroups),
    }
}

pub(super) fn aggregate_groups(groups: &Groups<'_>, aggs: &[AggregateBy]) -> Result<Table> {
    let source = groups.table().ok_or(Error::NilTable)?;
    let fields = aggs
        .iter()
        .map(|agg| {
            source
                .column(&agg.field)
                .ok_or_else(|| Error::ColumnNotFound(agg.field.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut out = source.derive(source.name());
    for by in groups.by() {
        let original = source.column(&by.name);
        let ctype = match (&by.ctype, original) {
            (Some(ctype), _) => ctype.clone(),
            (None, Some(column)) => column.column_type().clone(),
            (None, None) => ColumnType::RAW,
        };
        let label = original.map(|c| c.label()).unwrap_or(by.name.as_str());
        out.add_column(&by.name, ctype, ColumnOptions::new().label(label))?;
    }
    for (agg, column) in aggs.iter().zip(&fields) {
        out.add_column(
            &agg.output_name(),
            agg.kind.output_type(column.column_type()),
            ColumnOptions::new().label(&format!("{}_{}", agg.kind, column.label())),
        )?;
    }

    for group in groups.groups() {
        let mut row = group.buckets.clone();
        // 集計キーの数が足りない場合はnullで埋める
        row.resize(groups.by().len(), Value::Null);
        for (agg, column) in aggs.iter().zip(&fields) {
            let value = if group.take_all {
                agg.kind.reduce(column.series())
            } else {
                agg.kind.reduce(column.series().pick(&group.rows).as_ref())
            };
            row.push(value);
        }
        out.append_row(row)?;
    }
    log::debug!(
        "aggregated {} groups of '{}' with {} reductions",
        groups.len(),
        source.name(),
        aggs.len()
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groupby::GroupBy;
    use crate::values;

    fn users() -> Table {
        let mut table = Table::new("users");
        table
            .add_column(
                "uid",
                ColumnType::INT,
                ColumnOptions::new().label("用户ID").values(values![1, 1, 2, 2]),
            )
            .unwrap();
        table
            .add_column(
                "name",
                ColumnType::STRING,
                ColumnOptions::new().label("姓名").values(values!["张三", "李四", "王五", "张三"]),
            )
            .unwrap();
        table
            .add_column(
                "score",
                ColumnType::FLOAT64,
                ColumnOptions::new().values(values![1.0, 3.0, 4.0, Value::Null]),
            )
            .unwrap();
        table
    }

    #[test]
    fn test_count_per_group() {
        let table = users();
        let groups = table
            .group_by(vec![GroupBy::new("uid", |row| row.get("uid")).with_type(ColumnType::INT)])
            .unwrap();
        let out = groups
            .aggregate(&[AggregateBy::new(AggregationType::Count, "name")])
            .unwrap();
        assert_eq!(out.name(), "users");
        assert_eq!(out.num_rows(), 2);
        assert_eq!(out.column_names(), vec!["uid", "count_name"]);
        assert_eq!(out.column("uid").unwrap().label(), "用户ID");
        assert_eq!(out.column("count_name").unwrap().label(), "count_姓名");
        assert_eq!(out.column("count_name").unwrap().column_type(), &ColumnType::INT64);
        assert_eq!(out.get(0, "count_name").unwrap(), Value::Int64(2));
        assert_eq!(out.get(1, "count_name").unwrap(), Value::Int64(2));
    }

    #[test]
    fn test_reductions_and_types() {
        let table = users();
        let groups = table.group_by(vec![GroupBy::column("uid")]).unwrap();
        let out = groups
            .aggregate(&[
                AggregateBy::new(AggregationType::Sum, "score"),
                AggregateBy::new(AggregationType::Avg, "score").alias("mean"),
                AggregateBy::new(AggregationType::GroupConcat, "name"),
                AggregateBy::new(AggregationType::GroupAny, "name"),
                AggregateBy::new(AggregationType::CountDistinct, "name"),
            ])
            .unwrap();
        assert_eq!(out.column("uid").unwrap().column_type(), &ColumnType::INT);
        assert_eq!(out.get(0, "sum_score").unwrap(), Value::Float64(4.0));
        assert_eq!(out.get(1, "sum_score").unwrap(), Value::Float64(4.0));
        assert_eq!(out.get(0, "mean").unwrap(), Value::Float64(2.0));
        assert_eq!(out.column("group_concat_name").unwrap().column_type(), &ColumnType::RAW);
        assert_eq!(out.get(0, "group_concat_name").unwrap(), Value::from("张三,李四"));
        assert_eq!(out.column("group_any_name").unwrap().column_type(), &ColumnType::STRING);
        assert_eq!(out.get(1, "group_any_name").unwrap(), Value::from("王五"));
        assert_eq!(out.get(1, "count_distinct_name").unwrap(), Value::Int64(2));
    }

    #[test]
    fn test_whole_table_aggregate() {
        let table = users();
        let out = table
            .aggregate(&[
                AggregateBy::new(AggregationType::Max, "score"),
                AggregateBy::new(AggregationType::Count, "score"),
                AggregateBy::new(AggregationType::Median, "score"),
            ])
            .unwrap();
        assert_eq!(out.num_rows(), 1);
        assert_eq!(out.column_names(), vec!["max_score", "count_score", "median_score"]);
        assert_eq!(out.get(0, "max_score").unwrap(), Value::Float64(4.0));
        assert_eq!(out.get(0, "count_score").unwrap(), Value::Int64(3));
        assert_eq!(out.get(0, "median_score").unwrap(), Value::Float64(3.0));
    }

    #[test]
    fn test_errors() {
        let table = users();
        let groups = table.group_by(vec![GroupBy::column("uid")]).unwrap();
        assert!(matches!(
            groups.aggregate(&[AggregateBy::new(AggregationType::Sum, "missing")]),
            Err(Error::ColumnNotFound(_))
        ));
        assert!(matches!(
            aggregate(None, &[AggregateBy::new(AggregationType::Sum, "score")]),
            Err(Error::NoGroups)
        ));
        assert!(aggregate(Some(&groups), &[]).is_ok());
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("count_distinct".parse::<AggregationType>().unwrap(), AggregationType::CountDistinct);
        assert_eq!("SUM".parse::<AggregationType>().unwrap(), AggregationType::Sum);
        assert!(matches!(
            "mode".parse::<AggregationType>(),
            Err(Error::UnknownAggregation(_))
        ));
        for kind in AggregationType::ALL {
            assert_eq!(kind.to_string().parse::<AggregationType>().unwrap(), kind);
        }
    }
}
