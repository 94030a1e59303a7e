mod common;

use chrono::Datelike;
use datatable::{
    aggregate, values, AggregateBy, AggregationType, ColumnOptions, ColumnType, Error, ErrorKind,
    GroupBy, Table, Value,
};
use test_log::test;

use common::{column_values, orders};

fn sales() -> Table {
    let mut table = Table::new("sales");
    table
        .add_column("region", ColumnType::STRING, ColumnOptions::new().label("Region"))
        .unwrap();
    table
        .add_column("product", ColumnType::STRING, ColumnOptions::new())
        .unwrap();
    table
        .add_column("amount", ColumnType::FLOAT64, ColumnOptions::new().label("Amount"))
        .unwrap();
    table.append_row(values!["north", "tea", 10.0]).unwrap();
    table.append_row(values!["south", "tea", 4.0]).unwrap();
    table.append_row(values!["north", "coffee", 6.0]).unwrap();
    table.append_row(values!["north", "tea", 2.0]).unwrap();
    table.append_row(values![Value::Null, "tea", 1.0]).unwrap();
    table
}

#[test]
fn test_group_sizes_cover_every_row() {
    let table = sales();
    let groups = table
        .group_by(vec![GroupBy::column("region"), GroupBy::column("product")])
        .unwrap();
    assert_eq!(groups.len(), 4);
    let sizes: Vec<usize> = groups.groups().iter().map(|g| g.rows.len()).collect();
    assert_eq!(sizes, vec![2, 1, 1, 1]);
    assert_eq!(sizes.iter().sum::<usize>(), table.num_rows());
    assert_eq!(groups.groups()[3].buckets, values![Value::Null, "tea"]);
}

#[test]
fn test_statistics_per_group() {
    let table = sales();
    let out = table
        .group_by(vec![GroupBy::column("region")])
        .unwrap()
        .aggregate(&[
            AggregateBy::new(AggregationType::Sum, "amount"),
            AggregateBy::new(AggregationType::Avg, "amount"),
            AggregateBy::new(AggregationType::Variance, "amount"),
            AggregateBy::new(AggregationType::Stddev, "amount"),
            AggregateBy::new(AggregationType::Cusum, "amount"),
            AggregateBy::new(AggregationType::Min, "amount"),
            AggregateBy::new(AggregationType::GroupConcat, "product").alias("products"),
        ])
        .unwrap();

    assert_eq!(out.name(), "sales");
    assert_eq!(column_values(&out, "region"), values!["north", "south", Value::Null]);
    assert_eq!(column_values(&out, "sum_amount"), values![18.0, 4.0, 1.0]);
    assert_eq!(out.get(0, "avg_amount").unwrap(), Value::Float64(6.0));
    // population variance of 10, 6, 2
    let variance = out.get(0, "variance_amount").unwrap().as_f64().unwrap();
    assert!((variance - 32.0 / 3.0).abs() < 1e-9);
    let stddev = out.get(0, "stddev_amount").unwrap().as_f64().unwrap();
    assert!((stddev - variance.sqrt()).abs() < 1e-9);
    assert_eq!(out.get(1, "variance_amount").unwrap(), Value::Float64(0.0));
    assert_eq!(out.get(0, "cusum_amount").unwrap(), Value::Float64(18.0));
    assert_eq!(out.get(0, "min_amount").unwrap(), Value::Float64(2.0));
    assert_eq!(out.get(0, "products").unwrap(), Value::from("tea,coffee,tea"));

    assert_eq!(out.column("region").unwrap().label(), "Region");
    assert_eq!(out.column("sum_amount").unwrap().label(), "sum_Amount");
    assert_eq!(out.column("products").unwrap().label(), "group_concat_product");
}

#[test]
fn test_keyer_on_derived_value() {
    let orders = orders();
    let groups = orders
        .group_by(vec![GroupBy::new("month", |row| {
            row.value("date_achat")
                .as_time()
                .map(|t| Value::Int(t.month() as isize))
        })
        .with_type(ColumnType::INT)])
        .unwrap();
    let out = groups
        .aggregate(&[
            AggregateBy::new(AggregationType::Count, "num_facture"),
            AggregateBy::new(AggregationType::CountDistinct, "user_id"),
            AggregateBy::new(AggregationType::GroupAny, "prix_total"),
        ])
        .unwrap();
    assert_eq!(column_values(&out, "month"), values![1isize, 2isize, 3isize]);
    assert_eq!(column_values(&out, "count_num_facture"), values![1i64, 3i64, 1i64]);
    assert_eq!(column_values(&out, "count_distinct_user_id"), values![1i64, 3i64, 1i64]);
    assert_eq!(out.get(1, "group_any_prix_total").unwrap(), Value::Float64(124.0));
    assert_eq!(
        out.column("group_any_prix_total").unwrap().column_type(),
        &ColumnType::FLOAT64
    );
}

#[test]
fn test_group_on_computed_column_leaves_source_pending() {
    let mut table = sales();
    table
        .add_column("big", ColumnType::BOOL, ColumnOptions::new().expr("amount >= 5"))
        .unwrap();
    let out = table
        .group_by(vec![GroupBy::column("big")])
        .unwrap()
        .aggregate(&[AggregateBy::new(AggregationType::Count, "amount")])
        .unwrap();
    assert_eq!(column_values(&out, "big"), values![true, false]);
    assert_eq!(column_values(&out, "count_amount"), values![2i64, 3i64]);
    assert!(table.has_pending_expressions());
}

#[test]
fn test_error_kinds() {
    let table = sales();
    let err = table.group_by(Vec::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Invariant);

    let err = aggregate(None, &[]).unwrap_err();
    assert!(matches!(err, Error::NoGroups));
    assert_eq!(err.kind(), ErrorKind::Invariant);

    let err = table
        .aggregate(&[AggregateBy::new(AggregationType::Sum, "price")])
        .unwrap_err();
    assert!(matches!(err, Error::ColumnNotFound(ref name) if name == "price"));
    assert_eq!(err.kind(), ErrorKind::Data);

    let err = "percentile".parse::<AggregationType>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_whole_table_on_empty_table() {
    let mut table = Table::new("empty");
    table
        .add_column("v", ColumnType::FLOAT64, ColumnOptions::new())
        .unwrap();
    let out = table
        .aggregate(&[
            AggregateBy::new(AggregationType::Sum, "v"),
            AggregateBy::new(AggregationType::Avg, "v"),
            AggregateBy::new(AggregationType::Count, "v"),
        ])
        .unwrap();
    assert_eq!(out.num_rows(), 1);
    assert_eq!(out.get(0, "sum_v").unwrap(), Value::Float64(0.0));
    assert_eq!(out.get(0, "avg_v").unwrap(), Value::Null);
    assert_eq!(out.get(0, "count_v").unwrap(), Value::Int64(0));
}
