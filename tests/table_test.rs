mod common;

use std::sync::Arc;

use datatable::series::SeriesOptions;
use datatable::{
    values, ColumnOptions, ColumnType, Error, ExportOptions, Expression, ExpressionEngine,
    FormulaEngine, PrintOptions, Row, Series, SeriesTrait, SortKey, Table, TableConfig,
    TypeRegistry, Value,
};
use test_log::test;

use common::{column_values, customers, orders};

#[test]
fn test_copy_is_independent_of_source() {
    let mut source = customers();
    source
        .add_column("upper", ColumnType::STRING, ColumnOptions::new().expr("upper(ville)"))
        .unwrap();
    let mut copy = source.copy().unwrap();
    copy.set(0, "ville", "Nice").unwrap();
    copy.rename_column("prenom", "first_name").unwrap();
    copy.evaluate_expressions().unwrap();

    assert_eq!(copy.get(0, "upper").unwrap(), Value::from("NICE"));
    assert_eq!(source.get(0, "ville").unwrap(), Value::from("Paris"));
    assert!(source.has_column("prenom"));
    source.evaluate_expressions().unwrap();
    assert_eq!(source.get(0, "upper").unwrap(), Value::from("PARIS"));
}

#[test]
fn test_concat_row_and_column_union() {
    let customers = customers();
    let orders = orders();
    let out = customers.concat(&[&orders, &customers]).unwrap();
    assert_eq!(out.name(), "Customers");
    assert_eq!(out.num_rows(), customers.num_rows() * 2 + orders.num_rows());
    assert_eq!(out.num_cols(), customers.num_cols() + orders.num_cols());
    assert_eq!(out.get(4, "id").unwrap(), Value::Null);
    assert_eq!(out.get(4, "user_id").unwrap(), Value::Int(1));
    assert_eq!(out.get(9, "prenom").unwrap(), Value::from("Aimée"));
    assert_eq!(out.get(9, "num_facture").unwrap(), Value::Null);
}

struct Constant(Value);

impl Expression for Constant {
    fn evaluate(&self, _row: &Row<'_>) -> datatable::Result<Value> {
        Ok(self.0.clone())
    }
}

/// Engine whose formulas are integer literals
struct LiteralEngine;

impl ExpressionEngine for LiteralEngine {
    fn parse(&self, formula: &str) -> datatable::Result<Box<dyn Expression>> {
        let value = formula
            .trim()
            .parse::<i64>()
            .map_err(|e| Error::Expression(e.to_string()))?;
        Ok(Box::new(Constant(Value::Int64(value))))
    }
}

#[test]
fn test_builder_with_shared_registry_and_engine() {
    let mut registry = TypeRegistry::default();
    registry
        .register_fn("money", |options: &ColumnOptions| {
            let series = Series::<f64>::from_values(options.initial_values(), SeriesOptions::default());
            Ok(Box::new(series) as Box<dyn SeriesTrait>)
        })
        .unwrap();
    let registry = Arc::new(registry);

    let mut a = Table::builder("a")
        .registry(registry.clone())
        .engine(Arc::new(LiteralEngine))
        .build();
    a.add_column("price", "money", ColumnOptions::new().values(values!["1.5", 2]))
        .unwrap();
    a.add_column("seven", ColumnType::INT64, ColumnOptions::new().expr("7"))
        .unwrap();
    assert!(matches!(
        a.add_column("bad", ColumnType::INT64, ColumnOptions::new().expr("x + 1")),
        Err(Error::Expression(_))
    ));
    a.evaluate_expressions().unwrap();
    assert_eq!(column_values(&a, "price"), values![1.5, 2.0]);
    assert_eq!(column_values(&a, "seven"), values![7i64, 7i64]);

    let b = Table::builder("b").registry(registry).build();
    assert!(b.registry().contains("money"));
    assert!(!Table::new("c").registry().contains("money"));

    let copy = a.copy().unwrap();
    assert_eq!(copy.column("seven").unwrap().formula(), Some("7"));
}

#[test]
fn test_sort_then_export() {
    let mut table = orders();
    table.sort(&[SortKey::desc("prix_total")]).unwrap();
    let rows = table.to_rows(&ExportOptions::new()).unwrap();
    assert_eq!(rows[0][0], Value::from("user_id"));
    assert_eq!(rows[1][2], Value::from("A00106"));
    assert_eq!(rows[5][2], Value::from("A00107"));

    let schema = table.to_schema(&ExportOptions::new()).unwrap();
    let json = serde_json::to_string(&schema).unwrap();
    assert!(json.contains("\"type\":\"time\""));
}

#[test]
fn test_config_drives_printing_and_suffix() {
    let config = TableConfig::from_toml_str(
        r#"
max_print_rows = 2
join_suffix = "_o"
"#,
    )
    .unwrap();
    assert_eq!(config.time_formats, TableConfig::default().time_formats);

    let mut left = Table::with_config("l", config);
    left.add_column("user_id", ColumnType::INT, ColumnOptions::new().values(values![1, 2, 3]))
        .unwrap();
    let out = left
        .inner_join(&orders(), &datatable::on(&["user_id"]), &datatable::on(&["user_id"]))
        .unwrap();
    assert!(out.has_column("user_id_o"));
    assert_eq!(out.config().max_print_rows, 2);

    let mut text = Vec::new();
    out.print(&mut text, &PrintOptions::default()).unwrap();
    let text = String::from_utf8(text).unwrap();
    // 2 header lines, 1 head row, ellipsis, 1 tail row
    assert_eq!(text.lines().count(), 5);

    assert!(matches!(
        TableConfig::from_yaml_str("max_print_rows: [1]"),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_formula_engine_custom_function() {
    let mut engine = FormulaEngine::new();
    engine.add_function("Twice", |args: &[Value]| {
        Ok(args
            .first()
            .and_then(Value::as_f64)
            .map(|v| Value::Float64(v * 2.0))
            .unwrap_or(Value::Null))
    });
    let mut table = Table::builder("t").engine(Arc::new(engine)).build();
    table
        .add_column("x", ColumnType::FLOAT64, ColumnOptions::new().values(values![1.5, Value::Null]))
        .unwrap();
    table
        .add_column("y", ColumnType::FLOAT64, ColumnOptions::new().expr("TWICE(x) + 1"))
        .unwrap();
    table.evaluate_expressions().unwrap();
    assert_eq!(column_values(&table, "y"), values![4.0, Value::Null]);
}
