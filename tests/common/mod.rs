//! Shared sample tables for the integration tests

#![allow(dead_code)]

use datatable::{values, ColumnOptions, ColumnType, Table};

/// Four customers, ids 1 to 4
pub fn customers() -> Table {
    let mut customers = Table::new("Customers");
    customers.add_column("id", ColumnType::INT, ColumnOptions::new()).unwrap();
    customers.add_column("prenom", ColumnType::STRING, ColumnOptions::new()).unwrap();
    customers.add_column("nom", ColumnType::STRING, ColumnOptions::new()).unwrap();
    customers.add_column("email", ColumnType::STRING, ColumnOptions::new()).unwrap();
    customers.add_column("ville", ColumnType::STRING, ColumnOptions::new()).unwrap();
    customers
        .append_row(values![1, "Aimée", "Marechal", "aime.marechal@example.com", "Paris"])
        .unwrap();
    customers
        .append_row(values![2, "Esmée", "Lefort", "esmee.lefort@example.com", "Lyon"])
        .unwrap();
    customers
        .append_row(values![3, "Marine", "Prevost", "m.prevost@example.com", "Lille"])
        .unwrap();
    customers
        .append_row(values![4, "Luc", "Rolland", "lucrolland@example.com", "Marseille"])
        .unwrap();
    customers
}

/// Five orders placed by users 1, 1, 2, 3 and 5
pub fn orders() -> Table {
    let mut orders = Table::new("Orders");
    orders
        .add_column("user_id", ColumnType::INT, ColumnOptions::new().values(values![1, 1, 2, 3, 5]))
        .unwrap();
    orders
        .add_column(
            "date_achat",
            ColumnType::TIME,
            ColumnOptions::new().values(values![
                "2013-01-23",
                "2013-02-14",
                "2013-02-17",
                "2013-02-21",
                "2013-03-02"
            ]),
        )
        .unwrap();
    orders
        .add_column(
            "num_facture",
            ColumnType::STRING,
            ColumnOptions::new().values(values!["A00103", "A00104", "A00105", "A00106", "A00107"]),
        )
        .unwrap();
    orders
        .add_column(
            "prix_total",
            ColumnType::FLOAT64,
            ColumnOptions::new().values(values![203.14, 124.00, 149.45, 235.35, 47.58]),
        )
        .unwrap();
    orders
}

/// Values of one column, in row order
pub fn column_values(table: &Table, name: &str) -> Vec<datatable::Value> {
    table
        .column(name)
        .unwrap_or_else(|| panic!("missing column {}", name))
        .series()
        .iter()
        .collect()
}
