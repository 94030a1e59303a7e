//! In-memory typed columnar tables.
//!
//! A [`Table`] owns named [`Column`]s that share one row count. Columns hold
//! their data in typed series and may be computed from a formula. On top of
//! the storage sit the engines: grouping and aggregation
//! ([`Table::group_by`], [`Groups::aggregate`]), joins ([`Table::join`]) and
//! concatenation ([`Table::concat`]).
//!
//! ```
//! use datatable::{values, AggregateBy, AggregationType, ColumnOptions, ColumnType, GroupBy, Table};
//!
//! let mut sales = Table::new("sales");
//! sales.add_column("city", ColumnType::STRING, ColumnOptions::new()).unwrap();
//! sales.add_column("amount", ColumnType::FLOAT64, ColumnOptions::new()).unwrap();
//! sales.append_row(values!["Paris", 10.0]).unwrap();
//! sales.append_row(values!["Lyon", 4.0]).unwrap();
//! sales.append_row(values!["Paris", 6.0]).unwrap();
//!
//! let totals = sales
//!     .group_by(vec![GroupBy::column("city")])
//!     .unwrap()
//!     .aggregate(&[AggregateBy::new(AggregationType::Sum, "amount")])
//!     .unwrap();
//! assert_eq!(totals.num_rows(), 2);
//! ```

// 特定の警告を無効化
#![allow(clippy::new_without_default)]
#![allow(clippy::too_many_arguments)]

pub mod column;
pub mod concat;
pub mod config;
pub mod error;
pub mod expr;
pub mod groupby;
pub mod io;
pub mod join;
pub mod series;
pub mod table;
pub mod value;

// Re-export commonly used types
pub use column::{Column, ColumnOptions, ColumnType, TypeRegistry};
pub use config::TableConfig;
pub use error::{Error, ErrorKind, Result};
pub use expr::{Expression, ExpressionEngine, FormulaEngine};
pub use groupby::{aggregate, AggregateBy, AggregationType, Group, GroupBy, Groups};
pub use join::{on, JoinOn, JoinType};
pub use series::{Series, SeriesTrait};
pub use table::{ExportOptions, Materialized, PrintOptions, Row, Schema, SortKey, Table, TableBuilder};
pub use value::Value;

// Export version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
