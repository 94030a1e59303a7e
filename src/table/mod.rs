//! Table: ordered columns sharing one row count

mod export;
mod print;
mod row;
mod sort;

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::column::{Column, ColumnOptions, ColumnType, TypeRegistry};
use crate::config::TableConfig;
use crate::error::{Error, Result};
use crate::expr::{ExpressionEngine, FormulaEngine};
use crate::value::Value;

pub use export::{ExportOptions, Schema, SchemaColumn};
pub use print::PrintOptions;
pub use row::{Row, Rows};
pub use sort::SortKey;

/// 列指向のテーブル
///
/// Every column's series length equals [`Table::num_rows`] after every
/// public call. Computed columns are filled by
/// [`Table::evaluate_expressions`].
pub struct Table {
    // テーブル名
    name: String,
    // 列データ（挿入順）
    columns: Vec<Column>,
    // 列名→インデックスのマッピング
    column_indices: HashMap<String, usize>,
    // 行数
    row_count: usize,
    registry: Arc<TypeRegistry>,
    engine: Arc<dyn ExpressionEngine>,
    config: TableConfig,
    // 未評価の計算列があるか
    pending: bool,
}

/// Builder for [`Table`]
pub struct TableBuilder {
    name: String,
    registry: Option<Arc<TypeRegistry>>,
    engine: Option<Arc<dyn ExpressionEngine>>,
    config: TableConfig,
}

impl TableBuilder {
    /// Type registry shared with other tables
    pub fn registry(mut self, registry: Arc<TypeRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Expression engine used to parse column formulas
    pub fn engine(mut self, engine: Arc<dyn ExpressionEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Table {
        Table {
            name: self.name,
            columns: Vec::new(),
            column_indices: HashMap::new(),
            row_count: 0,
            registry: self
                .registry
                .unwrap_or_else(|| Arc::new(TypeRegistry::default())),
            engine: self
                .engine
                .unwrap_or_else(|| Arc::new(FormulaEngine::default())),
            config: self.config,
            pending: false,
        }
    }
}

/// A table that is guaranteed to have no pending formula.
///
/// Borrows the source when it is already evaluated and owns an evaluated
/// copy otherwise.
pub enum Materialized<'a> {
    Borrowed(&'a Table),
    Owned(Table),
}

impl Deref for Materialized<'_> {
    type Target = Table;

    fn deref(&self) -> &Table {
        match self {
            Materialized::Borrowed(table) => table,
            Materialized::Owned(table) => table,
        }
    }
}

impl Table {
    /// 新しい空のテーブルを作成
    pub fn new(name: &str) -> Self {
        Self::builder(name).build()
    }

    /// 設定付きでテーブルを作成
    pub fn with_config(name: &str, config: TableConfig) -> Self {
        Self::builder(name).config(config).build()
    }

    pub fn builder(name: &str) -> TableBuilder {
        TableBuilder {
            name: name.to_string(),
            registry: None,
            engine: None,
            config: TableConfig::default(),
        }
    }

    /// Empty table sharing this table's registry, engine and config
    pub(crate) fn derive(&self, name: &str) -> Table {
        Table::builder(name)
            .registry(self.registry.clone())
            .engine(self.engine.clone())
            .config(self.config.clone())
            .build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn engine(&self) -> &dyn ExpressionEngine {
        self.engine.as_ref()
    }

    /// 行数を取得
    pub fn num_rows(&self) -> usize {
        self.row_count
    }

    /// 列数を取得
    pub fn num_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// 列名のリストを取得
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// 表示対象の列
    pub fn visible_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.is_visible()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_indices.contains_key(name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_indices.get(name).copied()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.column_index(name).map(|i| &self.columns[i])
    }

    /// Mutable access for labels and attributes
    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        match self.column_index(name) {
            Some(i) => self.columns.get_mut(i),
            None => None,
        }
    }

    fn existing_index(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    fn rebuild_index(&mut self) {
        self.column_indices = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name().to_string(), i))
            .collect();
    }

    /// Options with the table's timestamp formats when none were given
    fn resolve_options(&self, options: ColumnOptions) -> ColumnOptions {
        if options.time_formats.is_some() {
            return options;
        }
        let formats = self.config.time_formats.clone();
        options.time_formats(formats)
    }

    /// 列を追加する
    ///
    /// Existing rows are back-filled with null, or taken from
    /// `options.values`. A value list longer than the table grows the table.
    /// `values` and `expr` are mutually exclusive.
    pub fn add_column(
        &mut self,
        name: &str,
        ctype: impl Into<ColumnType>,
        options: ColumnOptions,
    ) -> Result<()> {
        let ctype = ctype.into();
        if self.has_column(name) {
            return Err(Error::DuplicateColumnName(name.to_string()));
        }
        if options.values.is_some() && options.expr.is_some() {
            return Err(Error::IncompatibleOptions(format!(
                "column '{}' cannot have both values and an expression",
                name
            )));
        }

        let options = self.resolve_options(options);
        let mut series = self.registry.new_series(&ctype, &options)?;

        let mut column = match &options.expr {
            Some(formula) => {
                let expr = self.engine.parse(formula)?;
                series.clear();
                Column::new(name, ctype, series).with_formula(formula, expr)
            }
            None => Column::new(name, ctype, series),
        }
        .with_options(&options);

        let len = column.len();
        if len < self.row_count {
            column.series_mut().grow(self.row_count - len);
        } else if len > self.row_count {
            let extra = len - self.row_count;
            for existing in &mut self.columns {
                existing.series_mut().grow(extra);
            }
            self.row_count = len;
        }

        if column.is_computed() {
            self.pending = true;
        }
        log::trace!("added column '{}' to table '{}'", name, self.name);
        self.column_indices.insert(name.to_string(), self.columns.len());
        self.columns.push(column);
        Ok(())
    }

    /// Appends a fully built column of the right length
    pub(crate) fn push_column(&mut self, column: Column) -> Result<()> {
        if self.has_column(column.name()) {
            return Err(Error::DuplicateColumnName(column.name().to_string()));
        }
        if self.columns.is_empty() {
            self.row_count = column.len();
        } else if column.len() != self.row_count {
            return Err(Error::ArityMismatch {
                expected: self.row_count,
                found: column.len(),
            });
        }
        if column.is_computed() {
            self.pending = true;
        }
        self.column_indices
            .insert(column.name().to_string(), self.columns.len());
        self.columns.push(column);
        Ok(())
    }

    fn stored_count(&self) -> usize {
        self.columns.iter().filter(|c| !c.is_computed()).count()
    }

    /// 行を追加する
    ///
    /// `values` holds one value per column, or one value per stored column
    /// in which case computed columns are skipped.
    pub fn append_row<V: AsRef<[Value]>>(&mut self, values: V) -> Result<()> {
        let values = values.as_ref();
        let all = values.len() == self.columns.len();
        if !all && values.len() != self.stored_count() {
            return Err(Error::ArityMismatch {
                expected: self.columns.len(),
                found: values.len(),
            });
        }

        let mut input = values.iter();
        for column in &mut self.columns {
            if column.is_computed() {
                if all {
                    input.next();
                }
                column.series_mut().grow(1);
                self.pending = true;
            } else {
                let value = input.next().unwrap_or(&Value::Null);
                column.series_mut().append(value);
            }
        }
        self.row_count += 1;
        Ok(())
    }

    fn check_row(&self, index: usize) -> Result<()> {
        if index >= self.row_count {
            return Err(Error::IndexOutOfBounds {
                index,
                size: self.row_count,
            });
        }
        Ok(())
    }

    /// 行のビューを取得
    pub fn row(&self, index: usize) -> Result<Row<'_>> {
        self.check_row(index)?;
        Ok(Row::new(self, index))
    }

    pub fn rows(&self) -> Rows<'_> {
        Rows::new(self)
    }

    /// セルの値を取得
    pub fn get(&self, row: usize, column: &str) -> Result<Value> {
        self.check_row(row)?;
        let idx = self.existing_index(column)?;
        Ok(self.columns[idx].series().get(row))
    }

    /// セルの値を更新する（計算列は更新できない）
    pub fn set(&mut self, row: usize, column: &str, value: impl Into<Value>) -> Result<()> {
        self.check_row(row)?;
        let idx = self.existing_index(column)?;
        let column = &mut self.columns[idx];
        if column.is_computed() {
            return Err(Error::IncompatibleOptions(format!(
                "column '{}' is computed",
                column.name()
            )));
        }
        column.series_mut().set(row, &value.into())?;
        if self.columns.iter().any(Column::is_computed) {
            self.pending = true;
        }
        Ok(())
    }

    pub fn rename_column(&mut self, old: &str, new: &str) -> Result<()> {
        let idx = self.existing_index(old)?;
        if old == new {
            return Ok(());
        }
        if self.has_column(new) {
            return Err(Error::DuplicateColumnName(new.to_string()));
        }
        self.columns[idx].set_name(new);
        self.rebuild_index();
        Ok(())
    }

    /// 列を削除して返す
    pub fn remove_column(&mut self, name: &str) -> Result<Column> {
        let idx = self.existing_index(name)?;
        let column = self.columns.remove(idx);
        self.rebuild_index();
        if self.columns.is_empty() {
            self.row_count = 0;
        }
        Ok(column)
    }

    pub fn swap_columns(&mut self, a: &str, b: &str) -> Result<()> {
        let i = self.existing_index(a)?;
        let j = self.existing_index(b)?;
        self.columns.swap(i, j);
        self.rebuild_index();
        Ok(())
    }

    pub fn hide_column(&mut self, name: &str) -> Result<()> {
        let idx = self.existing_index(name)?;
        self.columns[idx].set_hidden(true);
        Ok(())
    }

    pub fn show_column(&mut self, name: &str) -> Result<()> {
        let idx = self.existing_index(name)?;
        self.columns[idx].set_hidden(false);
        Ok(())
    }

    pub fn hide_all(&mut self) {
        for column in &mut self.columns {
            column.set_hidden(true);
        }
    }

    pub fn show_all(&mut self) {
        for column in &mut self.columns {
            column.set_hidden(false);
        }
    }

    /// 深いコピーを作成（計算式は再パースされる）
    pub fn copy(&self) -> Result<Table> {
        let mut table = self.derive(&self.name);
        for column in &self.columns {
            table.push_column(column.try_clone(self.engine())?)?;
        }
        table.row_count = self.row_count;
        table.pending = self.pending;
        Ok(table)
    }

    /// Same columns, zero rows
    pub fn empty_copy(&self) -> Result<Table> {
        let mut table = self.derive(&self.name);
        for column in &self.columns {
            table.push_column(column.empty_copy(self.engine())?)?;
        }
        table.pending = false;
        Ok(table)
    }

    /// True when some computed column has not been evaluated since the last change
    pub fn has_pending_expressions(&self) -> bool {
        self.pending
    }

    /// 計算列の値を評価する
    ///
    /// Computed columns are evaluated in column order, so a formula sees the
    /// evaluated values of the computed columns on its left. Calling it again
    /// without changes is a no-op.
    pub fn evaluate_expressions(&mut self) -> Result<()> {
        if !self.pending {
            return Ok(());
        }
        for idx in 0..self.columns.len() {
            let values = match self.columns[idx].expression() {
                Some(expr) => (0..self.row_count)
                    .map(|i| expr.evaluate(&Row::new(self, i)))
                    .collect::<Result<Vec<_>>>()?,
                None => continue,
            };
            let series = self.columns[idx].series_mut();
            series.clear();
            for value in &values {
                series.append(value);
            }
        }
        log::debug!("evaluated expressions of table '{}'", self.name);
        self.pending = false;
        Ok(())
    }

    /// Evaluated view of the table
    pub fn materialized(&self) -> Result<Materialized<'_>> {
        if !self.pending {
            return Ok(Materialized::Borrowed(self));
        }
        let mut copy = self.copy()?;
        copy.evaluate_expressions()?;
        Ok(Materialized::Owned(copy))
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("rows", &self.row_count)
            .field("columns", &self.columns)
            .finish()
    }
}
