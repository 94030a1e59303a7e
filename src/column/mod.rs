mod registry;

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::{self, Debug, Display};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::expr::{Expression, ExpressionEngine};
use crate::series::{SeriesOptions, SeriesTrait};
use crate::value::Value;

pub use registry::{element_constructor, SeriesConstructor, TypeRegistry};

/// 列の型タグ
///
/// Built-in tags are available as associated constants. Any other tag is
/// valid as long as it is registered in the table's [`TypeRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnType(Cow<'static, str>);

impl ColumnType {
    pub const BOOL: ColumnType = ColumnType::from_static("bool");
    pub const STRING: ColumnType = ColumnType::from_static("string");
    pub const INT: ColumnType = ColumnType::from_static("int");
    pub const INT32: ColumnType = ColumnType::from_static("int32");
    pub const INT64: ColumnType = ColumnType::from_static("int64");
    pub const FLOAT32: ColumnType = ColumnType::from_static("float32");
    pub const FLOAT64: ColumnType = ColumnType::from_static("float64");
    pub const TIME: ColumnType = ColumnType::from_static("time");
    pub const RAW: ColumnType = ColumnType::from_static("raw");
    pub const ARRAY: ColumnType = ColumnType::from_static("array");
    pub const OBJECT: ColumnType = ColumnType::from_static("object");
    pub const ARRAY_OBJECT: ColumnType = ColumnType::from_static("arrayObject");

    pub const fn from_static(name: &'static str) -> Self {
        ColumnType(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        ColumnType(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ColumnType {
    fn from(name: &str) -> Self {
        ColumnType::new(name)
    }
}

impl From<String> for ColumnType {
    fn from(name: String) -> Self {
        ColumnType::new(name)
    }
}

impl From<&ColumnType> for ColumnType {
    fn from(ctype: &ColumnType) -> Self {
        ctype.clone()
    }
}

/// 列作成時のオプション
#[derive(Debug, Clone, Default)]
pub struct ColumnOptions {
    /// 表示ラベル（省略時は列名）
    pub label: Option<String>,
    /// 非表示フラグ
    pub hidden: bool,
    /// 計算式（`values` とは併用できない）
    pub expr: Option<String>,
    /// 初期値
    pub values: Option<Vec<Value>>,
    /// 日時フォーマット（省略時はテーブル設定のもの）
    pub time_formats: Option<Vec<String>>,
    /// 任意の属性
    pub attrs: HashMap<String, Value>,
}

impl ColumnOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn expr(mut self, formula: &str) -> Self {
        self.expr = Some(formula.to_string());
        self
    }

    pub fn values(mut self, values: Vec<Value>) -> Self {
        self.values = Some(values);
        self
    }

    pub fn time_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.time_formats = Some(formats.into_iter().map(Into::into).collect());
        self
    }

    pub fn attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    /// Initial values, empty when none were given
    pub fn initial_values(&self) -> &[Value] {
        self.values.as_deref().unwrap_or(&[])
    }

    /// Conversion options handed to the series
    pub fn series_options(&self) -> SeriesOptions {
        match &self.time_formats {
            Some(formats) => SeriesOptions {
                time_formats: formats.clone(),
            },
            None => SeriesOptions::default(),
        }
    }
}

/// 名前付きの列
///
/// A stored column holds appended values. A computed column carries a
/// formula and its parsed expression; its series is filled by
/// `Table::evaluate_expressions`.
pub struct Column {
    name: String,
    ctype: ColumnType,
    label: String,
    attrs: HashMap<String, Value>,
    hidden: bool,
    formula: Option<String>,
    expr: Option<Box<dyn Expression>>,
    series: Box<dyn SeriesTrait>,
}

impl Column {
    /// Creates a stored column
    pub(crate) fn new(name: &str, ctype: ColumnType, series: Box<dyn SeriesTrait>) -> Self {
        Column {
            name: name.to_string(),
            ctype,
            label: name.to_string(),
            attrs: HashMap::new(),
            hidden: false,
            formula: None,
            expr: None,
            series,
        }
    }

    pub(crate) fn with_options(mut self, options: &ColumnOptions) -> Self {
        if let Some(label) = &options.label {
            self.label = label.clone();
        }
        self.hidden = options.hidden;
        self.attrs = options.attrs.clone();
        self
    }

    pub(crate) fn with_formula(mut self, formula: &str, expr: Box<dyn Expression>) -> Self {
        self.formula = Some(formula.to_string());
        self.expr = Some(expr);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> &ColumnType {
        &self.ctype
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: &str) {
        self.label = label.to_string();
    }

    pub fn attrs(&self) -> &HashMap<String, Value> {
        &self.attrs
    }

    pub fn set_attrs(&mut self, attrs: HashMap<String, Value>) {
        self.attrs = attrs;
    }

    pub fn is_visible(&self) -> bool {
        !self.hidden
    }

    pub fn is_computed(&self) -> bool {
        self.formula.is_some()
    }

    pub fn formula(&self) -> Option<&str> {
        self.formula.as_deref()
    }

    pub fn series(&self) -> &dyn SeriesTrait {
        self.series.as_ref()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub(crate) fn series_mut(&mut self) -> &mut dyn SeriesTrait {
        self.series.as_mut()
    }

    pub(crate) fn set_series(&mut self, series: Box<dyn SeriesTrait>) {
        self.series = series;
    }

    pub(crate) fn expression(&self) -> Option<&dyn Expression> {
        self.expr.as_deref()
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub(crate) fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    /// Deep copy. The formula, if any, is parsed again with `engine` so the
    /// copy owns its own expression.
    pub fn try_clone(&self, engine: &dyn ExpressionEngine) -> Result<Column> {
        let expr = match &self.formula {
            Some(formula) => Some(engine.parse(formula)?),
            None => None,
        };
        Ok(Column {
            expr,
            series: self.series.copy(),
            ..self.metadata()
        })
    }

    /// Same column definition with zero rows
    pub fn empty_copy(&self, engine: &dyn ExpressionEngine) -> Result<Column> {
        let mut column = self.try_clone(engine)?;
        column.series.clear();
        Ok(column)
    }

    /// Stored copy with `series` as data. Formula and expression are dropped.
    pub(crate) fn stored_with(&self, series: Box<dyn SeriesTrait>) -> Column {
        Column {
            series,
            ..self.metadata()
        }
        .into_stored()
    }

    fn into_stored(mut self) -> Column {
        self.formula = None;
        self.expr = None;
        self
    }

    // series と expr 以外のフィールドを複製
    fn metadata(&self) -> Column {
        Column {
            name: self.name.clone(),
            ctype: self.ctype.clone(),
            label: self.label.clone(),
            attrs: self.attrs.clone(),
            hidden: self.hidden,
            formula: self.formula.clone(),
            expr: None,
            series: self.series.empty_copy(),
        }
    }
}

impl Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("type", &self.ctype)
            .field("label", &self.label)
            .field("hidden", &self.hidden)
            .field("formula", &self.formula)
            .field("len", &self.series.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::FormulaEngine;
    use crate::series::Series;
    use crate::values;

    fn numbers() -> Column {
        let series = Series::<i64>::from_values(&values![1, 2], SeriesOptions::default());
        Column::new("n", ColumnType::INT64, Box::new(series))
    }

    #[test]
    fn test_label_defaults_to_name() {
        let mut column = numbers();
        assert_eq!(column.label(), "n");
        column.set_label("Number");
        assert_eq!(column.label(), "Number");
        assert_eq!(column.name(), "n");
        assert!(column.is_visible());
        assert!(!column.is_computed());
    }

    #[test]
    fn test_try_clone_reparses_formula() {
        let engine = FormulaEngine::default();
        let expr = engine.parse("n * 2").unwrap();
        let column = numbers().with_formula("n * 2", expr);
        let copy = column.try_clone(&engine).unwrap();
        assert_eq!(copy.formula(), Some("n * 2"));
        assert!(copy.expression().is_some());
        assert_eq!(copy.len(), 2);

        let empty = column.empty_copy(&engine).unwrap();
        assert!(empty.is_empty());
        assert!(empty.is_computed());
    }

    #[test]
    fn test_copy_independence() {
        let engine = FormulaEngine::default();
        let column = numbers();
        let mut copy = column.try_clone(&engine).unwrap();
        copy.series_mut().set(0, &Value::Int(7)).unwrap();
        assert_eq!(column.series().get(0), Value::Int64(1));
        assert_eq!(copy.series().get(0), Value::Int64(7));
    }

    #[test]
    fn test_column_type_tags() {
        assert_eq!(ColumnType::ARRAY_OBJECT.as_str(), "arrayObject");
        assert_eq!(ColumnType::from("int64"), ColumnType::INT64);
        assert_eq!(serde_json::to_string(&ColumnType::TIME).unwrap(), "\"time\"");
    }
}
