mod element;
mod stats;

use std::any::Any;
use std::cmp::Ordering;
use std::fmt::Debug;

use ahash::AHashSet;

use crate::config::DEFAULT_TIME_FORMATS;
use crate::error::{Error, Result};
use crate::value::Value;

pub use self::element::{parse_time, Element};

/// Series作成時のオプション
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesOptions {
    /// `time` 系列が受け付ける日時フォーマット（先に一致したものを採用）
    pub time_formats: Vec<String>,
}

impl Default for SeriesOptions {
    fn default() -> Self {
        SeriesOptions {
            time_formats: DEFAULT_TIME_FORMATS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Series構造体: null を含みうる同じ型の値の配列
#[derive(Debug, Clone)]
pub struct Series<T: Element> {
    /// Seriesのデータ値（Noneはnull）
    values: Vec<Option<T>>,

    /// 値の変換オプション
    options: SeriesOptions,
}

impl<T: Element> Series<T> {
    /// 空のSeriesを作成
    pub fn new(options: SeriesOptions) -> Self {
        Series {
            values: Vec::new(),
            options,
        }
    }

    /// 動的な値の配列からSeriesを作成
    ///
    /// 各値は `T::from_value` で変換され、変換できない値はnullになる
    pub fn from_values(values: &[Value], options: SeriesOptions) -> Self {
        let values = values
            .iter()
            .map(|v| T::from_value(v, &options))
            .collect();
        Series { values, options }
    }

    /// 型付きの値からSeriesを作成
    pub fn from_vec(values: Vec<Option<T>>) -> Self {
        Series {
            values,
            options: SeriesOptions::default(),
        }
    }

    /// 値の配列を取得
    pub fn values(&self) -> &[Option<T>] {
        &self.values
    }

    /// 位置から型付きの値を取得
    pub fn get_typed(&self, pos: usize) -> Option<&T> {
        self.values.get(pos).and_then(Option::as_ref)
    }

    /// 型付きの値を追加
    pub fn push(&mut self, value: Option<T>) {
        self.values.push(value);
    }

    /// 変換オプションを取得
    pub fn options(&self) -> &SeriesOptions {
        &self.options
    }

    fn present(&self) -> impl Iterator<Item = &T> {
        self.values.iter().flatten()
    }

    fn numbers(&self) -> Vec<f64> {
        self.present().filter_map(Element::to_f64).collect()
    }

    fn with_values(&self, values: Vec<Option<T>>) -> Self {
        Series {
            values,
            options: self.options.clone(),
        }
    }

    fn extreme(&self, wanted: Ordering) -> Value {
        let mut best: Option<&T> = None;
        for v in self.present() {
            best = match best {
                Some(b) if v.compare(b) != wanted => Some(b),
                _ => Some(v),
            };
        }
        best.map(Element::to_value).unwrap_or(Value::Null)
    }
}

fn float_or_null(v: Option<f64>) -> Value {
    v.map(Value::Float64).unwrap_or(Value::Null)
}

/// 型を隠蔽したSeriesの操作
///
/// Columns hold their data as `Box<dyn SeriesTrait>`. All operations speak
/// [`Value`] so that tables can mix element types.
pub trait SeriesTrait: Debug + Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `pos`, null when out of range
    fn get(&self, pos: usize) -> Value;

    fn is_null(&self, pos: usize) -> bool;

    /// Appends one value, coerced through the element conversion
    fn append(&mut self, value: &Value);

    /// Replaces the value at `pos`
    fn set(&mut self, pos: usize, value: &Value) -> Result<()>;

    /// Appends `n` nulls
    fn grow(&mut self, n: usize);

    /// Removes every value
    fn clear(&mut self);

    /// Sub-selection in the given order. Out of range positions become null.
    fn pick(&self, indices: &[usize]) -> Box<dyn SeriesTrait>;

    /// Like `pick`, with `None` producing a null
    fn pick_nullable(&self, indices: &[Option<usize>]) -> Box<dyn SeriesTrait>;

    /// Deep copy
    fn copy(&self) -> Box<dyn SeriesTrait>;

    /// Same type and options, zero rows
    fn empty_copy(&self) -> Box<dyn SeriesTrait>;

    /// Compares the values at `a` and `b`. Null is greater than any present value.
    fn compare(&self, a: usize, b: usize) -> Ordering;

    fn sum(&self) -> Value;
    fn avg(&self) -> Value;
    fn min(&self) -> Value;
    fn max(&self) -> Value;
    fn median(&self) -> Value;
    fn stddev(&self) -> Value;
    fn variance(&self) -> Value;
    fn cusum(&self) -> Value;
    fn count(&self) -> usize;
    fn count_distinct(&self) -> usize;
    fn group_concat(&self) -> Value;
    fn group_any(&self) -> Value;

    fn as_any(&self) -> &dyn Any;
}

impl<T: Element> SeriesTrait for Series<T> {
    fn len(&self) -> usize {
        self.values.len()
    }

    fn get(&self, pos: usize) -> Value {
        self.get_typed(pos)
            .map(Element::to_value)
            .unwrap_or(Value::Null)
    }

    fn is_null(&self, pos: usize) -> bool {
        self.get_typed(pos).is_none()
    }

    fn append(&mut self, value: &Value) {
        let converted = T::from_value(value, &self.options);
        self.values.push(converted);
    }

    fn set(&mut self, pos: usize, value: &Value) -> Result<()> {
        let size = self.values.len();
        let converted = T::from_value(value, &self.options);
        match self.values.get_mut(pos) {
            Some(slot) => {
                *slot = converted;
                Ok(())
            }
            None => Err(Error::IndexOutOfBounds { index: pos, size }),
        }
    }

    fn grow(&mut self, n: usize) {
        self.values.extend(std::iter::repeat_with(|| None).take(n));
    }

    fn clear(&mut self) {
        self.values.clear();
    }

    fn pick(&self, indices: &[usize]) -> Box<dyn SeriesTrait> {
        let values = indices
            .iter()
            .map(|&i| self.values.get(i).cloned().flatten())
            .collect();
        Box::new(self.with_values(values))
    }

    fn pick_nullable(&self, indices: &[Option<usize>]) -> Box<dyn SeriesTrait> {
        let values = indices
            .iter()
            .map(|i| i.and_then(|i| self.values.get(i).cloned().flatten()))
            .collect();
        Box::new(self.with_values(values))
    }

    fn copy(&self) -> Box<dyn SeriesTrait> {
        Box::new(self.clone())
    }

    fn empty_copy(&self) -> Box<dyn SeriesTrait> {
        Box::new(self.with_values(Vec::new()))
    }

    fn compare(&self, a: usize, b: usize) -> Ordering {
        match (self.get_typed(a), self.get_typed(b)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => x.compare(y),
        }
    }

    fn sum(&self) -> Value {
        Value::Float64(self.numbers().iter().sum())
    }

    fn avg(&self) -> Value {
        float_or_null(stats::mean(&self.numbers()))
    }

    fn min(&self) -> Value {
        self.extreme(Ordering::Less)
    }

    fn max(&self) -> Value {
        self.extreme(Ordering::Greater)
    }

    fn median(&self) -> Value {
        float_or_null(stats::median(&self.numbers()))
    }

    fn stddev(&self) -> Value {
        float_or_null(stats::stddev(&self.numbers()))
    }

    fn variance(&self) -> Value {
        float_or_null(stats::variance(&self.numbers()))
    }

    // 累積和の最終値
    fn cusum(&self) -> Value {
        let total = self.numbers().iter().fold(0.0, |acc, v| acc + v);
        Value::Float64(total)
    }

    fn count(&self) -> usize {
        self.present().count()
    }

    fn count_distinct(&self) -> usize {
        self.present()
            .map(|v| v.to_value().key_part())
            .collect::<AHashSet<_>>()
            .len()
    }

    fn group_concat(&self) -> Value {
        let parts: Vec<String> = self.present().map(|v| v.to_value().render()).collect();
        if parts.is_empty() {
            Value::Null
        } else {
            Value::String(parts.join(","))
        }
    }

    fn group_any(&self) -> Value {
        self.present()
            .next()
            .map(Element::to_value)
            .unwrap_or(Value::Null)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<'s> dyn SeriesTrait + 's {
    /// Restartable iterator over the values
    pub fn iter(&self) -> SeriesIter<'_> {
        SeriesIter {
            series: self,
            pos: 0,
        }
    }

    /// Typed view of the series
    pub fn downcast_ref<T: Element>(&self) -> Option<&Series<T>> {
        self.as_any().downcast_ref::<Series<T>>()
    }
}

/// Seriesの値を順に返すイテレータ
pub struct SeriesIter<'a> {
    series: &'a dyn SeriesTrait,
    pos: usize,
}

impl SeriesIter<'_> {
    /// 先頭からやり直す
    pub fn reset(&mut self) {
        self.pos = 0;
    }
}

impl Iterator for SeriesIter<'_> {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        if self.pos >= self.series.len() {
            return None;
        }
        let value = self.series.get(self.pos);
        self.pos += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.series.len().saturating_sub(self.pos);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SeriesIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values;

    fn ints(values: Vec<Value>) -> Box<dyn SeriesTrait> {
        Box::new(Series::<i64>::from_values(&values, SeriesOptions::default()))
    }

    #[test]
    fn test_append_coerces_and_nulls() {
        let mut s = ints(values![1, "2", "x"]);
        s.append(&Value::Float64(4.0));
        s.append(&Value::Null);
        assert_eq!(s.len(), 5);
        assert_eq!(s.get(1), Value::Int64(2));
        assert!(s.is_null(2));
        assert_eq!(s.get(3), Value::Int64(4));
        assert!(s.is_null(4));
        assert_eq!(s.get(99), Value::Null);
    }

    #[test]
    fn test_set_out_of_range() {
        let mut s = ints(values![1]);
        s.set(0, &Value::Int(9)).unwrap();
        assert_eq!(s.get(0), Value::Int64(9));
        assert!(matches!(
            s.set(3, &Value::Int(1)),
            Err(Error::IndexOutOfBounds { index: 3, size: 1 })
        ));
    }

    #[test]
    fn test_pick_and_pick_nullable() {
        let s = ints(values![10, 20, 30]);
        let picked = s.pick(&[2, 0, 0]);
        assert_eq!(picked.iter().collect::<Vec<_>>(), values![30i64, 10i64, 10i64]);
        let picked = s.pick_nullable(&[Some(1), None]);
        assert_eq!(picked.get(0), Value::Int64(20));
        assert!(picked.is_null(1));
        assert!(s.empty_copy().is_empty());
    }

    #[test]
    fn test_compare_null_last() {
        let s = ints(values![1, Value::Null, 0]);
        assert_eq!(s.compare(0, 1), Ordering::Less);
        assert_eq!(s.compare(1, 1), Ordering::Equal);
        assert_eq!(s.compare(0, 2), Ordering::Greater);
    }

    #[test]
    fn test_reductions() {
        let s = ints(values![4, 1, Value::Null, 3, 2]);
        assert_eq!(s.sum(), Value::Float64(10.0));
        assert_eq!(s.cusum(), Value::Float64(10.0));
        assert_eq!(s.avg(), Value::Float64(2.5));
        assert_eq!(s.median(), Value::Float64(2.5));
        assert_eq!(s.min(), Value::Int64(1));
        assert_eq!(s.max(), Value::Int64(4));
        assert_eq!(s.variance(), Value::Float64(1.25));
        assert_eq!(s.count(), 4);
        assert_eq!(s.group_concat(), Value::from("4,1,3,2"));
        assert_eq!(s.group_any(), Value::Int64(4));
    }

    #[test]
    fn test_reductions_on_all_null() {
        let s = ints(values![Value::Null, Value::Null]);
        assert_eq!(s.sum(), Value::Float64(0.0));
        assert_eq!(s.cusum(), Value::Float64(0.0));
        assert_eq!(s.avg(), Value::Null);
        assert_eq!(s.median(), Value::Null);
        assert_eq!(s.stddev(), Value::Null);
        assert_eq!(s.min(), Value::Null);
        assert_eq!(s.group_concat(), Value::Null);
        assert_eq!(s.group_any(), Value::Null);
        assert_eq!(s.count(), 0);
        assert_eq!(s.count_distinct(), 0);
    }

    #[test]
    fn test_count_distinct_strings() {
        let s: Box<dyn SeriesTrait> = Box::new(Series::<String>::from_values(
            &values!["a", "b", "a", Value::Null],
            SeriesOptions::default(),
        ));
        assert_eq!(s.count_distinct(), 2);
        assert_eq!(s.min(), Value::from("a"));
        // 文字列には数値として読める値がない
        assert_eq!(s.sum(), Value::Float64(0.0));
    }

    #[test]
    fn test_iter_reset() {
        let s = ints(values![1, 2]);
        let mut it = s.iter();
        assert_eq!(it.len(), 2);
        assert_eq!(it.next(), Some(Value::Int64(1)));
        assert_eq!(it.next(), Some(Value::Int64(2)));
        assert_eq!(it.next(), None);
        it.reset();
        assert_eq!(it.next(), Some(Value::Int64(1)));
    }

    #[test]
    fn test_copy_is_independent() {
        let s = ints(values![1, 2]);
        let mut c = s.copy();
        c.set(0, &Value::Int(100)).unwrap();
        assert_eq!(s.get(0), Value::Int64(1));
        let typed = c.downcast_ref::<i64>().unwrap();
        assert_eq!(typed.values()[0], Some(100));
    }
}
