//! Dynamic cell values
//!
//! Every cell crossing a column boundary (row append, row accessor, keyers,
//! formula evaluation, export) is carried as a [`Value`].

use std::cmp::Ordering;
use std::fmt::{self, Display};

use chrono::{DateTime, SecondsFormat, Utc};
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// JSON object payload used by `object` and `arrayObject` columns
pub type JsonObject = Map<String, JsonValue>;

/// A nullable cell value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    String(String),
    Int(isize),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Time(DateTime<Utc>),
    Array(Vec<JsonValue>),
    Object(JsonObject),
    ArrayObject(Vec<JsonObject>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for the integer and float variants
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Value::Int(_) | Value::Int32(_) | Value::Int64(_) | Value::Float32(_) | Value::Float64(_)
        )
    }

    /// Integer reading of the value. Finite floats are truncated.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => v.to_i64(),
            Value::Int32(v) => Some(i64::from(*v)),
            Value::Int64(v) => Some(*v),
            Value::Float32(v) if v.is_finite() => v.trunc().to_i64(),
            Value::Float64(v) if v.is_finite() => v.trunc().to_i64(),
            _ => None,
        }
    }

    /// Float reading of the value, numeric variants only
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => v.to_f64(),
            Value::Int32(v) => Some(f64::from(*v)),
            Value::Int64(v) => v.to_f64(),
            Value::Float32(v) => Some(f64::from(*v)),
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Time(t) => Some(t),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Int(_) => "int",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::Time(_) => "time",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::ArrayObject(_) => "arrayObject",
        }
    }

    /// Textual rendering used by `group_concat` and by the printer.
    /// Null renders as an empty string.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::String(s) => s.clone(),
            Value::Int(v) => v.to_string(),
            Value::Int32(v) => v.to_string(),
            Value::Int64(v) => v.to_string(),
            Value::Float32(v) => v.to_string(),
            Value::Float64(v) => v.to_string(),
            Value::Time(t) => t.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Value::Array(_) | Value::Object(_) | Value::ArrayObject(_) => self.to_json().to_string(),
        }
    }

    /// Converts the value to a JSON value. Times become RFC 3339 strings.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Int(v) => JsonValue::from(*v as i64),
            Value::Int32(v) => JsonValue::from(*v),
            Value::Int64(v) => JsonValue::from(*v),
            Value::Float32(v) => JsonValue::from(f64::from(*v)),
            Value::Float64(v) => JsonValue::from(*v),
            Value::Time(_) => JsonValue::String(self.render()),
            Value::Array(items) => JsonValue::Array(items.clone()),
            Value::Object(map) => JsonValue::Object(map.clone()),
            Value::ArrayObject(items) => JsonValue::Array(
                items.iter().cloned().map(JsonValue::Object).collect(),
            ),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Int(_) | Value::Int32(_) | Value::Int64(_) | Value::Float32(_) | Value::Float64(_) => 1,
            Value::String(_) => 2,
            Value::Time(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
            Value::ArrayObject(_) => 6,
            Value::Null => 7,
        }
    }

    /// Total order over values.
    ///
    /// Null is greater than any present value and equal to null. Numbers
    /// compare numerically across widths. Values of unrelated kinds are
    /// ordered by kind.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Time(a), Value::Time(b)) => a.cmp(b),
            (a, b) if a.is_numeric() && b.is_numeric() => compare_numbers(a, b),
            (a, b) if a.kind_rank() == b.kind_rank() => a.render().cmp(&b.render()),
            (a, b) => a.kind_rank().cmp(&b.kind_rank()),
        }
    }

    /// Normalized form used for hashing composite keys.
    /// Two values produce the same key part exactly when `compare` says they
    /// are equal.
    pub(crate) fn key_part(&self) -> KeyPart {
        match self {
            Value::Null => KeyPart::Null,
            Value::Bool(b) => KeyPart::Bool(*b),
            Value::String(s) => KeyPart::Text(s.clone()),
            Value::Int(v) => KeyPart::Int(*v as i64),
            Value::Int32(v) => KeyPart::Int(i64::from(*v)),
            Value::Int64(v) => KeyPart::Int(*v),
            Value::Float32(v) => float_key(f64::from(*v)),
            Value::Float64(v) => float_key(*v),
            Value::Time(t) => KeyPart::Time(t.timestamp(), t.timestamp_subsec_nanos()),
            Value::Array(_) => KeyPart::Json(4, self.render()),
            Value::Object(_) => KeyPart::Json(5, self.render()),
            Value::ArrayObject(_) => KeyPart::Json(6, self.render()),
        }
    }
}

fn is_integer_variant(v: &Value) -> bool {
    matches!(v, Value::Int(_) | Value::Int32(_) | Value::Int64(_))
}

fn compare_numbers(a: &Value, b: &Value) -> Ordering {
    match (is_integer_variant(a), is_integer_variant(b)) {
        (true, true) => return a.as_i64().cmp(&b.as_i64()),
        (true, false) => {
            if let (Some(i), Some(f)) = (a.as_i64(), b.as_f64()) {
                return compare_int_float(i, f);
            }
        }
        (false, true) => {
            if let (Some(f), Some(i)) = (a.as_f64(), b.as_i64()) {
                return compare_int_float(i, f).reverse();
            }
        }
        (false, false) => {}
    }
    let (x, y) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

// 2^63
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

// 整数と浮動小数点数を精度を落とさずに比較する
fn compare_int_float(i: i64, f: f64) -> Ordering {
    if f.is_nan() || f >= I64_LIMIT {
        return Ordering::Less;
    }
    if f < -I64_LIMIT {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0f64.partial_cmp(&(f - whole)).unwrap_or(Ordering::Equal),
        other => other,
    }
}

fn float_key(v: f64) -> KeyPart {
    if v.is_nan() {
        return KeyPart::Float(f64::NAN.to_bits());
    }
    if v.fract() == 0.0 && (-I64_LIMIT..I64_LIMIT).contains(&v) {
        return KeyPart::Int(v as i64);
    }
    KeyPart::Float(v.to_bits())
}

/// Hashable, serializable normalization of a [`Value`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub(crate) enum KeyPart {
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    Text(String),
    Time(i64, u32),
    Json(u8, String),
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            other => write!(f, "{}", other.render()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<isize> for Value {
    fn from(v: isize) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Time(v)
    }
}

impl From<JsonObject> for Value {
    fn from(v: JsonObject) -> Self {
        Value::Object(v)
    }
}

impl From<Vec<JsonValue>> for Value {
    fn from(v: Vec<JsonValue>) -> Self {
        Value::Array(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl From<JsonValue> for Value {
    fn from(v: JsonValue) -> Self {
        match v {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Int64(i),
                None => n.as_f64().map(Value::Float64).unwrap_or(Value::Null),
            },
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::Array(items),
            JsonValue::Object(map) => Value::Object(map),
        }
    }
}

/// Builds a `Vec<Value>` from heterogeneous literals
///
/// ```
/// use datatable::{values, Value};
/// let row = values![1, "a", 2.5, Value::Null];
/// assert_eq!(row.len(), 4);
/// ```
#[macro_export]
macro_rules! values {
    ($($v:expr),* $(,)?) => {
        vec![$($crate::Value::from($v)),*]
    };
}
