//! 列の要素型と変換関数

use std::cmp::Ordering;
use std::fmt::Debug;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use num_traits::{NumCast, ToPrimitive};
use serde_json::Value as JsonValue;

use super::SeriesOptions;
use crate::value::{JsonObject, Value};

/// Seriesに格納できる要素型
///
/// `from_value` is the single "as-T" conversion every appended value goes
/// through. It returns `None` for null and for values that have no reading
/// as `T`.
pub trait Element: Clone + Debug + Send + Sync + 'static {
    /// 値をこの型に変換する
    fn from_value(value: &Value, options: &SeriesOptions) -> Option<Self>;

    /// この型の値を動的な値に戻す
    fn to_value(&self) -> Value;

    /// 2つの値を比較する
    fn compare(&self, other: &Self) -> Ordering;

    /// 数値としての読み取り（数値型以外はNone）
    fn to_f64(&self) -> Option<f64> {
        None
    }
}

/// Parses `text` with the first accepting format of `formats`.
///
/// Each format is tried as a zoned date-time, a naive date-time (taken as
/// UTC) and finally a plain date (midnight UTC).
pub fn parse_time(text: &str, formats: &[String]) -> Option<DateTime<Utc>> {
    let text = text.trim();
    for format in formats {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(ndt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
                return Some(Utc.from_utc_datetime(&ndt));
            }
        }
    }
    None
}

pub(crate) fn compare_floats(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

fn json_text<T: serde::Serialize>(v: &T) -> String {
    serde_json::to_string(v).unwrap_or_default()
}

impl Element for bool {
    fn from_value(value: &Value, _options: &SeriesOptions) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            v if v.is_numeric() => v.as_f64().map(|f| f != 0.0),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl Element for String {
    fn from_value(value: &Value, _options: &SeriesOptions) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.render()),
        }
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

macro_rules! integer_element {
    ($t:ty, $variant:ident) => {
        impl Element for $t {
            fn from_value(value: &Value, _options: &SeriesOptions) -> Option<Self> {
                match value {
                    Value::Bool(b) => Some(if *b { 1 } else { 0 }),
                    Value::String(s) => {
                        let s = s.trim();
                        s.parse::<$t>().ok().or_else(|| {
                            s.parse::<f64>()
                                .ok()
                                .filter(|f| f.is_finite())
                                .and_then(|f| <$t as NumCast>::from(f.trunc()))
                        })
                    }
                    v => v.as_i64().and_then(<$t as NumCast>::from),
                }
            }

            fn to_value(&self) -> Value {
                Value::$variant(*self)
            }

            fn compare(&self, other: &Self) -> Ordering {
                self.cmp(other)
            }

            fn to_f64(&self) -> Option<f64> {
                ToPrimitive::to_f64(self)
            }
        }
    };
}

integer_element!(isize, Int);
integer_element!(i32, Int32);
integer_element!(i64, Int64);

macro_rules! float_element {
    ($t:ty, $variant:ident) => {
        impl Element for $t {
            fn from_value(value: &Value, _options: &SeriesOptions) -> Option<Self> {
                match value {
                    Value::String(s) => s.trim().parse::<$t>().ok(),
                    v => v.as_f64().and_then(<$t as NumCast>::from),
                }
            }

            fn to_value(&self) -> Value {
                Value::$variant(*self)
            }

            fn compare(&self, other: &Self) -> Ordering {
                compare_floats(<f64 as From<$t>>::from(*self), <f64 as From<$t>>::from(*other))
            }

            fn to_f64(&self) -> Option<f64> {
                Some(<f64 as From<$t>>::from(*self))
            }
        }
    };
}

float_element!(f32, Float32);
float_element!(f64, Float64);

impl Element for DateTime<Utc> {
    fn from_value(value: &Value, options: &SeriesOptions) -> Option<Self> {
        match value {
            Value::Time(t) => Some(*t),
            Value::String(s) => parse_time(s, &options.time_formats),
            Value::Int(_) | Value::Int32(_) | Value::Int64(_) => {
                value.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0))
            }
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Time(*self)
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

/// `raw` columns keep any value untouched
impl Element for Value {
    fn from_value(value: &Value, _options: &SeriesOptions) -> Option<Self> {
        match value {
            Value::Null => None,
            other => Some(other.clone()),
        }
    }

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn compare(&self, other: &Self) -> Ordering {
        Value::compare(self, other)
    }

    fn to_f64(&self) -> Option<f64> {
        self.as_f64()
    }
}

impl Element for Vec<JsonValue> {
    fn from_value(value: &Value, _options: &SeriesOptions) -> Option<Self> {
        match value {
            Value::Array(items) => Some(items.clone()),
            Value::ArrayObject(items) => Some(items.iter().cloned().map(JsonValue::Object).collect()),
            Value::String(s) => serde_json::from_str(s).ok(),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Array(self.clone())
    }

    fn compare(&self, other: &Self) -> Ordering {
        json_text(self).cmp(&json_text(other))
    }
}

impl Element for JsonObject {
    fn from_value(value: &Value, _options: &SeriesOptions) -> Option<Self> {
        match value {
            Value::Object(map) => Some(map.clone()),
            Value::String(s) => serde_json::from_str(s).ok(),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Object(self.clone())
    }

    fn compare(&self, other: &Self) -> Ordering {
        json_text(self).cmp(&json_text(other))
    }
}

impl Element for Vec<JsonObject> {
    fn from_value(value: &Value, _options: &SeriesOptions) -> Option<Self> {
        match value {
            Value::ArrayObject(items) => Some(items.clone()),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_object().cloned())
                .collect::<Option<Vec<_>>>(),
            Value::String(s) => serde_json::from_str(s).ok(),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::ArrayObject(self.clone())
    }

    fn compare(&self, other: &Self) -> Ordering {
        json_text(self).cmp(&json_text(other))
    }
}
