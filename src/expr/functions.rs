//! Built-in formula functions

use std::cmp::Ordering;
use std::sync::Arc;

use super::FunctionImpl;
use crate::error::{Error, Result};
use crate::value::Value;

fn arity(name: &str, args: &[Value], expected: usize) -> Result<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(Error::Expression(format!(
            "{}() takes {} argument(s), {} given",
            name,
            expected,
            args.len()
        )))
    }
}

fn text_fn(name: &'static str, f: fn(&str) -> Value) -> FunctionImpl {
    Arc::new(move |args: &[Value]| {
        arity(name, args, 1)?;
        Ok(match &args[0] {
            Value::Null => Value::Null,
            Value::String(s) => f(s),
            other => f(&other.render()),
        })
    })
}

fn number_fn(name: &'static str, f: fn(f64) -> f64) -> FunctionImpl {
    Arc::new(move |args: &[Value]| {
        arity(name, args, 1)?;
        if args[0].is_null() {
            return Ok(Value::Null);
        }
        args[0]
            .as_f64()
            .map(|v| Value::Float64(f(v)))
            .ok_or_else(|| {
                Error::Expression(format!("{}() expects a number, got {}", name, args[0].kind_name()))
            })
    })
}

fn extreme_fn(wanted: Ordering) -> FunctionImpl {
    Arc::new(move |args: &[Value]| {
        let mut best: Option<&Value> = None;
        for v in args.iter().filter(|v| !v.is_null()) {
            best = match best {
                Some(b) if v.compare(b) != wanted => Some(b),
                _ => Some(v),
            };
        }
        Ok(best.cloned().unwrap_or(Value::Null))
    })
}

fn abs(args: &[Value]) -> Result<Value> {
    arity("abs", args, 1)?;
    match &args[0] {
        Value::Null => Ok(Value::Null),
        Value::Int(v) => Ok(Value::Int(v.saturating_abs())),
        Value::Int32(v) => Ok(Value::Int32(v.saturating_abs())),
        Value::Int64(v) => Ok(Value::Int64(v.saturating_abs())),
        Value::Float32(v) => Ok(Value::Float32(v.abs())),
        Value::Float64(v) => Ok(Value::Float64(v.abs())),
        other => Err(Error::Expression(format!(
            "abs() expects a number, got {}",
            other.kind_name()
        ))),
    }
}

fn round(args: &[Value]) -> Result<Value> {
    let digits = match args.len() {
        1 => 0,
        2 => match &args[1] {
            Value::Null => return Ok(Value::Null),
            d => d
                .as_i64()
                .ok_or_else(|| Error::Expression("round() digits must be an integer".to_string()))?,
        },
        _ => return arity("round", args, 1).map(|_| Value::Null),
    };
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    let value = args[0]
        .as_f64()
        .ok_or_else(|| Error::Expression(format!("round() expects a number, got {}", args[0].kind_name())))?;
    let factor = 10f64.powi(i32::try_from(digits).unwrap_or(0));
    Ok(Value::Float64((value * factor).round() / factor))
}

fn concat(args: &[Value]) -> Result<Value> {
    Ok(Value::String(args.iter().map(Value::render).collect()))
}

fn len(args: &[Value]) -> Result<Value> {
    arity("len", args, 1)?;
    Ok(match &args[0] {
        Value::Null => Value::Null,
        Value::Array(items) => Value::Int64(items.len() as i64),
        Value::ArrayObject(items) => Value::Int64(items.len() as i64),
        other => Value::Int64(other.render().chars().count() as i64),
    })
}

fn coalesce(args: &[Value]) -> Result<Value> {
    Ok(args
        .iter()
        .find(|v| !v.is_null())
        .cloned()
        .unwrap_or(Value::Null))
}

fn native(func: fn(&[Value]) -> Result<Value>) -> FunctionImpl {
    Arc::new(func)
}

/// Built-in function table
pub(crate) fn builtins() -> Vec<(&'static str, FunctionImpl)> {
    vec![
        ("upper", text_fn("upper", |s| Value::String(s.to_uppercase()))),
        ("lower", text_fn("lower", |s| Value::String(s.to_lowercase()))),
        ("trim", text_fn("trim", |s| Value::String(s.trim().to_string()))),
        ("len", native(len)),
        ("concat", native(concat)),
        ("abs", native(abs)),
        ("sqrt", number_fn("sqrt", f64::sqrt)),
        ("round", native(round)),
        ("min", extreme_fn(Ordering::Less)),
        ("max", extreme_fn(Ordering::Greater)),
        ("coalesce", native(coalesce)),
    ]
}
