//! Formula evaluation over one row

use std::cmp::Ordering;
use std::collections::HashMap;

use super::parser::{BinaryOp, Expr, UnaryOp};
use super::FunctionImpl;
use crate::error::{Error, Result};
use crate::table::Row;
use crate::value::Value;

pub(crate) struct Evaluator<'a> {
    functions: &'a HashMap<String, FunctionImpl>,
    row: &'a Row<'a>,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(functions: &'a HashMap<String, FunctionImpl>, row: &'a Row<'a>) -> Self {
        Self { functions, row }
    }

    pub(crate) fn evaluate(&self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Column(name) => self
                .row
                .get(name)
                .ok_or_else(|| Error::Expression(format!("unknown column '{}'", name))),
            Expr::Unary { op, operand } => {
                let value = self.evaluate(operand)?;
                unary(*op, value)
            }
            Expr::Binary { left, op, right } => match op {
                BinaryOp::And | BinaryOp::Or => self.logical(*op, left, right),
                _ => {
                    let l = self.evaluate(left)?;
                    let r = self.evaluate(right)?;
                    binary(*op, l, r)
                }
            },
            Expr::Function { name, args } => {
                let func = self
                    .functions
                    .get(name)
                    .ok_or_else(|| Error::Expression(format!("unknown function '{}'", name)))?;
                let args = args
                    .iter()
                    .map(|arg| self.evaluate(arg))
                    .collect::<Result<Vec<_>>>()?;
                func(&args)
            }
        }
    }

    // 短絡評価。null は null のまま伝播する
    fn logical(&self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<Value> {
        let l = self.evaluate(left)?;
        match (op, &l) {
            (BinaryOp::And, Value::Bool(false)) => return Ok(Value::Bool(false)),
            (BinaryOp::Or, Value::Bool(true)) => return Ok(Value::Bool(true)),
            _ => {}
        }
        let r = self.evaluate(right)?;
        if l.is_null() || r.is_null() {
            return Ok(Value::Null);
        }
        match (l.as_bool(), r.as_bool()) {
            (Some(_), Some(b)) => Ok(Value::Bool(b)),
            _ => Err(type_error(op, &l, &r)),
        }
    }
}

fn type_error(op: BinaryOp, l: &Value, r: &Value) -> Error {
    Error::Expression(format!(
        "cannot apply {:?} to {} and {}",
        op,
        l.kind_name(),
        r.kind_name()
    ))
}

fn unary(op: UnaryOp, value: Value) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match op {
        UnaryOp::Not => value
            .as_bool()
            .map(|b| Value::Bool(!b))
            .ok_or_else(|| Error::Expression(format!("cannot negate {}", value.kind_name()))),
        UnaryOp::Negate => match integer(&value) {
            Some(i) => Ok(i
                .checked_neg()
                .map(Value::Int64)
                .unwrap_or(Value::Float64(-(i as f64)))),
            None => value
                .as_f64()
                .map(|f| Value::Float64(-f))
                .ok_or_else(|| Error::Expression(format!("cannot negate {}", value.kind_name()))),
        },
    }
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Int(_) | Value::Int32(_) | Value::Int64(_) => value.as_i64(),
        _ => None,
    }
}

pub(crate) fn binary(op: BinaryOp, l: Value, r: Value) -> Result<Value> {
    if l.is_null() || r.is_null() {
        return Ok(Value::Null);
    }

    let ordering = || l.compare(&r);
    match op {
        BinaryOp::Equal => return Ok(Value::Bool(ordering() == Ordering::Equal)),
        BinaryOp::NotEqual => return Ok(Value::Bool(ordering() != Ordering::Equal)),
        BinaryOp::LessThan => return Ok(Value::Bool(ordering() == Ordering::Less)),
        BinaryOp::LessThanOrEqual => return Ok(Value::Bool(ordering() != Ordering::Greater)),
        BinaryOp::GreaterThan => return Ok(Value::Bool(ordering() == Ordering::Greater)),
        BinaryOp::GreaterThanOrEqual => return Ok(Value::Bool(ordering() != Ordering::Less)),
        BinaryOp::And | BinaryOp::Or => {
            return match (l.as_bool(), r.as_bool()) {
                (Some(a), Some(b)) => Ok(Value::Bool(if op == BinaryOp::And { a && b } else { a || b })),
                _ => Err(type_error(op, &l, &r)),
            }
        }
        _ => {}
    }

    if op == BinaryOp::Add && (l.as_str().is_some() || r.as_str().is_some()) {
        return Ok(Value::String(format!("{}{}", l.render(), r.render())));
    }

    if let (Some(a), Some(b)) = (integer(&l), integer(&r)) {
        let exact = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Subtract => a.checked_sub(b),
            BinaryOp::Multiply => a.checked_mul(b),
            BinaryOp::Modulo if b == 0 => return Ok(Value::Null),
            BinaryOp::Modulo => a.checked_rem(b),
            BinaryOp::Power => u32::try_from(b).ok().and_then(|e| a.checked_pow(e)),
            _ => None,
        };
        if let Some(v) = exact {
            return Ok(Value::Int64(v));
        }
    }

    let (a, b) = match (l.as_f64(), r.as_f64()) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(type_error(op, &l, &r)),
    };
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Subtract => a - b,
        BinaryOp::Multiply => a * b,
        BinaryOp::Divide | BinaryOp::Modulo if b == 0.0 => return Ok(Value::Null),
        BinaryOp::Divide => a / b,
        BinaryOp::Modulo => a % b,
        BinaryOp::Power => a.powf(b),
        _ => return Err(type_error(op, &l, &r)),
    };
    Ok(Value::Float64(result))
}
