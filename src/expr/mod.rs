//! Expression engine for computed columns
//!
//! A table parses each column formula once through its
//! [`ExpressionEngine`] and evaluates the resulting [`Expression`] once per
//! row. [`FormulaEngine`] is the built-in engine:
//! - bare or back-quoted column identifiers (`` `prix total` ``)
//! - integer, float, string, boolean and `null` literals
//! - arithmetic `+ - * / % **`, comparisons and `&& || !` / `and or not`
//! - case-insensitive functions, extensible with [`FormulaEngine::add_function`]
//!
//! Null operands propagate null.

mod eval;
mod functions;
mod lexer;
mod parser;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::table::Row;
use crate::value::Value;

use self::eval::Evaluator;
use self::lexer::Lexer;
use self::parser::{function_names, Expr, Parser};

/// A parsed formula
pub trait Expression: Send + Sync {
    /// Evaluates the formula against one row
    fn evaluate(&self, row: &Row<'_>) -> Result<Value>;
}

/// Parses formula text into expressions
pub trait ExpressionEngine: Send + Sync {
    fn parse(&self, formula: &str) -> Result<Box<dyn Expression>>;
}

/// Function callable from formulas
pub type FunctionImpl = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// Built-in formula engine
#[derive(Clone)]
pub struct FormulaEngine {
    functions: HashMap<String, FunctionImpl>,
}

impl Default for FormulaEngine {
    fn default() -> Self {
        let functions = functions::builtins()
            .into_iter()
            .map(|(name, func)| (name.to_string(), func))
            .collect();
        Self { functions }
    }
}

impl FormulaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a function. Names are case-insensitive.
    pub fn add_function<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.functions.insert(name.to_lowercase(), Arc::new(func));
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(&name.to_lowercase())
    }
}

impl fmt::Debug for FormulaEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormulaEngine")
            .field("functions", &format!("{} functions", self.functions.len()))
            .finish()
    }
}

impl ExpressionEngine for FormulaEngine {
    fn parse(&self, formula: &str) -> Result<Box<dyn Expression>> {
        let tokens = Lexer::new(formula).tokenize()?;
        let root = Parser::new(tokens).parse()?;

        let mut names = Vec::new();
        function_names(&root, &mut names);
        let mut functions = HashMap::new();
        for name in names {
            let func = self
                .functions
                .get(name)
                .ok_or_else(|| Error::Expression(format!("unknown function '{}'", name)))?;
            functions.insert(name.to_string(), func.clone());
        }

        log::trace!("parsed formula '{}'", formula);
        Ok(Box::new(Formula { root, functions }))
    }
}

/// Expression produced by [`FormulaEngine`]
struct Formula {
    root: Expr,
    functions: HashMap<String, FunctionImpl>,
}

impl Expression for Formula {
    fn evaluate(&self, row: &Row<'_>) -> Result<Value> {
        Evaluator::new(&self.functions, row).evaluate(&self.root)
    }
}
