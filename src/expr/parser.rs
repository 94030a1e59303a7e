//! Recursive descent parser building the formula AST

use super::lexer::Token;
use crate::error::{Error, Result};
use crate::value::Value;

/// Formula AST node types
#[derive(Debug, Clone)]
pub(crate) enum Expr {
    Column(String),
    Literal(Value),
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Function call, name lower-cased
    Function { name: String, args: Vec<Expr> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum BinaryOp {
    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    // Logical
    And,
    Or,
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum UnaryOp {
    Not,
    Negate,
}

pub(crate) struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Parses the whole token stream
    pub(crate) fn parse(&mut self) -> Result<Expr> {
        let expr = self.parse_or_expression()?;
        match self.current_token() {
            Some(Token::Eof) | None => Ok(expr),
            Some(token) => Err(Error::Expression(format!("unexpected token: {:?}", token))),
        }
    }

    fn parse_or_expression(&mut self) -> Result<Expr> {
        let mut left = self.parse_and_expression()?;
        while self.match_token(&Token::Or) {
            let right = self.parse_and_expression()?;
            left = binary(left, BinaryOp::Or, right);
        }
        Ok(left)
    }

    fn parse_and_expression(&mut self) -> Result<Expr> {
        let mut left = self.parse_equality_expression()?;
        while self.match_token(&Token::And) {
            let right = self.parse_equality_expression()?;
            left = binary(left, BinaryOp::And, right);
        }
        Ok(left)
    }

    fn parse_equality_expression(&mut self) -> Result<Expr> {
        let mut left = self.parse_comparison_expression()?;
        while let Some(op) = self.match_operator(|t| match t {
            Token::Equal => Some(BinaryOp::Equal),
            Token::NotEqual => Some(BinaryOp::NotEqual),
            _ => None,
        }) {
            let right = self.parse_comparison_expression()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_comparison_expression(&mut self) -> Result<Expr> {
        let mut left = self.parse_additive_expression()?;
        while let Some(op) = self.match_operator(|t| match t {
            Token::LessThan => Some(BinaryOp::LessThan),
            Token::LessThanOrEqual => Some(BinaryOp::LessThanOrEqual),
            Token::GreaterThan => Some(BinaryOp::GreaterThan),
            Token::GreaterThanOrEqual => Some(BinaryOp::GreaterThanOrEqual),
            _ => None,
        }) {
            let right = self.parse_additive_expression()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_additive_expression(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative_expression()?;
        while let Some(op) = self.match_operator(|t| match t {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Subtract),
            _ => None,
        }) {
            let right = self.parse_multiplicative_expression()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_multiplicative_expression(&mut self) -> Result<Expr> {
        let mut left = self.parse_power_expression()?;
        while let Some(op) = self.match_operator(|t| match t {
            Token::Multiply => Some(BinaryOp::Multiply),
            Token::Divide => Some(BinaryOp::Divide),
            Token::Modulo => Some(BinaryOp::Modulo),
            _ => None,
        }) {
            let right = self.parse_power_expression()?;
            left = binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_power_expression(&mut self) -> Result<Expr> {
        let left = self.parse_unary_expression()?;
        if self.match_token(&Token::Power) {
            // 右結合
            let right = self.parse_power_expression()?;
            return Ok(binary(left, BinaryOp::Power, right));
        }
        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> Result<Expr> {
        let op = if self.match_token(&Token::Not) {
            UnaryOp::Not
        } else if self.match_token(&Token::Minus) {
            UnaryOp::Negate
        } else {
            return self.parse_primary_expression();
        };
        let operand = self.parse_unary_expression()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_primary_expression(&mut self) -> Result<Expr> {
        let token = match self.current_token() {
            Some(token) => token.clone(),
            None => return Err(Error::Expression("unexpected end of input".to_string())),
        };
        self.advance();

        match token {
            Token::Int(v) => Ok(Expr::Literal(Value::Int64(v))),
            Token::Float(v) => Ok(Expr::Literal(Value::Float64(v))),
            Token::Str(v) => Ok(Expr::Literal(Value::String(v))),
            Token::Bool(v) => Ok(Expr::Literal(Value::Bool(v))),
            Token::Null => Ok(Expr::Literal(Value::Null)),
            Token::Identifier(name) => Ok(Expr::Column(name)),
            Token::Function(name) => {
                if !self.match_token(&Token::LeftParen) {
                    return Err(Error::Expression("expected '(' after function name".to_string()));
                }
                let mut args = Vec::new();
                if !self.check_token(&Token::RightParen) {
                    loop {
                        args.push(self.parse_or_expression()?);
                        if !self.match_token(&Token::Comma) {
                            break;
                        }
                    }
                }
                if !self.match_token(&Token::RightParen) {
                    return Err(Error::Expression(
                        "expected ')' after function arguments".to_string(),
                    ));
                }
                Ok(Expr::Function {
                    name: name.to_lowercase(),
                    args,
                })
            }
            Token::LeftParen => {
                let expr = self.parse_or_expression()?;
                if !self.match_token(&Token::RightParen) {
                    return Err(Error::Expression("expected ')' after expression".to_string()));
                }
                Ok(expr)
            }
            Token::Eof => Err(Error::Expression("unexpected end of input".to_string())),
            other => Err(Error::Expression(format!("unexpected token: {:?}", other))),
        }
    }

    fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn match_token(&mut self, expected: &Token) -> bool {
        if self.check_token(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check_token(&self, expected: &Token) -> bool {
        self.current_token()
            .map(|token| std::mem::discriminant(token) == std::mem::discriminant(expected))
            .unwrap_or(false)
    }

    fn match_operator<F>(&mut self, select: F) -> Option<BinaryOp>
    where
        F: Fn(&Token) -> Option<BinaryOp>,
    {
        let op = self.current_token().and_then(select)?;
        self.advance();
        Some(op)
    }
}

fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

/// Collects the function names referenced by `expr`
pub(crate) fn function_names<'a>(expr: &'a Expr, names: &mut Vec<&'a str>) {
    match expr {
        Expr::Function { name, args } => {
            names.push(name);
            for arg in args {
                function_names(arg, names);
            }
        }
        Expr::Binary { left, right, .. } => {
            function_names(left, names);
            function_names(right, names);
        }
        Expr::Unary { operand, .. } => function_names(operand, names),
        Expr::Column(_) | Expr::Literal(_) => {}
    }
}
