//! Tokenizer for formulas

use std::iter::Peekable;
use std::str::Chars;

use crate::error::{Error, Result};

/// Token types for formula parsing
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// Column identifier, bare or back-quoted
    Identifier(String),
    /// Function name (an identifier directly followed by `(`)
    Function(String),
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
    /// Comparison operators
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    /// Logical operators
    And,
    Or,
    Not,
    /// Arithmetic operators
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Power,
    LeftParen,
    RightParen,
    Comma,
    Eof,
}

pub(crate) struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    /// Tokenizes the whole input. The last token is always `Eof`.
    pub(crate) fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        let ch = match self.chars.peek() {
            None => return Ok(Token::Eof),
            Some(&ch) => ch,
        };

        let token = match ch {
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            ',' => Some(Token::Comma),
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '/' => Some(Token::Divide),
            '%' => Some(Token::Modulo),
            _ => None,
        };
        if let Some(token) = token {
            self.chars.next();
            return Ok(token);
        }

        match ch {
            '*' => {
                self.chars.next();
                Ok(self.followed_by('*', Token::Power, Token::Multiply))
            }
            '=' => {
                self.chars.next();
                if self.chars.next_if_eq(&'=').is_some() {
                    Ok(Token::Equal)
                } else {
                    Err(Error::Expression("expected '==' for equality comparison".to_string()))
                }
            }
            '!' => {
                self.chars.next();
                Ok(self.followed_by('=', Token::NotEqual, Token::Not))
            }
            '<' => {
                self.chars.next();
                Ok(self.followed_by('=', Token::LessThanOrEqual, Token::LessThan))
            }
            '>' => {
                self.chars.next();
                Ok(self.followed_by('=', Token::GreaterThanOrEqual, Token::GreaterThan))
            }
            '&' => {
                self.chars.next();
                match self.chars.next_if_eq(&'&') {
                    Some(_) => Ok(Token::And),
                    None => Err(Error::Expression("expected '&&' for logical AND".to_string())),
                }
            }
            '|' => {
                self.chars.next();
                match self.chars.next_if_eq(&'|') {
                    Some(_) => Ok(Token::Or),
                    None => Err(Error::Expression("expected '||' for logical OR".to_string())),
                }
            }
            '\'' | '"' => self.read_string(),
            '`' => self.read_quoted_identifier(),
            '0'..='9' => self.read_number(),
            c if c.is_alphabetic() || c == '_' => Ok(self.read_identifier()),
            _ => Err(Error::Expression(format!("unexpected character: {}", ch))),
        }
    }

    fn followed_by(&mut self, next: char, matched: Token, otherwise: Token) -> Token {
        if self.chars.next_if_eq(&next).is_some() {
            matched
        } else {
            otherwise
        }
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    fn read_string(&mut self) -> Result<Token> {
        let quote = match self.chars.next() {
            Some(q) => q,
            None => return Err(Error::Expression("unterminated string literal".to_string())),
        };
        let mut value = String::new();

        while let Some(ch) = self.chars.next() {
            if ch == quote {
                return Ok(Token::Str(value));
            } else if ch == '\\' {
                if let Some(escaped) = self.chars.next() {
                    match escaped {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        '\\' | '\'' | '"' => value.push(escaped),
                        _ => {
                            value.push('\\');
                            value.push(escaped);
                        }
                    }
                }
            } else {
                value.push(ch);
            }
        }

        Err(Error::Expression("unterminated string literal".to_string()))
    }

    fn read_quoted_identifier(&mut self) -> Result<Token> {
        self.chars.next();
        let mut name = String::new();
        for ch in self.chars.by_ref() {
            if ch == '`' {
                return Ok(Token::Identifier(name));
            }
            name.push(ch);
        }
        Err(Error::Expression("unterminated quoted identifier".to_string()))
    }

    fn read_number(&mut self) -> Result<Token> {
        let mut number = String::new();
        while let Some(ch) = self.chars.next_if(|c| c.is_ascii_digit() || *c == '.') {
            number.push(ch);
        }

        if !number.contains('.') {
            if let Ok(value) = number.parse::<i64>() {
                return Ok(Token::Int(value));
            }
        }
        number
            .parse::<f64>()
            .map(Token::Float)
            .map_err(|_| Error::Expression(format!("invalid number: {}", number)))
    }

    fn read_identifier(&mut self) -> Token {
        let mut identifier = String::new();
        while let Some(ch) = self.chars.next_if(|c| c.is_alphanumeric() || *c == '_') {
            identifier.push(ch);
        }

        match identifier.to_ascii_lowercase().as_str() {
            "true" => Token::Bool(true),
            "false" => Token::Bool(false),
            "null" => Token::Null,
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            _ => {
                if self.chars.peek() == Some(&'(') {
                    Token::Function(identifier)
                } else {
                    Token::Identifier(identifier)
                }
            }
        }
    }
}
