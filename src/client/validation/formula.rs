//! Formula Rules
//!
//! A deliberately small expression language for cross-field predicates such
//! as `A + B == C` or `end - start <= 30 * 86400 && consent`.
//!
//! ## Grammar
//!
//! ```text
//! or      := and ( "||" and )*
//! and     := eq ( "&&" eq )*
//! eq      := cmp ( ("==" | "!=") cmp )*
//! cmp     := add ( ("<" | "<=" | ">" | ">=") add )*
//! add     := mul ( ("+" | "-") mul )*
//! mul     := unary ( ("*" | "/" | "%") unary )*
//! unary   := ("-" | "!") unary | power
//! power   := primary ( "**" unary )?
//! primary := number | string | "true" | "false" | ident | "[" name "]" | "(" or ")"
//! ```
//!
//! Identifiers name fields. Ids containing characters outside
//! `[A-Za-z0-9_]` can be written in brackets: `[date-of-birth]`.

use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error;

use super::value::{Parameters, Value};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormulaError {
    #[error("invalid formula syntax: {0}")]
    Syntax(String),
    #[error("no parameter '{0}' found")]
    UnknownVariable(String),
    #[error("cannot apply '{op}' to {left} and {right}")]
    Operands {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("cannot apply '{op}' to {operand}")]
    Operand { op: &'static str, operand: &'static str },
    #[error("unexpected formula result type: {0}")]
    Result(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Pow => "**",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(Value),
    Var(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    True,
    False,
    LParen,
    RParen,
    Not,
    Binary(BinaryOp),
}

/// A parsed formula, reusable across evaluations.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    expr: Expr,
}

impl Formula {
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.or()?;
        if let Some(token) = parser.peek() {
            return Err(FormulaError::Syntax(format!("unexpected {:?}", token)));
        }
        Ok(Self { expr })
    }

    pub fn evaluate(&self, params: &Parameters) -> Result<Value, FormulaError> {
        eval(&self.expr, params)
    }

    /// Evaluate as a predicate: booleans as-is, numbers true when non-zero.
    pub fn holds(&self, params: &Parameters) -> Result<bool, FormulaError> {
        match self.evaluate(params)? {
            Value::Bool(b) => Ok(b),
            Value::Number(n) => Ok(n != 0.0),
            other => Err(FormulaError::Result(other.type_name())),
        }
    }
}

/// Parse and evaluate `source` as a predicate in one step.
pub fn evaluate(source: &str, params: &Parameters) -> Result<bool, FormulaError> {
    Formula::parse(source)?.holds(params)
}

fn tokenize(source: &str) -> Result<Vec<Token>, FormulaError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => tokens.push(Token::Number(number(&mut chars)?)),
            '\'' | '"' => {
                chars.next();
                tokens.push(Token::Str(quoted(&mut chars, c)?));
            }
            '[' => {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some(']') => break,
                        Some(ch) => name.push(ch),
                        None => return Err(FormulaError::Syntax("unclosed '['".to_string())),
                    }
                }
                tokens.push(Token::Ident(name.trim().to_string()));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_alphanumeric() || ch == '_' {
                        word.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(match word.as_str() {
                    "true" => Token::True,
                    "false" => Token::False,
                    _ => Token::Ident(word),
                });
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            _ => {
                chars.next();
                let next = chars.peek().copied();
                let (token, pair) = match (c, next) {
                    ('|', Some('|')) => (Token::Binary(BinaryOp::Or), true),
                    ('&', Some('&')) => (Token::Binary(BinaryOp::And), true),
                    ('=', Some('=')) => (Token::Binary(BinaryOp::Eq), true),
                    ('!', Some('=')) => (Token::Binary(BinaryOp::Ne), true),
                    ('<', Some('=')) => (Token::Binary(BinaryOp::Le), true),
                    ('>', Some('=')) => (Token::Binary(BinaryOp::Ge), true),
                    ('*', Some('*')) => (Token::Binary(BinaryOp::Pow), true),
                    ('!', _) => (Token::Not, false),
                    ('<', _) => (Token::Binary(BinaryOp::Lt), false),
                    ('>', _) => (Token::Binary(BinaryOp::Gt), false),
                    ('+', _) => (Token::Binary(BinaryOp::Add), false),
                    ('-', _) => (Token::Binary(BinaryOp::Sub), false),
                    ('*', _) => (Token::Binary(BinaryOp::Mul), false),
                    ('/', _) => (Token::Binary(BinaryOp::Div), false),
                    ('%', _) => (Token::Binary(BinaryOp::Rem), false),
                    _ => return Err(FormulaError::Syntax(format!("unexpected character '{}'", c))),
                };
                if pair {
                    chars.next();
                }
                tokens.push(token);
            }
        }
    }
    Ok(tokens)
}

fn number(chars: &mut Peekable<Chars<'_>>) -> Result<f64, FormulaError> {
    let mut text = String::new();
    while let Some(&ch) = chars.peek() {
        let exponent_sign = (ch == '+' || ch == '-') && text.ends_with(|c: char| c == 'e' || c == 'E');
        if ch.is_ascii_digit() || ch == '.' || ch == 'e' || ch == 'E' || exponent_sign {
            text.push(ch);
            chars.next();
        } else {
            break;
        }
    }
    text.parse::<f64>()
        .map_err(|_| FormulaError::Syntax(format!("invalid number '{}'", text)))
}

fn quoted(chars: &mut Peekable<Chars<'_>>, quote: char) -> Result<String, FormulaError> {
    let mut text = String::new();
    loop {
        match chars.next() {
            Some('\\') => match chars.next() {
                Some(escaped) => text.push(escaped),
                None => break,
            },
            Some(ch) if ch == quote => return Ok(text),
            Some(ch) => text.push(ch),
            None => break,
        }
    }
    Err(FormulaError::Syntax("unterminated string".to_string()))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    /// Consume the next token if it is one of `ops`.
    fn take_op(&mut self, ops: &[BinaryOp]) -> Option<BinaryOp> {
        match self.peek() {
            Some(Token::Binary(op)) if ops.contains(op) => {
                let op = *op;
                self.pos += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn left_assoc(
        &mut self,
        ops: &[BinaryOp],
        operand: fn(&mut Self) -> Result<Expr, FormulaError>,
    ) -> Result<Expr, FormulaError> {
        let mut left = operand(self)?;
        while let Some(op) = self.take_op(ops) {
            let right = operand(self)?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn or(&mut self) -> Result<Expr, FormulaError> {
        self.left_assoc(&[BinaryOp::Or], Self::and)
    }

    fn and(&mut self) -> Result<Expr, FormulaError> {
        self.left_assoc(&[BinaryOp::And], Self::equality)
    }

    fn equality(&mut self) -> Result<Expr, FormulaError> {
        self.left_assoc(&[BinaryOp::Eq, BinaryOp::Ne], Self::comparison)
    }

    fn comparison(&mut self) -> Result<Expr, FormulaError> {
        self.left_assoc(
            &[BinaryOp::Lt, BinaryOp::Le, BinaryOp::Gt, BinaryOp::Ge],
            Self::additive,
        )
    }

    fn additive(&mut self) -> Result<Expr, FormulaError> {
        self.left_assoc(&[BinaryOp::Add, BinaryOp::Sub], Self::multiplicative)
    }

    fn multiplicative(&mut self) -> Result<Expr, FormulaError> {
        self.left_assoc(&[BinaryOp::Mul, BinaryOp::Div, BinaryOp::Rem], Self::unary)
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        match self.peek() {
            Some(Token::Binary(BinaryOp::Sub)) => {
                self.pos += 1;
                Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.unary()?)))
            }
            Some(Token::Not) => {
                self.pos += 1;
                Ok(Expr::Unary(UnaryOp::Not, Box::new(self.unary()?)))
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, FormulaError> {
        let base = self.primary()?;
        if self.take_op(&[BinaryOp::Pow]).is_some() {
            let exponent = self.unary()?;
            return Ok(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Literal(Value::Number(n))),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::Text(s))),
            Some(Token::True) => Ok(Expr::Literal(Value::Bool(true))),
            Some(Token::False) => Ok(Expr::Literal(Value::Bool(false))),
            Some(Token::Ident(name)) => Ok(Expr::Var(name)),
            Some(Token::LParen) => {
                let inner = self.or()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(FormulaError::Syntax("expected ')'".to_string())),
                }
            }
            Some(token) => Err(FormulaError::Syntax(format!("unexpected {:?}", token))),
            None => Err(FormulaError::Syntax("unexpected end of formula".to_string())),
        }
    }
}

fn eval(expr: &Expr, params: &Parameters) -> Result<Value, FormulaError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Var(name) => params
            .get(name)
            .cloned()
            .ok_or_else(|| FormulaError::UnknownVariable(name.clone())),
        Expr::Unary(op, operand) => match (op, eval(operand, params)?) {
            (UnaryOp::Neg, Value::Number(n)) => Ok(Value::Number(-n)),
            (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
            (UnaryOp::Neg, other) => Err(FormulaError::Operand {
                op: "-",
                operand: other.type_name(),
            }),
            (UnaryOp::Not, other) => Err(FormulaError::Operand {
                op: "!",
                operand: other.type_name(),
            }),
        },
        Expr::Binary(BinaryOp::And, left, right) => {
            if !truth(BinaryOp::And, eval(left, params)?)? {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(truth(BinaryOp::And, eval(right, params)?)?))
        }
        Expr::Binary(BinaryOp::Or, left, right) => {
            if truth(BinaryOp::Or, eval(left, params)?)? {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(truth(BinaryOp::Or, eval(right, params)?)?))
        }
        Expr::Binary(op, left, right) => binary(*op, eval(left, params)?, eval(right, params)?),
    }
}

fn truth(op: BinaryOp, value: Value) -> Result<bool, FormulaError> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(FormulaError::Operand {
            op: op.symbol(),
            operand: other.type_name(),
        }),
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, FormulaError> {
    use Value::{Bool, Number, Text};

    let result = match (op, &left, &right) {
        (BinaryOp::Eq, _, _) => Bool(left == right),
        (BinaryOp::Ne, _, _) => Bool(left != right),
        (BinaryOp::Add, Number(a), Number(b)) => Number(a + b),
        (BinaryOp::Add, Text(_), _) | (BinaryOp::Add, _, Text(_)) => {
            Text(format!("{}{}", left, right))
        }
        (BinaryOp::Sub, Number(a), Number(b)) => Number(a - b),
        (BinaryOp::Mul, Number(a), Number(b)) => Number(a * b),
        (BinaryOp::Div, Number(a), Number(b)) => Number(a / b),
        (BinaryOp::Rem, Number(a), Number(b)) => Number(a % b),
        (BinaryOp::Pow, Number(a), Number(b)) => Number(a.powf(*b)),
        (BinaryOp::Lt, Number(a), Number(b)) => Bool(a < b),
        (BinaryOp::Le, Number(a), Number(b)) => Bool(a <= b),
        (BinaryOp::Gt, Number(a), Number(b)) => Bool(a > b),
        (BinaryOp::Ge, Number(a), Number(b)) => Bool(a >= b),
        (BinaryOp::Lt, Text(a), Text(b)) => Bool(a < b),
        (BinaryOp::Le, Text(a), Text(b)) => Bool(a <= b),
        (BinaryOp::Gt, Text(a), Text(b)) => Bool(a > b),
        (BinaryOp::Ge, Text(a), Text(b)) => Bool(a >= b),
        _ => {
            return Err(FormulaError::Operands {
                op: op.symbol(),
                left: left.type_name(),
                right: right.type_name(),
            })
        }
    };
    Ok(result)
}
