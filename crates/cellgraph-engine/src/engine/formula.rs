//! Validated, immutable infix formulas.
//!
//! A [`Formula`] is built from text by tokenizing it and checking the token
//! sequence against the grammar: numbers and variables alternate with binary
//! operators, parentheses nest and balance. The parsed form keeps both the
//! token list and a canonical whitespace-free string; reparsing the canonical
//! string yields an equal formula.
//!
//! Two formulas are equal when their token sequences match position by
//! position, with numeric tokens compared by value (`2.0` equals `2.000`) and
//! every other token compared as text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

use super::cell_name::NameRules;
use super::eval::{self, EvalFault};
use super::tokenizer::{Operator, TokenKind, tokenize};

/// Reasons a formula string is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormulaFormatError {
    #[error("formula cannot be empty")]
    Empty,

    #[error("invalid token `{0}`: expected a number, variable, operator or parenthesis")]
    InvalidToken(String),

    #[error("variable `{0}` is not a valid cell name")]
    InvalidVariable(String),

    #[error("formula cannot begin with `{0}`; it must begin with a number, variable or `(`")]
    InvalidStart(String),

    #[error("formula cannot end with `{0}`; it must end with a number, variable or `)`")]
    InvalidEnd(String),

    #[error("`)` at token {position} has no matching `(`")]
    UnmatchedClose { position: usize },

    #[error("expected a number, variable or `(` after `{after}`, found `{found}`")]
    ExpectedOperand { after: String, found: String },

    #[error("expected an operator or `)` after `{after}`, found `{found}`")]
    ExpectedOperator { after: String, found: String },

    #[error("unbalanced parentheses: {open} opening, {close} closing")]
    Unbalanced { open: usize, close: usize },
}

/// An evaluation problem, stored as a cell value rather than raised.
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
#[error("{reason}")]
pub struct FormulaError {
    reason: String,
}

impl FormulaError {
    pub fn new(reason: impl Into<String>) -> FormulaError {
        FormulaError {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl From<EvalFault> for FormulaError {
    fn from(fault: EvalFault) -> Self {
        let reason = match fault {
            EvalFault::UndefinedVariable(name) => {
                format!("#VALUE! cannot find a numeric value for {name}")
            }
            EvalFault::DivideByZero => "#DIV/0! cannot divide by zero".to_string(),
            EvalFault::EmptyExpression => "#ERROR! cannot evaluate an empty expression".to_string(),
            EvalFault::Malformed => "#ERROR! cannot evaluate expression".to_string(),
        };
        FormulaError::new(reason)
    }
}

/// A validated formula token.
#[derive(Clone, Debug)]
pub enum Token {
    LeftParen,
    RightParen,
    Operator(Operator),
    /// Numeric literal; `text` is the literal as written, `value` its parse.
    Number { text: String, value: f64 },
    Variable(String),
}

impl Token {
    fn push_text(&self, out: &mut String) {
        match self {
            Token::LeftParen => out.push('('),
            Token::RightParen => out.push(')'),
            Token::Operator(op) => out.push(op.symbol()),
            Token::Number { text, .. } => out.push_str(text),
            Token::Variable(name) => out.push_str(name),
        }
    }

    fn is_operand(&self) -> bool {
        matches!(self, Token::Number { .. } | Token::Variable(_))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut text = String::new();
        self.push_text(&mut text);
        f.write_str(&text)
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Token::LeftParen, Token::LeftParen) | (Token::RightParen, Token::RightParen) => true,
            (Token::Operator(a), Token::Operator(b)) => a == b,
            (Token::Number { value: a, .. }, Token::Number { value: b, .. }) => a == b,
            (Token::Variable(a), Token::Variable(b)) => a == b,
            _ => false,
        }
    }
}

// Number tokens never hold NaN: the tokenizer only produces digit literals.
impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Token::Operator(op) => op.hash(state),
            // +0.0 == -0.0, so they must hash alike.
            Token::Number { value, .. } => (value + 0.0).to_bits().hash(state),
            Token::Variable(name) => name.hash(state),
            Token::LeftParen | Token::RightParen => {}
        }
    }
}

/// A syntactically valid formula.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Formula {
    tokens: Vec<Token>,
    canonical: String,
}

impl Formula {
    /// Parse formula text, keeping variable names exactly as written.
    pub fn parse(text: &str) -> Result<Formula, FormulaFormatError> {
        Self::build(text, |name| Ok(name.to_string()))
    }

    /// Parse formula text, normalizing every variable with `rules` and rejecting
    /// variables that are not cell names under them.
    pub fn parse_with_rules(text: &str, rules: &NameRules) -> Result<Formula, FormulaFormatError> {
        Self::build(text, |name| {
            rules
                .resolve(name)
                .ok_or_else(|| FormulaFormatError::InvalidVariable(name.to_string()))
        })
    }

    fn build<F>(text: &str, mut variable: F) -> Result<Formula, FormulaFormatError>
    where
        F: FnMut(&str) -> Result<String, FormulaFormatError>,
    {
        if text.trim().is_empty() {
            return Err(FormulaFormatError::Empty);
        }

        let mut tokens = Vec::new();
        for raw in tokenize(text) {
            let token = match raw.kind {
                TokenKind::LeftParen => Token::LeftParen,
                TokenKind::RightParen => Token::RightParen,
                TokenKind::Operator(op) => Token::Operator(op),
                TokenKind::Variable => Token::Variable(variable(raw.text)?),
                TokenKind::Number => {
                    let value = raw
                        .text
                        .parse::<f64>()
                        .map_err(|_| FormulaFormatError::InvalidToken(raw.text.to_string()))?;
                    Token::Number {
                        text: raw.text.to_string(),
                        value,
                    }
                }
                TokenKind::Invalid => {
                    return Err(FormulaFormatError::InvalidToken(raw.text.to_string()));
                }
            };
            tokens.push(token);
        }

        let canonical = validate(&tokens)?;
        Ok(Formula { tokens, canonical })
    }

    /// Distinct variables in first-occurrence order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        let mut seen: Vec<&str> = Vec::new();
        for token in &self.tokens {
            if let Token::Variable(name) = token
                && !seen.contains(&name.as_str())
            {
                seen.push(name.as_str());
            }
        }
        seen.into_iter()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Whitespace-free text that reparses to an equal formula.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Evaluate with `lookup` resolving variables to numbers.
    ///
    /// Lookup misses, division by zero and any other evaluation fault come back
    /// as a [`FormulaError`] value.
    pub fn evaluate<F>(&self, lookup: F) -> Result<f64, FormulaError>
    where
        F: Fn(&str) -> Option<f64>,
    {
        eval::evaluate(&self.tokens, lookup).map_err(FormulaError::from)
    }
}

/// Check the grammar and build the canonical string.
fn validate(tokens: &[Token]) -> Result<String, FormulaFormatError> {
    let Some(last_index) = tokens.len().checked_sub(1) else {
        return Err(FormulaFormatError::Empty);
    };

    let mut canonical = String::new();
    let mut open = 0usize;
    let mut close = 0usize;
    let mut previous: Option<&Token> = None;

    for (i, token) in tokens.iter().enumerate() {
        if i == 0 && !(token.is_operand() || matches!(token, Token::LeftParen)) {
            return Err(FormulaFormatError::InvalidStart(token.to_string()));
        }
        if i == last_index && !(token.is_operand() || matches!(token, Token::RightParen)) {
            return Err(FormulaFormatError::InvalidEnd(token.to_string()));
        }

        match token {
            Token::LeftParen => open += 1,
            Token::RightParen => close += 1,
            _ => {}
        }
        if close > open {
            return Err(FormulaFormatError::UnmatchedClose { position: i + 1 });
        }

        if let Some(prev) = previous {
            let expects_operand = matches!(prev, Token::LeftParen | Token::Operator(_));
            if expects_operand && !(token.is_operand() || matches!(token, Token::LeftParen)) {
                return Err(FormulaFormatError::ExpectedOperand {
                    after: prev.to_string(),
                    found: token.to_string(),
                });
            }
            if !expects_operand && !matches!(token, Token::RightParen | Token::Operator(_)) {
                return Err(FormulaFormatError::ExpectedOperator {
                    after: prev.to_string(),
                    found: token.to_string(),
                });
            }
        }

        token.push_text(&mut canonical);
        previous = Some(token);
    }

    if open != close {
        return Err(FormulaFormatError::Unbalanced { open, close });
    }

    Ok(canonical)
}

impl PartialEq for Formula {
    fn eq(&self, other: &Self) -> bool {
        self.tokens == other.tokens
    }
}

impl Eq for Formula {}

impl Hash for Formula {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tokens.hash(state);
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl FromStr for Formula {
    type Err = FormulaFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Formula::parse(s)
    }
}

impl TryFrom<String> for Formula {
    type Error = FormulaFormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Formula::parse(&value)
    }
}

impl From<Formula> for String {
    fn from(formula: Formula) -> Self {
        formula.canonical
    }
}
