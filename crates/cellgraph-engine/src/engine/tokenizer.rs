//! Formula tokenizer.
//!
//! Splits formula text (without the leading `=`) into a lazy sequence of
//! classified tokens: parentheses, the four arithmetic operators, variables
//! (`[letters]+[digits]+`), non-negative numeric literals, and any other run of
//! characters that matches none of those (reported as [`TokenKind::Invalid`]).
//! Whitespace separates tokens and is never returned.
//!
//! # Examples
//!
//! ```ignore
//! let kinds: Vec<_> = tokenize("(a1 + 2.5e3)").map(|t| t.kind).collect();
//! assert_eq!(kinds.len(), 5);
//! ```

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// One of the four binary arithmetic operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '*',
            Operator::Div => '/',
        }
    }

    fn from_symbol(s: &str) -> Option<Operator> {
        match s {
            "+" => Some(Operator::Add),
            "-" => Some(Operator::Sub),
            "*" => Some(Operator::Mul),
            "/" => Some(Operator::Div),
            _ => None,
        }
    }

    pub(crate) fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Operator::Add => lhs + rhs,
            Operator::Sub => lhs - rhs,
            Operator::Mul => lhs * rhs,
            Operator::Div => lhs / rhs,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Classification of a raw token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    LeftParen,
    RightParen,
    Operator(Operator),
    Variable,
    Number,
    /// Text that matches none of the other patterns.
    Invalid,
}

/// A token borrowed from the formula text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawToken<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

/// Lazy token iterator over a formula string.
///
/// The iterator is cheap to clone; clone it before consuming (or call
/// [`tokenize`] again) to walk the same text twice.
#[derive(Clone, Debug)]
pub struct Tokens<'a> {
    src: &'a str,
    pos: usize,
}

/// Tokenize formula text.
pub fn tokenize(src: &str) -> Tokens<'_> {
    Tokens { src, pos: 0 }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = RawToken<'a>;

    fn next(&mut self) -> Option<RawToken<'a>> {
        loop {
            if self.pos >= self.src.len() {
                return None;
            }

            let Some(caps) = token_re().captures_at(self.src, self.pos) else {
                // Nothing recognisable until the end of input.
                let text = self.src[self.pos..].trim();
                self.pos = self.src.len();
                return Some(RawToken {
                    kind: TokenKind::Invalid,
                    text,
                });
            };

            let whole = caps.get(0)?;
            if whole.start() > self.pos {
                // Unmatched run before the next recognised token. It can't hold
                // whitespace: whitespace would have matched first.
                let text = self.src[self.pos..whole.start()].trim();
                self.pos = whole.start();
                return Some(RawToken {
                    kind: TokenKind::Invalid,
                    text,
                });
            }

            self.pos = whole.end();
            let text = whole.as_str();
            let kind = if caps.name("ws").is_some() {
                continue;
            } else if caps.name("lp").is_some() {
                TokenKind::LeftParen
            } else if caps.name("rp").is_some() {
                TokenKind::RightParen
            } else if let Some(op) = caps.name("op").and_then(|m| Operator::from_symbol(m.as_str())) {
                TokenKind::Operator(op)
            } else if caps.name("var").is_some() {
                TokenKind::Variable
            } else {
                TokenKind::Number
            };
            return Some(RawToken { kind, text });
        }
    }
}

fn token_re() -> &'static Regex {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    TOKEN_RE.get_or_init(|| {
        Regex::new(
            r"(?P<lp>\()|(?P<rp>\))|(?P<op>[+\-*/])|(?P<var>[a-zA-Z]+[0-9]+)|(?P<num>(?:[0-9]+\.[0-9]*|[0-9]*\.[0-9]+|[0-9]+)(?:e[+\-]?[0-9]+)?)|(?P<ws>\s+)",
        )
        .expect("formula token regex must compile")
    })
}

fn variable_re() -> &'static Regex {
    static VARIABLE_RE: OnceLock<Regex> = OnceLock::new();
    VARIABLE_RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z]+[0-9]+$").expect("variable regex must compile")
    })
}

/// Whether `s` is exactly one variable token (one or more ASCII letters
/// followed by one or more digits).
pub fn is_variable(s: &str) -> bool {
    variable_re().is_match(s)
}
