//! Cell data structures.
//!
//! - [`CellContents`] - what the user entered (text, number, or formula)
//! - [`CellValue`] - what the cell currently shows
//! - [`Cell`] - both together

use std::fmt;

use super::formula::{Formula, FormulaError};

/// The content stored in a cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellContents {
    Text(String),
    Number(f64),
    Formula(Formula),
}

impl CellContents {
    /// Empty (or whitespace-only) text is the absent state.
    pub fn is_empty(&self) -> bool {
        matches!(self, CellContents::Text(s) if s.trim().is_empty())
    }

    /// The string that, entered into a cell, reproduces these contents.
    pub fn to_input_string(&self) -> String {
        match self {
            CellContents::Text(s) => s.clone(),
            CellContents::Number(n) => n.to_string(),
            CellContents::Formula(f) => format!("={f}"),
        }
    }
}

impl Default for CellContents {
    fn default() -> Self {
        CellContents::Text(String::new())
    }
}

impl fmt::Display for CellContents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_input_string())
    }
}

/// The displayed value of a cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Error(FormulaError),
}

impl CellValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Text(String::new())
    }
}

impl From<Result<f64, FormulaError>> for CellValue {
    fn from(result: Result<f64, FormulaError>) -> Self {
        match result {
            Ok(n) => CellValue::Number(n),
            Err(e) => CellValue::Error(e),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Error(e) => write!(f, "{e}"),
        }
    }
}

/// A non-empty cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub contents: CellContents,
    pub value: CellValue,
}

impl Cell {
    pub fn new_text(text: &str) -> Cell {
        Cell {
            contents: CellContents::Text(text.to_string()),
            value: CellValue::Text(text.to_string()),
        }
    }

    pub fn new_number(n: f64) -> Cell {
        Cell {
            contents: CellContents::Number(n),
            value: CellValue::Number(n),
        }
    }

    /// A formula cell with an already computed value.
    pub fn new_formula(formula: Formula, value: CellValue) -> Cell {
        Cell {
            contents: CellContents::Formula(formula),
            value,
        }
    }

    pub fn formula(&self) -> Option<&Formula> {
        match &self.contents {
            CellContents::Formula(f) => Some(f),
            _ => None,
        }
    }
}
