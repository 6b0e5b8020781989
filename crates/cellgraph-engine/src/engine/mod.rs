//! Spreadsheet engine API.
//!
//! This module provides the computation core for the spreadsheet:
//!
//! - [`tokenize`] - Split formula text into classified tokens
//! - [`Formula`] - Parse, validate, compare and evaluate infix formulas
//! - [`NameRules`] - Cell name validation and normalization
//! - [`DependencyGraph`] - Dependents/dependees between cell names
//! - [`recalc_order`] - Recalculation order with cycle detection
//! - [`Cell`], [`CellContents`], [`CellValue`] - Cell storage types

mod cell;
mod cell_name;
mod cycle;
mod deps;
mod eval;
mod formula;
mod tokenizer;

pub use cell::{Cell, CellContents, CellValue};
pub use cell_name::NameRules;
pub use cycle::{CycleError, recalc_order};
pub use deps::{DependencyGraph, NodeId};
pub use formula::{Formula, FormulaError, FormulaFormatError, Token};
pub use tokenizer::{Operator, RawToken, TokenKind, Tokens, is_variable, tokenize};
