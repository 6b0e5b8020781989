//! Error types for cellgraph core.

use thiserror::Error;

use cellgraph_engine::engine::{CycleError, FormulaFormatError};

/// Errors a spreadsheet operation can report.
///
/// Evaluation problems are not here: they are stored as the cell's value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SheetError {
    #[error("invalid cell name `{0}`")]
    InvalidName(String),

    #[error("invalid formula: {0}")]
    FormulaFormat(FormulaFormatError),

    #[error("setting {cell} would create a {cycle}")]
    Circular {
        cell: String,
        cycle: CycleError,
    },

    #[error("read/write error: {0}")]
    ReadWrite(String),
}

impl SheetError {
    pub(crate) fn read_write(cause: impl std::fmt::Display) -> SheetError {
        SheetError::ReadWrite(cause.to_string())
    }

    pub(crate) fn circular(cell: &str, cycle: CycleError) -> SheetError {
        SheetError::Circular {
            cell: cell.to_string(),
            cycle,
        }
    }

    /// The cycle path for a [`SheetError::Circular`].
    pub fn cycle_path(&self) -> Option<&[String]> {
        match self {
            SheetError::Circular { cycle, .. } => Some(&cycle.path),
            _ => None,
        }
    }
}

impl From<FormulaFormatError> for SheetError {
    fn from(err: FormulaFormatError) -> Self {
        SheetError::FormulaFormat(err)
    }
}

impl From<std::io::Error> for SheetError {
    fn from(err: std::io::Error) -> Self {
        SheetError::read_write(err)
    }
}

pub type Result<T> = std::result::Result<T, SheetError>;
