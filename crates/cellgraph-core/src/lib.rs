//! cellgraph-core - UI-agnostic spreadsheet container + XML storage.

pub mod document;
pub mod error;
pub mod storage;

pub use document::{DEFAULT_VERSION, FILE_EXTENSION, Spreadsheet};
pub use error::{Result, SheetError};

pub use cellgraph_engine::engine::{CellContents, CellValue, Formula, NameRules};
