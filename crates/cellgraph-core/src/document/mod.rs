//! Spreadsheet state and logic (UI-agnostic).

mod io;
mod ops;
mod state;

pub use io::FILE_EXTENSION;
pub use state::{DEFAULT_VERSION, Spreadsheet};
