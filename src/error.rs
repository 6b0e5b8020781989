//! Error types for the cellgraph command line

use thiserror::Error;

/// Errors in the command-line arguments
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CliError {
    #[error("{flag} requires a value")]
    MissingValue { flag: String },

    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Unexpected argument: {0}")]
    UnexpectedArgument(String),

    #[error("Expected NAME=CONTENT, got `{0}`")]
    InvalidAssignment(String),
}
