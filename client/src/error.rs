//! Errors raised while loading a board-definition file. Descriptor errors
//! per the error-handling taxonomy: fatal at load, the board does not
//! start.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardFileError {
    #[error("line {line}: unknown command {command:?}")]
    UnknownCommand { line: usize, command: String },
    #[error("line {line}: missing field {field:?}")]
    MissingField { line: usize, field: String },
    #[error("line {line}: invalid value {value:?} for field {field:?}")]
    InvalidValue { line: usize, field: String, value: String },
    #[error("line {line}: {source}")]
    Board {
        line: usize,
        #[source]
        source: pinball_engine::BoardError,
    },
    #[error("{0}")]
    Io(#[from] std::io::Error),
}
