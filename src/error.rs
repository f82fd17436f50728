use thiserror::Error;

use crate::db::{EngineError, ErrorCategory};

/// Errors surfaced by the batch pipeline and the introspection calls.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The submitted batch trimmed down to nothing.
    #[error("Query cannot be empty")]
    EmptyInput,

    /// An error reported by SQLite, message kept verbatim.
    #[error("{0}")]
    Engine(EngineError),

    /// `describe_table` was asked about a table that does not exist.
    #[error("Table '{0}' not found")]
    TableNotFound(String),

    /// The blocking worker running a batch panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

impl RunnerError {
    /// Category of the underlying engine error, if this is one.
    pub fn category(&self) -> Option<&ErrorCategory> {
        match self {
            RunnerError::Engine(err) => Some(&err.category),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for RunnerError {
    fn from(err: rusqlite::Error) -> Self {
        RunnerError::Engine(EngineError::from_sqlite(&err))
    }
}
