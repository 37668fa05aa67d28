//! Setup failures reported before any simulation thread starts.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("{0}")]
    Usage(String),

    #[error("invalid {what}: {value:?}")]
    InvalidNumber { what: &'static str, value: String },

    #[error("cannot open input file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while reading input: {0}")]
    Io(#[from] std::io::Error),

    #[error("input ended before {what}")]
    MissingLine { what: String },

    #[error("malformed input line {line}: {content:?}")]
    MalformedLine { line: usize, content: String },

    #[error("driver count must not be negative (got {0})")]
    NegativeDriverCount(i64),

    #[error("driver count {count} exceeds the limit of {max}")]
    TooManyDrivers { count: usize, max: usize },
}

impl SetupError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            SetupError::Usage(_) | SetupError::InvalidNumber { .. } => 2,
            _ => 1,
        }
    }
}

pub type SetupResult<T> = Result<T, SetupError>;
