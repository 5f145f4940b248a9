//! Index error type.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the content index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A column name was not part of the table definition.
    #[error("unknown column '{column}' for table {table}")]
    UnknownColumn { table: &'static str, column: String },

    /// A stored value could not be decoded.
    #[error("corrupt value in {table}.{column}: {value}")]
    CorruptValue {
        table: &'static str,
        column: &'static str,
        value: String,
    },

    /// An I/O error occurred.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;
