use std::path::PathBuf;

use sea_orm::DbErr;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The database file or its directory could not be created or opened.
    #[error("Storage unavailable at {}: {message}", path.display())]
    Unavailable { path: PathBuf, message: String },

    /// Applying the schema failed.
    #[error("Schema error: {0}")]
    Schema(#[source] DbErr),

    /// A read or write statement failed.
    #[error("Query error: {0}")]
    Query(#[from] DbErr),

    /// A stored timestamp did not parse back. This is a data-integrity problem.
    #[error("Invalid timestamp {value:?} in {context}: {message}")]
    Encoding {
        context: String,
        value: String,
        message: String,
    },

    /// The group name cannot be mapped to a database path.
    #[error("Invalid group name {0:?}")]
    InvalidGroup(String),
}

impl StorageError {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Unavailable {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
