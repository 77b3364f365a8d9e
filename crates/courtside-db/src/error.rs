//! Error types for database operations.

use thiserror::Error;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Native DB error.
    #[error("Database error: {0}")]
    Database(String),

    /// Record not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate key.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Rejected input.
    #[error("Invalid input: {0}")]
    Invalid(String),

    /// Engine error.
    #[error("Core error: {0}")]
    Core(#[from] courtside_core::Error),
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<native_db::db_type::Error> for Error {
    fn from(err: native_db::db_type::Error) -> Self {
        match err {
            err @ native_db::db_type::Error::DuplicateKey { .. } => Error::DuplicateKey(err.to_string()),
            other => Error::Database(other.to_string()),
        }
    }
}

impl From<Error> for courtside_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Core(inner) => inner,
            other => courtside_core::Error::Storage(other.to_string()),
        }
    }
}
