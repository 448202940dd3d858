//! Database error types.

use thiserror::Error;

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database configuration error: {0}")]
    Config(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    /// A guarded write matched no row.
    #[error("Write precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Insufficient credits: required {required}, balance {balance}")]
    InsufficientCredits { required: u32, balance: u32 },

    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    #[error("SQL error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

impl DbError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn precondition_failed(msg: impl Into<String>) -> Self {
        Self::PreconditionFailed(msg.into())
    }

    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Pool exhaustion and I/O failures may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DbError::Sqlx(sqlx::Error::PoolTimedOut) | DbError::Sqlx(sqlx::Error::Io(_))
        )
    }
}
