//! Storage errors.

use std::fmt;

use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

/// Object store call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Put,
    Get,
    Delete,
    Presign,
    Probe,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Put => "put",
            Operation::Get => "get",
            Operation::Delete => "delete",
            Operation::Presign => "presign",
            Operation::Probe => "connectivity probe",
        })
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage not configured: {0}")]
    Config(String),

    #[error("no object at {0}")]
    NotFound(String),

    #[error("{op} failed for {key}: {message}")]
    Request {
        op: Operation,
        key: String,
        message: String,
    },

    #[error("local file error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound(key.into())
    }

    pub fn request(op: Operation, key: impl Into<String>, err: impl fmt::Display) -> Self {
        Self::Request {
            op,
            key: key.into(),
            message: err.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
