//! Worker error types.

use clipforge_db::DbError;
use clipforge_media::MediaError;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    /// Unreadable, oversized or zero-duration input
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Requester does not own the video
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Video already processing or completed
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Insufficient credits: required {required}, balance {balance}")]
    InsufficientCredits { required: u32, balance: u32 },

    #[error("Job exceeded its {budget_secs}s budget")]
    Timeout { budget_secs: u64 },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Media error: {0}")]
    Media(MediaError),

    #[error("Storage error: {0}")]
    Storage(#[from] clipforge_storage::StorageError),

    #[error("Database error: {0}")]
    Db(DbError),

    #[error("Speech error: {0}")]
    Speech(#[from] clipforge_speech::SpeechError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MediaError> for WorkerError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::BudgetExceeded { budget_secs } => WorkerError::Timeout { budget_secs },
            MediaError::InvalidVideo(msg) => WorkerError::Validation(msg),
            e if e.is_invalid_input() => WorkerError::Validation("unreadable video file".to_string()),
            e => WorkerError::Media(e),
        }
    }
}

impl From<DbError> for WorkerError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::InsufficientCredits { required, balance } => {
                WorkerError::InsufficientCredits { required, balance }
            }
            DbError::NotFound(what) => WorkerError::NotFound(what),
            DbError::PreconditionFailed(msg) => WorkerError::Conflict(msg),
            e => WorkerError::Db(e),
        }
    }
}

impl WorkerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether resubmitting (once the video is back in `uploaded`) may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            WorkerError::Validation(_)
                | WorkerError::Unauthorized(_)
                | WorkerError::Conflict(_)
                | WorkerError::NotFound(_)
        )
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerError::Validation(_) => "validation",
            WorkerError::Unauthorized(_) => "unauthorized",
            WorkerError::NotFound(_) => "not_found",
            WorkerError::Conflict(_) => "conflict",
            WorkerError::InsufficientCredits { .. } => "insufficient_credits",
            WorkerError::Timeout { .. } => "timeout",
            _ => "internal",
        }
    }

    /// Caller-facing text. Lower-layer diagnostics never appear here.
    pub fn public_message(&self) -> String {
        match self {
            WorkerError::Validation(msg) => format!("Invalid video: {}", msg),
            WorkerError::Unauthorized(_) => "You do not have access to this video".to_string(),
            WorkerError::NotFound(_) => "Video not found".to_string(),
            WorkerError::Conflict(_) => "Video is already processing or has been processed".to_string(),
            WorkerError::InsufficientCredits { required, balance } => format!(
                "Insufficient credits: {} required, {} available",
                required, balance
            ),
            WorkerError::Timeout { .. } => {
                "Processing timed out; the video may be too long".to_string()
            }
            _ => "Video processing failed".to_string(),
        }
    }
}
