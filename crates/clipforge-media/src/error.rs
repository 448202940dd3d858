//! Media errors.

use std::path::PathBuf;

use thiserror::Error;

pub type MediaResult<T> = Result<T, MediaError>;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0} not found in PATH")]
    ToolMissing(&'static str),

    /// Non-zero exit. `stderr` holds the tail of the tool's output.
    #[error("{tool} failed: {message}")]
    ToolFailed {
        tool: &'static str,
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    /// A single invocation ran past the runner's timeout and was killed.
    #[error("{tool} killed after {secs}s")]
    ToolTimeout { tool: &'static str, secs: u64 },

    /// A cooperative checkpoint observed the job deadline.
    #[error("job budget of {budget_secs}s exceeded")]
    BudgetExceeded { budget_secs: u64 },

    #[error("unparseable frame rate {0:?}")]
    InvalidFrameRate(String),

    #[error("no such file: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("invalid video: {0}")]
    InvalidVideo(String),

    #[error("frame decode failed: {0}")]
    Decode(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("ffprobe output: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("image: {0}")]
    Image(#[from] image::ImageError),

    #[error("{0}")]
    Internal(String),
}

impl MediaError {
    pub fn invalid_video(message: impl Into<String>) -> Self {
        Self::InvalidVideo(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// The source itself is unusable, as opposed to a tooling or host failure.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            MediaError::InvalidVideo(_)
                | MediaError::InvalidFrameRate(_)
                | MediaError::Decode(_)
                | MediaError::ToolFailed { tool: "ffprobe", .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_failures_count_as_bad_input() {
        let probe = MediaError::ToolFailed {
            tool: "ffprobe",
            message: "moov atom not found".into(),
            stderr: None,
            exit_code: Some(1),
        };
        assert!(probe.is_invalid_input());

        let encode = MediaError::ToolFailed {
            tool: "ffmpeg",
            message: "encoder crashed".into(),
            stderr: None,
            exit_code: Some(1),
        };
        assert!(!encode.is_invalid_input());
        assert!(!MediaError::ToolTimeout { tool: "ffmpeg", secs: 120 }.is_invalid_input());
    }
}
