//! Speech client error types.

use thiserror::Error;

pub type SpeechResult<T> = Result<T, SpeechError>;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Speech service not configured: {0}")]
    NotConfigured(String),

    #[error("Speech service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Empty audio payload")]
    EmptyAudio,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl SpeechError {
    pub fn is_retryable(&self) -> bool {
        match self {
            SpeechError::ServiceUnavailable(_) => true,
            SpeechError::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}
