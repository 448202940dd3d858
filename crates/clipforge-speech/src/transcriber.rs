//! Speech-to-text seam.

use async_trait::async_trait;

use crate::error::SpeechResult;

/// Turns an audio track into plain text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// `filename` is only a hint for the service's format detection.
    async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> SpeechResult<String>;
}
