//! Whisper HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::error::{SpeechError, SpeechResult};
use crate::transcriber::Transcriber;

/// Configuration for the Whisper client.
#[derive(Debug, Clone)]
pub struct WhisperConfig {
    /// OpenAI-compatible API root, without a trailing slash
    pub base_url: String,
    /// Bearer token; captioning is disabled without one
    pub api_key: Option<String>,
    pub model: String,
    pub language: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key: None,
            model: "whisper-large-v3".to_string(),
            language: "ja".to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 2,
        }
    }
}

impl WhisperConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("WHISPER_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            api_key: std::env::var("GROQ_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            model: std::env::var("WHISPER_MODEL").unwrap_or(defaults.model),
            language: std::env::var("WHISPER_LANGUAGE").unwrap_or(defaults.language),
            timeout: std::env::var("WHISPER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_retries: defaults.max_retries,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Client for an OpenAI-compatible `/audio/transcriptions` endpoint.
pub struct WhisperClient {
    http: Client,
    config: WhisperConfig,
}

impl WhisperClient {
    pub fn new(config: WhisperConfig) -> SpeechResult<Self> {
        if config.api_key.is_none() {
            return Err(SpeechError::NotConfigured("GROQ_API_KEY not set".to_string()));
        }
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(SpeechError::Network)?;

        Ok(Self { http, config })
    }

    /// `None` when no API key is configured.
    pub fn from_env() -> SpeechResult<Option<Self>> {
        let config = WhisperConfig::from_env();
        if !config.is_configured() {
            return Ok(None);
        }
        Self::new(config).map(Some)
    }

    fn form(&self, audio: Vec<u8>, filename: &str) -> SpeechResult<Form> {
        let part = Part::bytes(audio)
            .file_name(filename.to_string())
            .mime_str("audio/mpeg")?;
        Ok(Form::new()
            .part("file", part)
            .text("model", self.config.model.clone())
            .text("language", self.config.language.clone())
            .text("response_format", "text"))
    }

    async fn send_once(&self, audio: Vec<u8>, filename: &str) -> SpeechResult<String> {
        let url = format!("{}/audio/transcriptions", self.config.base_url);
        let api_key = self.config.api_key.as_deref().unwrap_or_default();

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .multipart(self.form(audio, filename)?)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.text().await?.trim().to_string());
        }

        let body = response.text().await.unwrap_or_default();
        let message = format!("transcription service returned {}: {}", status, truncate(&body, 512));
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            Err(SpeechError::ServiceUnavailable(message))
        } else {
            Err(SpeechError::RequestFailed(message))
        }
    }
}

#[async_trait]
impl Transcriber for WhisperClient {
    async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> SpeechResult<String> {
        if audio.is_empty() {
            return Err(SpeechError::EmptyAudio);
        }
        debug!(bytes = audio.len(), filename, "Sending transcription request");

        let mut attempt = 0;
        loop {
            match self.send_once(audio.clone(), filename).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "Transcription failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
