//! Video records and their processing lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ParseError;
use crate::job::JobConfig;

/// Extension used when an upload's filename carries none.
pub const DEFAULT_SOURCE_EXTENSION: &str = "mp4";

/// Unique identifier for an uploaded video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Generate a new random video ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Video lifecycle status.
///
/// `uploaded -> processing -> completed`, with `processing -> uploaded`
/// as the rollback edge on any failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    /// Stored and waiting for a processing request
    #[default]
    Uploaded,
    /// A job currently owns the video
    Processing,
    /// Clips generated and credits settled
    Completed,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Uploaded => "uploaded",
            VideoStatus::Processing => "processing",
            VideoStatus::Completed => "completed",
        }
    }

    /// Only freshly uploaded (or rolled back) videos may start a job.
    pub fn accepts_submission(&self) -> bool {
        matches!(self, VideoStatus::Uploaded)
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VideoStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploaded" => Ok(VideoStatus::Uploaded),
            "processing" => Ok(VideoStatus::Processing),
            "completed" => Ok(VideoStatus::Completed),
            _ => Err(ParseError::new("video status", s)),
        }
    }
}

/// An uploaded source video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    /// Unique video ID
    pub id: VideoId,

    /// Owning user
    pub user_id: String,

    /// Original upload filename
    pub filename: String,

    /// Probed source duration in whole seconds (0 until a job completes)
    #[serde(default)]
    pub duration_secs: u32,

    #[serde(default)]
    pub status: VideoStatus,

    /// Options of the most recent processing request
    #[serde(flatten)]
    pub config: JobConfig,

    /// Credits debited by the completed job
    #[serde(default)]
    pub credits_charged: u32,

    pub created_at: DateTime<Utc>,
}

impl Video {
    /// A freshly uploaded video with default processing options.
    pub fn new_upload(id: VideoId, user_id: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            id,
            user_id: user_id.into(),
            filename: filename.into(),
            duration_secs: 0,
            status: VideoStatus::Uploaded,
            config: JobConfig::default(),
            credits_charged: 0,
            created_at: Utc::now(),
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// File extension of the stored source object.
    pub fn source_extension(&self) -> String {
        source_extension(&self.filename)
    }
}

/// Lowercased alphanumeric extension of `filename`, or `mp4` when absent.
pub fn source_extension(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.trim().to_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| DEFAULT_SOURCE_EXTENSION.to_string())
}
