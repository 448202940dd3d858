//! Job configuration and results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::clip::ClipSummary;
use crate::error::ParseError;
use crate::style::AspectRatio;
use crate::video::VideoId;

/// Caller-selected strictness for which detected scenes become clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    #[default]
    All,
    Medium,
    Highlight,
}

impl FilterMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::All => "all",
            FilterMode::Medium => "medium",
            FilterMode::Highlight => "highlight",
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(FilterMode::All),
            "medium" => Ok(FilterMode::Medium),
            "highlight" => Ok(FilterMode::Highlight),
            _ => Err(ParseError::new("filter mode", s)),
        }
    }
}

/// Per-run processing options, persisted with the `processing` transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct JobConfig {
    #[serde(default)]
    pub filter_mode: FilterMode,
    /// Burn speech-to-text captions into each clip
    #[serde(default, alias = "subtitle_enabled")]
    pub caption_enabled: bool,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
}

/// Outcome of a successful job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub video_id: VideoId,
    /// Scenes emitted by the detector
    pub total_detected: usize,
    /// Scenes that survived the filter
    pub selected: usize,
    /// Clips actually generated and persisted
    pub generated: usize,
    pub credits_charged: u32,
    pub clips: Vec<ClipSummary>,
}

impl JobResult {
    /// True when at least one selected scene failed to produce a clip.
    pub fn is_partial(&self) -> bool {
        self.generated < self.selected
    }
}
