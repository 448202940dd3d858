//! Structured job lifecycle events.

use std::time::Duration;

use clipforge_db::DbResult;
use clipforge_models::{JobConfig, JobResult, VideoId};
use tracing::{error, info, warn, Span};

use crate::error::WorkerError;

/// Emits one event per job stage with consistent `video_id` / `user_id` fields.
#[derive(Debug, Clone)]
pub struct JobLogger {
    video_id: String,
    user_id: String,
}

impl JobLogger {
    pub fn new(video_id: &VideoId, user_id: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            user_id: user_id.to_string(),
        }
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// Span covering the whole run.
    pub fn span(&self) -> Span {
        tracing::info_span!("job", video_id = %self.video_id, user_id = %self.user_id)
    }

    pub fn started(&self, config: &JobConfig) {
        info!(
            video_id = %self.video_id,
            user_id = %self.user_id,
            filter_mode = %config.filter_mode,
            caption_enabled = config.caption_enabled,
            aspect_ratio = %config.aspect_ratio,
            "Job started"
        );
    }

    pub fn stage(&self, stage: &str, elapsed: Duration, detail: &str) {
        info!(
            video_id = %self.video_id,
            stage,
            elapsed_ms = elapsed.as_millis() as u64,
            "{}",
            detail
        );
    }

    pub fn warning(&self, message: &str) {
        warn!(video_id = %self.video_id, "{}", message);
    }

    pub fn failed(&self, err: &WorkerError) {
        error!(
            video_id = %self.video_id,
            user_id = %self.user_id,
            kind = err.kind(),
            retryable = err.is_retryable(),
            "Job failed: {}",
            err
        );
    }

    pub fn rollback(&self, outcome: &DbResult<bool>) {
        match outcome {
            Ok(true) => info!(video_id = %self.video_id, "Status rolled back to uploaded"),
            Ok(false) => {}
            Err(e) => error!(video_id = %self.video_id, "Rollback failed: {}", e),
        }
    }

    pub fn completed(&self, result: &JobResult, elapsed: Duration) {
        info!(
            video_id = %self.video_id,
            user_id = %self.user_id,
            detected = result.total_detected,
            selected = result.selected,
            generated = result.generated,
            credits = result.credits_charged,
            elapsed_ms = elapsed.as_millis() as u64,
            "Job completed"
        );
    }
}
