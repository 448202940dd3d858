//! Single-scene clip rendering.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clipforge_models::{Clip, KillScene};
use clipforge_storage::{clip_key, CLIP_CONTENT_TYPE};
use tracing::{info, warn};

use super::{captions, AssemblyRequest, ClipAssembler};
use crate::error::{WorkerError, WorkerResult};

/// Source time range of one clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipWindow {
    pub start: f64,
    pub end: f64,
}

impl ClipWindow {
    /// `[max(0, t - pre), min(t + post, source_duration)]`
    pub fn around(timestamp: u32, source_duration: f64, pre_roll: u32, post_roll: u32) -> Self {
        let start = timestamp.saturating_sub(pre_roll) as f64;
        let nominal_end = timestamp as f64 + post_roll as f64;
        let end = if source_duration.is_finite() && source_duration > 0.0 {
            nominal_end.min(source_duration)
        } else {
            nominal_end
        };
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// `clip_{t}s_{unix_millis}.mp4`
pub fn clip_filename(timestamp: u32, created_at: DateTime<Utc>) -> String {
    format!("clip_{}s_{}.mp4", timestamp, created_at.timestamp_millis())
}

impl ClipAssembler {
    /// Render, upload and describe the clip for one scene. The scene's
    /// scratch directory is removed whatever the outcome.
    pub(super) async fn render_scene(
        &self,
        request: &AssemblyRequest<'_>,
        index: usize,
        scene: &KillScene,
    ) -> WorkerResult<Clip> {
        let scratch = request.workspace.scene_dir(index);
        tokio::fs::create_dir_all(&scratch).await?;

        let result = self.render_in(request, scene, &scratch).await;

        if let Err(e) = tokio::fs::remove_dir_all(&scratch).await {
            warn!(path = %scratch.display(), error = %e, "Failed to remove scene scratch dir");
        }
        result
    }

    async fn render_in(
        &self,
        request: &AssemblyRequest<'_>,
        scene: &KillScene,
        scratch: &Path,
    ) -> WorkerResult<Clip> {
        let window = ClipWindow::around(
            scene.timestamp,
            request.source_duration,
            self.options.pre_roll_secs,
            self.options.post_roll_secs,
        );
        if window.duration() <= 0.0 {
            return Err(WorkerError::validation(format!(
                "scene at {}s lies outside the video",
                scene.timestamp
            )));
        }

        let cut = scratch.join("cut.mp4");
        self.engine
            .cut(request.source, window.start, window.duration(), &cut)
            .await?;
        let mut current: PathBuf = cut;

        if request.config.caption_enabled {
            match captions::caption_clip(self, &current, scratch, window.duration()).await {
                Ok(Some(captioned)) => current = captioned,
                Ok(None) => {}
                Err(e) => warn!(
                    video_id = %request.video_id,
                    timestamp = scene.timestamp,
                    error = %e,
                    "Captioning failed, continuing without captions"
                ),
            }
        }

        if request.config.aspect_ratio.needs_reframe() {
            let reframed = scratch.join("reframed.mp4");
            self.engine
                .reframe(&current, request.config.aspect_ratio, &reframed)
                .await?;
            current = reframed;
        }

        let created_at = Utc::now();
        let filename = clip_filename(scene.timestamp, created_at);
        let key = clip_key(request.video_id, &filename);
        self.storage
            .put_file(&current, &key, CLIP_CONTENT_TYPE)
            .await?;

        info!(
            video_id = %request.video_id,
            timestamp = scene.timestamp,
            score = scene.score,
            kill_type = %scene.kill_type,
            key = %key,
            "Clip uploaded"
        );

        Ok(Clip::for_scene(
            request.video_id,
            scene,
            filename,
            key,
            created_at,
            self.options.ttl,
        ))
    }
}
