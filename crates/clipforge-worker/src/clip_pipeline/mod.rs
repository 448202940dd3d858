//! Clip assembly: cut, caption, reframe and upload each selected scene.

use std::path::Path;
use std::sync::Arc;

use clipforge_media::MediaEngine;
use clipforge_models::{Clip, JobConfig, KillScene, VideoId};
use clipforge_speech::Transcriber;
use clipforge_storage::ObjectStore;
use tracing::{info, warn};

use crate::config::WorkerConfig;
use crate::workspace::JobWorkspace;

mod captions;
pub mod clip;

pub use clip::{clip_filename, ClipWindow};

/// Timing and retention of generated clips.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyOptions {
    pub pre_roll_secs: u32,
    pub post_roll_secs: u32,
    pub ttl: chrono::Duration,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            pre_roll_secs: 10,
            post_roll_secs: 5,
            ttl: chrono::Duration::minutes(10),
        }
    }
}

impl AssemblyOptions {
    pub fn from_config(config: &WorkerConfig) -> Self {
        Self {
            pre_roll_secs: config.clip_pre_roll_secs,
            post_roll_secs: config.clip_post_roll_secs,
            ttl: chrono::Duration::from_std(config.clip_ttl)
                .unwrap_or_else(|_| chrono::Duration::minutes(10)),
        }
    }
}

/// Inputs shared by every scene of one job.
#[derive(Clone, Copy)]
pub struct AssemblyRequest<'a> {
    pub video_id: &'a VideoId,
    pub source: &'a Path,
    pub source_duration: f64,
    pub config: &'a JobConfig,
    pub workspace: &'a JobWorkspace,
}

#[derive(Debug, Clone)]
pub struct SceneFailure {
    pub timestamp: u32,
    pub error: String,
}

/// Outcome of assembling a job's selected scenes.
#[derive(Debug, Default)]
pub struct AssemblyReport {
    pub selected: usize,
    pub clips: Vec<Clip>,
    pub failures: Vec<SceneFailure>,
}

impl AssemblyReport {
    pub fn generated(&self) -> usize {
        self.clips.len()
    }
}

pub struct ClipAssembler {
    engine: Arc<dyn MediaEngine>,
    storage: Arc<dyn ObjectStore>,
    transcriber: Option<Arc<dyn Transcriber>>,
    options: AssemblyOptions,
}

impl ClipAssembler {
    pub fn new(
        engine: Arc<dyn MediaEngine>,
        storage: Arc<dyn ObjectStore>,
        transcriber: Option<Arc<dyn Transcriber>>,
        options: AssemblyOptions,
    ) -> Self {
        Self {
            engine,
            storage,
            transcriber,
            options,
        }
    }

    /// Process scenes one at a time in order. A failing scene is logged and
    /// skipped; the rest still run.
    pub async fn assemble(&self, request: &AssemblyRequest<'_>, scenes: &[KillScene]) -> AssemblyReport {
        let mut report = AssemblyReport {
            selected: scenes.len(),
            ..AssemblyReport::default()
        };

        for (index, scene) in scenes.iter().enumerate() {
            info!(
                video_id = %request.video_id,
                timestamp = scene.timestamp,
                "[{}/{}] Generating clip",
                index + 1,
                scenes.len()
            );

            match self.render_scene(request, index, scene).await {
                Ok(clip) => {
                    metrics::counter!("clipforge_clips_generated_total").increment(1);
                    report.clips.push(clip);
                }
                Err(e) => {
                    metrics::counter!("clipforge_clips_failed_total").increment(1);
                    warn!(
                        video_id = %request.video_id,
                        timestamp = scene.timestamp,
                        error = %e,
                        "Clip generation failed, skipping scene"
                    );
                    report.failures.push(SceneFailure {
                        timestamp: scene.timestamp,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            video_id = %request.video_id,
            selected = report.selected,
            generated = report.generated(),
            "Clip assembly finished"
        );
        report
    }

    /// Best-effort removal of already uploaded clip objects.
    pub async fn discard(&self, clips: &[Clip]) {
        for clip in clips {
            if let Err(e) = self.storage.delete(&clip.storage_key).await {
                warn!(key = %clip.storage_key, error = %e, "Failed to delete orphaned clip object");
            }
        }
    }
}
