//! Periodic purge of expired clips and orphaned workspaces, plus recovery of
//! jobs whose process died mid-run.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clipforge_db::Database;
use clipforge_storage::ObjectStore;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::workspace::sweep_orphaned;

/// Expired clips fetched per pass.
const SWEEP_BATCH: u32 = 500;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub clips_deleted: usize,
    pub clips_failed: usize,
    pub workspaces_removed: usize,
    pub jobs_reset: u64,
}

pub struct Sweeper {
    db: Database,
    storage: Arc<dyn ObjectStore>,
    config: Arc<WorkerConfig>,
}

impl Sweeper {
    pub fn new(db: Database, storage: Arc<dyn ObjectStore>, config: Arc<WorkerConfig>) -> Self {
        Self { db, storage, config }
    }

    /// Run forever; spawn as a background task.
    pub async fn run(&self) {
        info!("Starting sweeper (interval: {:?})", self.config.sweep_interval);
        let mut ticker = interval(self.config.sweep_interval.max(Duration::from_secs(1)));

        loop {
            ticker.tick().await;
            if let Err(e) = self.run_once().await {
                error!("Sweep error: {}", e);
            }
        }
    }

    /// One pass: expired clips (object first, then row), stale workspaces, then
    /// videos stuck in `processing`.
    pub async fn run_once(&self) -> WorkerResult<SweepReport> {
        let mut report = SweepReport::default();
        let clips = self.db.clips();

        for clip in clips.list_expired(Utc::now(), SWEEP_BATCH).await? {
            if let Err(e) = self.storage.delete(&clip.storage_key).await {
                warn!(clip_id = %clip.id, key = %clip.storage_key, error = %e, "Failed to delete expired clip object");
                report.clips_failed += 1;
                continue;
            }
            clips.delete(&clip.id).await?;
            report.clips_deleted += 1;
        }

        report.workspaces_removed =
            match sweep_orphaned(&self.config.work_dir, self.config.orphan_max_age).await {
                Ok(n) => n,
                Err(e) => {
                    warn!(error = %e, "Orphaned workspace sweep failed");
                    0
                }
            };

        let stale_after = chrono::Duration::from_std(self.config.stale_job_after)
            .unwrap_or_else(|_| chrono::Duration::days(365));
        let cutoff = Utc::now() - stale_after;
        report.jobs_reset = self.db.videos().reset_stale_processing(cutoff).await?;

        if report != SweepReport::default() {
            metrics::counter!("clipforge_sweeper_clips_deleted_total")
                .increment(report.clips_deleted as u64);
            metrics::counter!("clipforge_sweeper_workspaces_removed_total")
                .increment(report.workspaces_removed as u64);
            metrics::counter!("clipforge_sweeper_jobs_reset_total").increment(report.jobs_reset);
            info!(
                clips_deleted = report.clips_deleted,
                clips_failed = report.clips_failed,
                workspaces_removed = report.workspaces_removed,
                jobs_reset = report.jobs_reset,
                "Sweep finished"
            );
        }
        Ok(report)
    }
}
