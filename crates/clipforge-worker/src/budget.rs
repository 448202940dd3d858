//! Wall-clock budget with cooperative checkpoints.
//!
//! The budget is only observed at checkpoints, so a run can overshoot it by
//! one unit of in-flight work (a frame extraction, an encode).

use std::time::{Duration, Instant};

use clipforge_media::{Checkpoint, MediaError, MediaResult};
use tracing::warn;

use crate::error::{WorkerError, WorkerResult};

#[derive(Debug, Clone)]
pub struct JobBudget {
    started: Instant,
    limit: Duration,
}

impl JobBudget {
    /// Start the clock now.
    pub fn start(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.elapsed())
    }

    pub fn is_exhausted(&self) -> bool {
        self.elapsed() > self.limit
    }

    /// Fail with [`WorkerError::Timeout`] once the budget is spent.
    pub fn checkpoint(&self, stage: &str) -> WorkerResult<()> {
        if self.is_exhausted() {
            warn!(
                stage,
                elapsed_ms = self.elapsed().as_millis() as u64,
                budget_secs = self.limit.as_secs(),
                "Job budget exceeded"
            );
            return Err(WorkerError::Timeout {
                budget_secs: self.limit.as_secs(),
            });
        }
        Ok(())
    }
}

impl Checkpoint for JobBudget {
    fn check(&self, stage: &str) -> MediaResult<()> {
        self.checkpoint(stage)
            .map_err(|_| MediaError::BudgetExceeded {
                budget_secs: self.limit.as_secs(),
            })
    }
}
