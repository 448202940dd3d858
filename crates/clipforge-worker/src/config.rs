//! Worker configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clipforge_media::{MatchThresholds, ScoringWeights};

use crate::scene_filter::FilterThresholds;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Parent directory of per-job `clipforge-{video_id}` workspaces
    pub work_dir: PathBuf,
    /// Wall-clock budget of one job
    pub job_budget: Duration,
    /// Sampled frames between budget checkpoints during detection
    pub checkpoint_frames: usize,
    /// Seconds between sampled frames
    pub sample_interval_secs: u32,
    /// Directory holding `triple_kill.png`, `double_kill.png`, `kill.png`
    pub template_dir: PathBuf,
    /// Longest source video accepted
    pub max_duration_secs: f64,
    /// Seconds kept before a kill
    pub clip_pre_roll_secs: u32,
    /// Seconds kept after a kill
    pub clip_post_roll_secs: u32,
    /// Clip lifetime before the sweeper purges it
    pub clip_ttl: Duration,
    /// Per-invocation FFmpeg timeout
    pub ffmpeg_timeout: Duration,
    /// Workspaces older than this are swept as orphans
    pub orphan_max_age: Duration,
    /// Videos `processing` for longer than this are returned to `uploaded`
    pub stale_job_after: Duration,
    pub sweep_interval: Duration,
    pub scoring: ScoringWeights,
    pub thresholds: MatchThresholds,
    pub filter: FilterThresholds,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir(),
            job_budget: Duration::from_secs(50),
            checkpoint_frames: 10,
            sample_interval_secs: 1,
            template_dir: PathBuf::from("assets/templates"),
            max_duration_secs: 14_400.0,
            clip_pre_roll_secs: 10,
            clip_post_roll_secs: 5,
            clip_ttl: Duration::from_secs(600),
            ffmpeg_timeout: Duration::from_secs(120),
            orphan_max_age: Duration::from_secs(3600),
            stale_job_after: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(60),
            scoring: ScoringWeights::default(),
            thresholds: MatchThresholds::default(),
            filter: FilterThresholds::default(),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_secs(name: &str, default: Duration) -> Duration {
    Duration::from_secs(env_or(name, default.as_secs()))
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let d = Self::default();
        let s = d.scoring;
        let t = d.thresholds;
        let f = d.filter;

        Self {
            work_dir: std::env::var("CLIPFORGE_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(d.work_dir),
            job_budget: env_secs("CLIPFORGE_JOB_BUDGET_SECS", d.job_budget),
            checkpoint_frames: env_or("CLIPFORGE_CHECKPOINT_FRAMES", d.checkpoint_frames).max(1),
            sample_interval_secs: env_or("CLIPFORGE_SAMPLE_INTERVAL_SECS", d.sample_interval_secs).max(1),
            template_dir: std::env::var("CLIPFORGE_TEMPLATE_DIR")
                .map(PathBuf::from)
                .unwrap_or(d.template_dir),
            max_duration_secs: env_or("CLIPFORGE_MAX_DURATION_SECS", d.max_duration_secs),
            clip_pre_roll_secs: env_or("CLIPFORGE_CLIP_PRE_ROLL_SECS", d.clip_pre_roll_secs),
            clip_post_roll_secs: env_or("CLIPFORGE_CLIP_POST_ROLL_SECS", d.clip_post_roll_secs),
            clip_ttl: env_secs("CLIPFORGE_CLIP_TTL_SECS", d.clip_ttl),
            ffmpeg_timeout: env_secs("CLIPFORGE_FFMPEG_TIMEOUT_SECS", d.ffmpeg_timeout),
            orphan_max_age: env_secs("CLIPFORGE_ORPHAN_MAX_AGE_SECS", d.orphan_max_age),
            stale_job_after: env_secs("CLIPFORGE_STALE_JOB_SECS", d.stale_job_after),
            sweep_interval: env_secs("CLIPFORGE_SWEEP_INTERVAL_SECS", d.sweep_interval),
            scoring: ScoringWeights {
                base: env_or("CLIPFORGE_SCORE_BASE", s.base),
                triple_bonus: env_or("CLIPFORGE_SCORE_TRIPLE", s.triple_bonus),
                double_bonus: env_or("CLIPFORGE_SCORE_DOUBLE", s.double_bonus),
                clutch_bonus: env_or("CLIPFORGE_SCORE_CLUTCH", s.clutch_bonus),
                single_bonus: env_or("CLIPFORGE_SCORE_SINGLE", s.single_bonus),
                end_bonus: env_or("CLIPFORGE_SCORE_END_BONUS", s.end_bonus),
                end_fraction: env_or("CLIPFORGE_SCORE_END_FRACTION", s.end_fraction),
            },
            thresholds: MatchThresholds {
                triple: env_or("CLIPFORGE_MATCH_TRIPLE", t.triple),
                double: env_or("CLIPFORGE_MATCH_DOUBLE", t.double),
                single: env_or("CLIPFORGE_MATCH_SINGLE", t.single),
            },
            filter: FilterThresholds {
                all: env_or("CLIPFORGE_FILTER_ALL", f.all),
                medium: env_or("CLIPFORGE_FILTER_MEDIUM", f.medium),
                highlight: env_or("CLIPFORGE_FILTER_HIGHLIGHT", f.highlight),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.job_budget, Duration::from_secs(50));
        assert_eq!(config.checkpoint_frames, 10);
        assert_eq!(config.clip_ttl, Duration::from_secs(600));
        assert_eq!(config.filter.highlight, 80);
        assert_eq!(config.scoring.triple_bonus, 80);
        assert_eq!(config.thresholds.single, 0.80);
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        std::env::set_var("CLIPFORGE_TEST_ENV_OR", "not-a-number");
        assert_eq!(env_or("CLIPFORGE_TEST_ENV_OR", 7u32), 7);
        std::env::set_var("CLIPFORGE_TEST_ENV_OR", " 12 ");
        assert_eq!(env_or("CLIPFORGE_TEST_ENV_OR", 7u32), 12);
        std::env::remove_var("CLIPFORGE_TEST_ENV_OR");
    }
}
