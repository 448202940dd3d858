//! Kill-highlight job worker.
//!
//! This crate provides:
//! - The job orchestrator and its status state machine
//! - Wall-clock budget with cooperative checkpoints
//! - Scene filtering and credit settlement
//! - Clip assembly (cut, captions, reframe, upload)
//! - Background sweeping of expired clips and orphaned workspaces

pub mod budget;
pub mod clip_pipeline;
pub mod config;
pub mod credits;
pub mod error;
pub mod logging;
pub mod processor;
pub mod scene_filter;
pub mod sweeper;
pub mod workspace;

pub use budget::JobBudget;
pub use clip_pipeline::{AssemblyOptions, AssemblyReport, ClipAssembler};
pub use config::WorkerConfig;
pub use credits::{required_units, CreditLedger};
pub use error::{WorkerError, WorkerResult};
pub use logging::JobLogger;
pub use processor::{JobOrchestrator, ProcessingContext};
pub use scene_filter::{filter_scenes, FilterThresholds};
pub use sweeper::{SweepReport, Sweeper};
pub use workspace::{sweep_orphaned, JobWorkspace};
