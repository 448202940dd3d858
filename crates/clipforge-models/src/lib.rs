//! Shared data models for the ClipForge highlight pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Videos and their processing lifecycle
//! - Job configuration (filter mode, captions, aspect ratio)
//! - Kill scenes produced by the detector
//! - Generated clips and their expiry
//! - Credit accounts and duration-based credit arithmetic

pub mod clip;
pub mod credits;
pub mod error;
pub mod job;
pub mod scene;
pub mod style;
pub mod video;

// Re-export common types
pub use clip::{Clip, ClipSummary};
pub use credits::{credits_for_duration, CreditAccount};
pub use error::ParseError;
pub use job::{FilterMode, JobConfig, JobResult};
pub use scene::{KillScene, KillType};
pub use style::AspectRatio;
pub use video::{source_extension, Video, VideoId, VideoStatus};
