//! FFmpeg CLI wrapper and kill-highlight detection.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a timed runner
//! - ffprobe metadata with exact-rational frame rates
//! - The `MediaEngine` seam used by the worker (cut, reframe, captions, audio)
//! - Lazy fixed-cadence frame sampling
//! - Template-matching kill detection and scoring
//! - SRT caption synthesis

pub mod command;
pub mod detection;
pub mod engine;
pub mod error;
pub mod filters;
pub mod frames;
pub mod probe;
pub mod subtitles;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use detection::{
    BannerRegion, Checkpoint, FrameMatch, KillDetector, MatchThresholds, ScoringWeights,
    TemplateSet,
};
pub use engine::{FfmpegEngine, MediaEngine};
pub use error::{MediaError, MediaResult};
pub use filters::{caption_filter, reframe_filter, ReframePlan};
pub use frames::{FrameRef, FrameSampler};
pub use probe::{probe_video, FrameRate, VideoInfo};
pub use subtitles::transcript_to_srt;
