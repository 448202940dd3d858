//! Heuristic kill-banner detection.
//!
//! Each sampled frame is cropped to the region where kill banners render,
//! compared against reference templates, classified and scored:
//!
//! | Stage | Module |
//! |-------|--------|
//! | Template assets | `templates` |
//! | Crop + similarity | `matcher` |
//! | Score | `scoring` |
//! | Debounced scan over a `FrameSampler` | `detector` |
//!
//! Similarity is whole-crop pixel RMSE, not sliding-window correlation, so
//! camera motion or UI scaling can cause misses and false matches.

pub mod detector;
pub mod matcher;
pub mod scoring;
pub mod templates;

pub use detector::{Checkpoint, KillDetector, DEFAULT_CHECKPOINT_EVERY, DEFAULT_DEBOUNCE_SECS};
pub use matcher::{BannerRegion, FrameMatch, MatchThresholds};
pub use scoring::ScoringWeights;
pub use templates::TemplateSet;
