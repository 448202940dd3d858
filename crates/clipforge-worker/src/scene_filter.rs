//! Score-threshold scene filtering.

use clipforge_models::{FilterMode, KillScene};

/// Minimum score per filter mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterThresholds {
    pub all: u32,
    pub medium: u32,
    pub highlight: u32,
}

impl Default for FilterThresholds {
    fn default() -> Self {
        Self {
            all: 10,
            medium: 50,
            highlight: 80,
        }
    }
}

impl FilterThresholds {
    pub fn min_score(&self, mode: FilterMode) -> u32 {
        match mode {
            FilterMode::All => self.all,
            FilterMode::Medium => self.medium,
            FilterMode::Highlight => self.highlight,
        }
    }
}

/// Scenes scoring at least the mode's threshold, in their original order.
pub fn filter_scenes(
    scenes: &[KillScene],
    mode: FilterMode,
    thresholds: &FilterThresholds,
) -> Vec<KillScene> {
    let min = thresholds.min_score(mode);
    scenes.iter().filter(|s| s.score >= min).cloned().collect()
}
