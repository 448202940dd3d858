//! Heuristic highlight scoring.

use clipforge_models::KillType;

/// Additive score weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub base: u32,
    pub triple_bonus: u32,
    pub double_bonus: u32,
    pub clutch_bonus: u32,
    pub single_bonus: u32,
    /// Added when the frame lies in the trailing part of the video
    pub end_bonus: u32,
    /// Frames with `index > frame_count * end_fraction` get `end_bonus`
    pub end_fraction: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            base: 10,
            triple_bonus: 80,
            double_bonus: 50,
            clutch_bonus: 40,
            single_bonus: 0,
            end_bonus: 20,
            end_fraction: 0.8,
        }
    }
}

impl ScoringWeights {
    pub fn type_bonus(&self, kind: KillType) -> u32 {
        match kind {
            KillType::Triple => self.triple_bonus,
            KillType::Double => self.double_bonus,
            KillType::Clutch => self.clutch_bonus,
            KillType::Single => self.single_bonus,
            KillType::None => 0,
        }
    }

    pub fn score(&self, kind: KillType, frame_index: usize, frame_count: usize) -> u32 {
        let late = frame_index as f64 > frame_count as f64 * self.end_fraction;
        let end = if late { self.end_bonus } else { 0 };
        self.base.saturating_add(self.type_bonus(kind)).saturating_add(end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scores() {
        let w = ScoringWeights::default();
        assert_eq!(w.score(KillType::Single, 0, 100), 10);
        assert_eq!(w.score(KillType::Double, 10, 100), 60);
        assert_eq!(w.score(KillType::Triple, 10, 100), 90);
        assert_eq!(w.score(KillType::Clutch, 10, 100), 50);
    }

    #[test]
    fn test_end_bonus_is_strictly_after_boundary() {
        let w = ScoringWeights::default();
        assert_eq!(w.score(KillType::Single, 80, 100), 10);
        assert_eq!(w.score(KillType::Single, 81, 100), 30);
        assert_eq!(w.score(KillType::Triple, 99, 100), 110);
    }

    #[test]
    fn test_oversized_weights_saturate() {
        let w = ScoringWeights {
            base: u32::MAX - 5,
            triple_bonus: 80,
            end_bonus: 20,
            ..ScoringWeights::default()
        };
        assert_eq!(w.score(KillType::Triple, 99, 100), u32::MAX);
        assert_eq!(w.score(KillType::None, 0, 100), u32::MAX - 5);
    }
}
