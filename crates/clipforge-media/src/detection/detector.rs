//! Debounced kill detection over a frame sequence.

use std::sync::Arc;

use clipforge_models::KillScene;
use image::RgbImage;
use tracing::{debug, info, warn};

use super::matcher::{best_match, BannerRegion, FrameMatch, MatchThresholds};
use super::scoring::ScoringWeights;
use super::templates::TemplateSet;
use crate::error::{MediaError, MediaResult};
use crate::frames::FrameSampler;

/// Frames within this many seconds of the last accepted kill are skipped.
pub const DEFAULT_DEBOUNCE_SECS: u32 = 3;

/// Frames between deadline checks.
pub const DEFAULT_CHECKPOINT_EVERY: usize = 10;

/// Cooperative cancellation hook polled between units of work.
///
/// Implementations return an error (typically [`MediaError::BudgetExceeded`]) to
/// abort the current operation.
pub trait Checkpoint: Send + Sync {
    fn check(&self, stage: &str) -> MediaResult<()>;
}

/// Template-matching kill detector.
#[derive(Debug, Clone)]
pub struct KillDetector {
    templates: Arc<TemplateSet>,
    thresholds: MatchThresholds,
    weights: ScoringWeights,
    region: BannerRegion,
    debounce_secs: u32,
    checkpoint_every: usize,
}

impl KillDetector {
    pub fn new(templates: TemplateSet) -> Self {
        Self {
            templates: Arc::new(templates),
            thresholds: MatchThresholds::default(),
            weights: ScoringWeights::default(),
            region: BannerRegion::default(),
            debounce_secs: DEFAULT_DEBOUNCE_SECS,
            checkpoint_every: DEFAULT_CHECKPOINT_EVERY,
        }
    }

    pub fn with_thresholds(mut self, thresholds: MatchThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_region(mut self, region: BannerRegion) -> Self {
        self.region = region;
        self
    }

    pub fn with_debounce_secs(mut self, secs: u32) -> Self {
        self.debounce_secs = secs;
        self
    }

    pub fn with_checkpoint_every(mut self, frames: usize) -> Self {
        self.checkpoint_every = frames.max(1);
        self
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    /// Classify a single decoded frame.
    pub fn classify(&self, frame: &RgbImage) -> Option<FrameMatch> {
        if self.templates.is_empty() || frame.width() == 0 || frame.height() == 0 {
            return None;
        }
        let crop = self.region.crop(frame);
        best_match(&crop, &self.templates, &self.thresholds)
    }

    /// Scan every frame the sampler yields and return scored kill scenes in
    /// timestamp order.
    ///
    /// `checkpoint` is polled before frame 0 and every `checkpoint_every`
    /// frames after. Frame files are removed once classified. A frame that
    /// cannot be extracted or decoded fails the scan.
    pub async fn detect(
        &self,
        sampler: &mut FrameSampler,
        checkpoint: Option<&dyn Checkpoint>,
    ) -> MediaResult<Vec<KillScene>> {
        let frame_count = sampler.frame_count();
        let mut scenes = Vec::new();

        if self.templates.is_empty() {
            warn!("No kill templates available, detection yields nothing");
            return Ok(scenes);
        }

        info!(frame_count, "Scanning frames for kill banners");
        let mut last_accepted: Option<u32> = None;

        loop {
            let position = sampler.position();
            if position < frame_count && position % self.checkpoint_every == 0 {
                if let Some(checkpoint) = checkpoint {
                    checkpoint.check("detection")?;
                }
            }

            let Some(frame) = sampler.next_frame().await else {
                break;
            };
            let frame = frame?;

            let debounced = last_accepted
                .is_some_and(|last| frame.timestamp.saturating_sub(last) < self.debounce_secs);
            if debounced {
                let _ = tokio::fs::remove_file(&frame.path).await;
                continue;
            }

            let detector = self.clone();
            let path = frame.path.clone();
            let classified = tokio::task::spawn_blocking(move || -> MediaResult<Option<FrameMatch>> {
                let image = image::open(&path)?.to_rgb8();
                Ok(detector.classify(&image))
            })
            .await
            .map_err(|e| MediaError::internal(format!("frame classification task failed: {}", e)))?;

            let _ = tokio::fs::remove_file(&frame.path).await;
            let matched = classified?;

            if let Some(m) = matched {
                let score = self.weights.score(m.kill_type, frame.index, frame_count);
                debug!(
                    timestamp = frame.timestamp,
                    kill_type = %m.kill_type,
                    confidence = m.confidence,
                    score,
                    "Kill detected"
                );
                scenes.push(KillScene {
                    timestamp: frame.timestamp,
                    score,
                    kill_type: m.kill_type,
                    confidence: m.confidence,
                });
                last_accepted = Some(frame.timestamp);
            }
        }

        info!(detected = scenes.len(), "Kill detection complete");
        Ok(scenes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MediaEngine;
    use crate::frames::test_support::SyntheticEngine;
    use clipforge_models::KillType;
    use image::Rgb;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TRIPLE: [u8; 3] = [250, 30, 30];
    const DOUBLE: [u8; 3] = [30, 250, 30];
    const SINGLE: [u8; 3] = [30, 30, 250];

    fn templates() -> TemplateSet {
        TemplateSet::empty()
            .with_template(KillType::Triple, RgbImage::from_pixel(300, 100, Rgb(TRIPLE)))
            .with_template(KillType::Double, RgbImage::from_pixel(300, 100, Rgb(DOUBLE)))
            .with_template(KillType::Single, RgbImage::from_pixel(300, 100, Rgb(SINGLE)))
    }

    /// 1000x500 black frame with the banner region (650, 25, 300x100) filled.
    fn frame_with_banner(color: Option<[u8; 3]>) -> RgbImage {
        let mut img = RgbImage::new(1000, 500);
        if let Some(color) = color {
            for y in 25..125 {
                for x in 650..950 {
                    img.put_pixel(x, y, Rgb(color));
                }
            }
        }
        img
    }

    async fn sampler_for(
        duration: f64,
        dir: &std::path::Path,
        render: impl Fn(u32) -> Option<[u8; 3]> + Send + Sync + 'static,
    ) -> FrameSampler {
        let engine: Arc<dyn MediaEngine> = Arc::new(SyntheticEngine {
            duration,
            render: Box::new(move |t| frame_with_banner(render(t))),
        });
        FrameSampler::open(engine, "game.mp4", dir, 1).await.unwrap()
    }

    struct CountingCheckpoint(AtomicUsize);

    impl Checkpoint for CountingCheckpoint {
        fn check(&self, _stage: &str) -> MediaResult<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct ExpiredCheckpoint;

    impl Checkpoint for ExpiredCheckpoint {
        fn check(&self, _stage: &str) -> MediaResult<()> {
            Err(MediaError::BudgetExceeded { budget_secs: 50 })
        }
    }

    #[test]
    fn test_black_frame_does_not_match() {
        let detector = KillDetector::new(templates());
        assert!(detector.classify(&frame_with_banner(None)).is_none());
    }

    #[test]
    fn test_banner_classified_by_colour() {
        let detector = KillDetector::new(templates());
        let m = detector.classify(&frame_with_banner(Some(DOUBLE))).unwrap();
        assert_eq!(m.kill_type, KillType::Double);
        assert!(m.confidence > 0.99);
    }

    #[tokio::test]
    async fn test_single_triple_kill_scene() {
        let dir = tempfile::tempdir().unwrap();
        let mut sampler = sampler_for(70.0, dir.path(), |t| (t == 40).then_some(TRIPLE)).await;
        let checkpoint = CountingCheckpoint(AtomicUsize::new(0));

        let scenes = KillDetector::new(templates())
            .detect(&mut sampler, Some(&checkpoint))
            .await
            .unwrap();

        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].timestamp, 40);
        assert_eq!(scenes[0].kill_type, KillType::Triple);
        assert_eq!(scenes[0].score, 90);
        // frames 0, 10, .., 60
        assert_eq!(checkpoint.0.load(Ordering::SeqCst), 7);
        // classified frames are cleaned up
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_debounce_keeps_three_second_spacing() {
        let dir = tempfile::tempdir().unwrap();
        // banner visible on every frame from 10s to 19s
        let mut sampler =
            sampler_for(30.0, dir.path(), |t| (10..20).contains(&t).then_some(SINGLE)).await;

        let scenes = KillDetector::new(templates())
            .detect(&mut sampler, None)
            .await
            .unwrap();

        let timestamps: Vec<u32> = scenes.iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![10, 13, 16, 19]);
        assert!(timestamps.windows(2).all(|w| w[1] - w[0] >= 3));
        assert!(scenes.iter().all(|s| s.kill_type == KillType::Single && s.score == 10));
    }

    #[tokio::test]
    async fn test_end_bonus_applies_late_in_video() {
        let dir = tempfile::tempdir().unwrap();
        let mut sampler = sampler_for(10.0, dir.path(), |t| (t == 9).then_some(DOUBLE)).await;

        let scenes = KillDetector::new(templates())
            .detect(&mut sampler, None)
            .await
            .unwrap();
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].score, 80);
    }

    #[tokio::test]
    async fn test_missing_tier_degrades_to_remaining_templates() {
        let dir = tempfile::tempdir().unwrap();
        let mut sampler = sampler_for(20.0, dir.path(), |t| match t {
            5 => Some(TRIPLE),
            12 => Some(SINGLE),
            _ => None,
        })
        .await;

        let only_single = TemplateSet::empty()
            .with_template(KillType::Single, RgbImage::from_pixel(300, 100, Rgb(SINGLE)));
        let scenes = KillDetector::new(only_single)
            .detect(&mut sampler, None)
            .await
            .unwrap();

        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].timestamp, 12);
        assert_eq!(scenes[0].kill_type, KillType::Single);
    }

    #[tokio::test]
    async fn test_no_templates_yields_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut sampler = sampler_for(20.0, dir.path(), |_| Some(TRIPLE)).await;
        let scenes = KillDetector::new(TemplateSet::empty())
            .detect(&mut sampler, None)
            .await
            .unwrap();
        assert!(scenes.is_empty());
    }

    #[tokio::test]
    async fn test_expired_checkpoint_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let mut sampler = sampler_for(20.0, dir.path(), |_| None).await;
        let result = KillDetector::new(templates())
            .detect(&mut sampler, Some(&ExpiredCheckpoint))
            .await;
        assert!(matches!(result, Err(MediaError::BudgetExceeded { budget_secs: 50 })));
    }
}
