//! Banner crop and template similarity.

use clipforge_models::KillType;
use image::imageops::{self, FilterType};
use image::RgbImage;

use super::templates::TemplateSet;

/// Frame region where kill banners render, as integer percentages of the
/// frame size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BannerRegion {
    pub left_pct: u32,
    pub top_pct: u32,
    pub width_pct: u32,
    pub height_pct: u32,
}

impl Default for BannerRegion {
    /// Upper-right area: 65% from the left, 5% from the top, 30% x 20%.
    fn default() -> Self {
        Self {
            left_pct: 65,
            top_pct: 5,
            width_pct: 30,
            height_pct: 20,
        }
    }
}

impl BannerRegion {
    /// Pixel rectangle `(x, y, width, height)` for a frame of the given size.
    ///
    /// Offsets and sizes are floored; width and height are at least 1 and the
    /// rectangle never extends past the frame.
    pub fn crop_rect(&self, frame_width: u32, frame_height: u32) -> (u32, u32, u32, u32) {
        let pct = |total: u32, p: u32| (total as u64 * p as u64 / 100) as u32;

        let x = pct(frame_width, self.left_pct).min(frame_width.saturating_sub(1));
        let y = pct(frame_height, self.top_pct).min(frame_height.saturating_sub(1));
        let w = pct(frame_width, self.width_pct)
            .max(1)
            .min(frame_width.saturating_sub(x).max(1));
        let h = pct(frame_height, self.height_pct)
            .max(1)
            .min(frame_height.saturating_sub(y).max(1));
        (x, y, w, h)
    }

    /// Copy the banner region out of a frame.
    pub fn crop(&self, frame: &RgbImage) -> RgbImage {
        let (x, y, w, h) = self.crop_rect(frame.width(), frame.height());
        imageops::crop_imm(frame, x, y, w, h).to_image()
    }
}

/// Minimum confidence each tier must reach to count as a match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchThresholds {
    pub triple: f64,
    pub double: f64,
    pub single: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            triple: 0.75,
            double: 0.75,
            single: 0.80,
        }
    }
}

impl MatchThresholds {
    pub fn for_kind(&self, kind: KillType) -> Option<f64> {
        match kind {
            KillType::Triple => Some(self.triple),
            KillType::Double => Some(self.double),
            KillType::Single => Some(self.single),
            KillType::Clutch | KillType::None => None,
        }
    }
}

/// Winning tier for a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMatch {
    pub kill_type: KillType,
    pub confidence: f64,
}

/// Similarity in `[0, 1]` between a banner crop and a template:
/// `1 - sqrt(mse) / 255` over RGB channels, after resizing the crop to the
/// template's dimensions.
pub fn similarity(crop: &RgbImage, template: &RgbImage) -> f64 {
    if template.width() == 0 || template.height() == 0 || crop.width() == 0 || crop.height() == 0 {
        return 0.0;
    }

    let resized;
    let crop = if crop.dimensions() == template.dimensions() {
        crop
    } else {
        resized = imageops::resize(crop, template.width(), template.height(), FilterType::Triangle);
        &resized
    };

    let a = crop.as_raw();
    let b = template.as_raw();
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let sum_sq: f64 = a
        .iter()
        .zip(b)
        .map(|(&p, &q)| {
            let d = p as f64 - q as f64;
            d * d
        })
        .sum();
    let mse = sum_sq / a.len() as f64;

    (1.0 - mse.sqrt() / 255.0).clamp(0.0, 1.0)
}

/// Evaluate every available tier and keep the most confident one that clears
/// its threshold. Equal confidences go to the higher tier.
pub fn best_match(
    crop: &RgbImage,
    templates: &TemplateSet,
    thresholds: &MatchThresholds,
) -> Option<FrameMatch> {
    let mut best: Option<FrameMatch> = None;

    for (kind, template) in templates.iter() {
        let Some(threshold) = thresholds.for_kind(kind) else {
            continue;
        };
        let confidence = similarity(crop, template);
        if confidence < threshold {
            continue;
        }

        let better = match best {
            None => true,
            Some(current) => {
                confidence > current.confidence
                    || (confidence == current.confidence && kind.tier() > current.kill_type.tier())
            }
        };
        if better {
            best = Some(FrameMatch {
                kill_type: kind,
                confidence,
            });
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid(w: u32, h: u32, rgb: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb(rgb))
    }

    #[test]
    fn test_crop_rect_for_1080p() {
        let (x, y, w, h) = BannerRegion::default().crop_rect(1920, 1080);
        assert_eq!((x, y, w, h), (1248, 54, 576, 216));
    }

    #[test]
    fn test_crop_rect_tiny_frame_has_positive_size() {
        let (x, y, w, h) = BannerRegion::default().crop_rect(2, 2);
        assert!(w >= 1 && h >= 1);
        assert!(x + w <= 2 && y + h <= 2);
    }

    #[test]
    fn test_similarity_identical_and_opposite() {
        let white = solid(10, 4, [255, 255, 255]);
        let black = solid(10, 4, [0, 0, 0]);
        assert!((similarity(&white, &white) - 1.0).abs() < 1e-9);
        assert!(similarity(&white, &black).abs() < 1e-9);
    }

    #[test]
    fn test_similarity_resizes_crop_to_template() {
        let crop = solid(40, 16, [120, 10, 10]);
        let template = solid(10, 4, [120, 10, 10]);
        assert!(similarity(&crop, &template) > 0.99);
    }

    #[test]
    fn test_best_match_prefers_confidence_then_tier() {
        let crop = solid(10, 4, [100, 100, 100]);
        let templates = TemplateSet::empty()
            .with_template(KillType::Triple, solid(10, 4, [80, 80, 80]))
            .with_template(KillType::Single, solid(10, 4, [100, 100, 100]));

        let m = best_match(&crop, &templates, &MatchThresholds::default()).unwrap();
        assert_eq!(m.kill_type, KillType::Single);

        let tied = TemplateSet::empty()
            .with_template(KillType::Double, solid(10, 4, [100, 100, 100]))
            .with_template(KillType::Single, solid(10, 4, [100, 100, 100]));
        let m = best_match(&crop, &tied, &MatchThresholds::default()).unwrap();
        assert_eq!(m.kill_type, KillType::Double);
    }

    #[test]
    fn test_best_match_respects_tier_threshold() {
        // ~0.78 similarity: clears the 0.75 double bar but not the 0.80 single bar
        let crop = solid(10, 4, [0, 0, 0]);
        let grey = solid(10, 4, [56, 56, 56]);

        let single_only = TemplateSet::empty().with_template(KillType::Single, grey.clone());
        assert!(best_match(&crop, &single_only, &MatchThresholds::default()).is_none());

        let double_only = TemplateSet::empty().with_template(KillType::Double, grey);
        assert_eq!(
            best_match(&crop, &double_only, &MatchThresholds::default()).map(|m| m.kill_type),
            Some(KillType::Double)
        );
    }

    #[test]
    fn test_no_templates_no_match() {
        let crop = solid(10, 4, [1, 2, 3]);
        assert!(best_match(&crop, &TemplateSet::empty(), &MatchThresholds::default()).is_none());
    }
}
