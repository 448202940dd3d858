//! FFmpeg filter builders for reframing and caption burn-in.

use clipforge_models::AspectRatio;

/// ASS style applied to burned-in captions.
pub const CAPTION_FORCE_STYLE: &str = "FontName=Noto Sans JP,FontSize=24,PrimaryColour=&HFFFFFF,OutlineColour=&H000000,BorderStyle=3,Outline=2";

/// Explicit `scale` then `crop` for a computed plan. Never letterboxes.
pub fn reframe_filter(plan: &ReframePlan) -> String {
    format!(
        "scale={}:{},crop={}:{}:{}:{}",
        plan.scaled.0, plan.scaled.1, plan.output.0, plan.output.1, plan.crop_origin.0, plan.crop_origin.1
    )
}

/// `subtitles` filter for an SRT file with the caption style forced.
pub fn caption_filter(srt_path: &str) -> String {
    format!(
        "subtitles=filename='{}':force_style='{}'",
        escape_filter_path(srt_path),
        CAPTION_FORCE_STYLE
    )
}

/// Escape a path for use inside a quoted filtergraph argument.
fn escape_filter_path(path: &str) -> String {
    path.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(':', "\\:")
}

/// Cover-scale and centered-crop geometry for one source size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReframePlan {
    /// Size after the cover scale
    pub scaled: (u32, u32),
    /// Top-left corner of the centered crop within the scaled frame
    pub crop_origin: (u32, u32),
    /// Final output size
    pub output: (u32, u32),
}

impl ReframePlan {
    /// Scale so both axes cover the target, then crop the center.
    pub fn compute(source: (u32, u32), target: AspectRatio) -> Self {
        let (tw, th) = target.dimensions();
        let (sw, sh) = (source.0.max(1) as u64, source.1.max(1) as u64);
        let (tw64, th64) = (tw as u64, th as u64);

        // Pick the axis that needs the larger scale factor; round the other up so it still covers.
        let scaled = if tw64 * sh >= th64 * sw {
            (tw, ((tw64 * sh + sw - 1) / sw) as u32)
        } else {
            (((th64 * sw + sh - 1) / sh) as u32, th)
        };

        let crop_origin = ((scaled.0 - tw) / 2, (scaled.1 - th) / 2);

        Self {
            scaled,
            crop_origin,
            output: (tw, th),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reframe_filter_uses_plan_geometry() {
        let portrait = ReframePlan::compute((1920, 1080), AspectRatio::Portrait);
        assert_eq!(reframe_filter(&portrait), "scale=3414:1920,crop=1080:1920:1167:0");

        let square = ReframePlan::compute((1920, 1080), AspectRatio::Square);
        assert_eq!(reframe_filter(&square), "scale=1920:1080,crop=1080:1080:420:0");

        let landscape = ReframePlan::compute((1920, 1080), AspectRatio::Landscape);
        assert_eq!(reframe_filter(&landscape), "scale=1920:1080,crop=1920:1080:0:0");
    }

    #[test]
    fn test_portrait_from_1080p_is_exact() {
        let plan = ReframePlan::compute((1920, 1080), AspectRatio::Portrait);
        assert_eq!(plan.output, (1080, 1920));
        assert_eq!(plan.scaled.1, 1920);
        assert!(plan.scaled.0 >= 1080);
        assert_eq!(plan.crop_origin.1, 0);
        assert_eq!(plan.crop_origin.0, (plan.scaled.0 - 1080) / 2);
    }

    #[test]
    fn test_square_never_letterboxes() {
        for source in [(1920, 1080), (1080, 1920), (640, 480), (1080, 1080)] {
            let plan = ReframePlan::compute(source, AspectRatio::Square);
            assert_eq!(plan.output, (1080, 1080));
            assert!(plan.scaled.0 >= 1080 && plan.scaled.1 >= 1080, "{:?}", source);
        }
    }

    #[test]
    fn test_caption_filter_escapes_path() {
        let filter = caption_filter("/tmp/clipforge-a/scene_40/captions:1.srt");
        assert!(filter.starts_with("subtitles=filename='/tmp/clipforge-a/scene_40/captions\\:1.srt'"));
        assert!(filter.contains("force_style='FontName=Noto Sans JP"));
    }
}
