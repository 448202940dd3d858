//! Output geometry for generated clips.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// Target aspect ratio for generated clips.
///
/// `16:9` is the source-native default and never triggers a reframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AspectRatio {
    /// Landscape (16:9), 1920x1080
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    /// Portrait (9:16), 1080x1920 for Shorts/Reels/TikTok
    #[serde(rename = "9:16")]
    Portrait,
    /// Square (1:1), 1080x1080
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Square => "1:1",
        }
    }

    /// Exact output dimensions `(width, height)` in pixels.
    pub const fn dimensions(&self) -> (u32, u32) {
        match self {
            AspectRatio::Landscape => (1920, 1080),
            AspectRatio::Portrait => (1080, 1920),
            AspectRatio::Square => (1080, 1080),
        }
    }

    /// Whether clips must be scaled and cropped to reach this ratio.
    pub fn needs_reframe(&self) -> bool {
        *self != AspectRatio::Landscape
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "16:9" => Ok(AspectRatio::Landscape),
            "9:16" => Ok(AspectRatio::Portrait),
            "1:1" => Ok(AspectRatio::Square),
            other => Err(ParseError::new("aspect ratio", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_parse() {
        assert_eq!("9:16".parse::<AspectRatio>().unwrap(), AspectRatio::Portrait);
        assert_eq!(" 1:1 ".parse::<AspectRatio>().unwrap(), AspectRatio::Square);
        assert!("4:5".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn test_dimensions() {
        assert_eq!(AspectRatio::Portrait.dimensions(), (1080, 1920));
        assert_eq!(AspectRatio::Square.dimensions(), (1080, 1080));
        assert_eq!(AspectRatio::Landscape.dimensions(), (1920, 1080));
    }

    #[test]
    fn test_only_non_default_reframes() {
        assert!(!AspectRatio::Landscape.needs_reframe());
        assert!(AspectRatio::Portrait.needs_reframe());
        assert!(AspectRatio::Square.needs_reframe());
    }

    #[test]
    fn test_serde_uses_ratio_strings() {
        let json = serde_json::to_string(&AspectRatio::Portrait).unwrap();
        assert_eq!(json, "\"9:16\"");
        let parsed: AspectRatio = serde_json::from_str("\"1:1\"").unwrap();
        assert_eq!(parsed, AspectRatio::Square);
    }
}
