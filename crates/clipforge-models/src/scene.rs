//! Kill scenes emitted by the detector.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// Kill-type classification of a sampled frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KillType {
    Single,
    Double,
    Triple,
    /// Reserved. No detector path produces it yet; kill-banner matching
    /// only yields single/double/triple.
    Clutch,
    #[default]
    None,
}

impl KillType {
    /// Template tiers in evaluation priority order (highest tier first).
    pub const MATCHABLE: [KillType; 3] = [KillType::Triple, KillType::Double, KillType::Single];

    pub fn as_str(&self) -> &'static str {
        match self {
            KillType::Single => "single",
            KillType::Double => "double",
            KillType::Triple => "triple",
            KillType::Clutch => "clutch",
            KillType::None => "none",
        }
    }

    /// Priority rank used to break confidence ties; higher wins.
    pub fn tier(&self) -> u8 {
        match self {
            KillType::Triple => 4,
            KillType::Clutch => 3,
            KillType::Double => 2,
            KillType::Single => 1,
            KillType::None => 0,
        }
    }
}

impl fmt::Display for KillType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KillType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" => Ok(KillType::Single),
            "double" => Ok(KillType::Double),
            "triple" => Ok(KillType::Triple),
            "clutch" => Ok(KillType::Clutch),
            "none" | "" => Ok(KillType::None),
            _ => Err(ParseError::new("kill type", s)),
        }
    }
}

/// A timestamp judged to contain a highlight event.
///
/// Pipeline-internal: produced by the detector, consumed by the scene filter
/// and the clip assembler, never persisted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillScene {
    /// Seconds from the start of the source video
    pub timestamp: u32,
    /// Heuristic highlight score
    pub score: u32,
    pub kill_type: KillType,
    /// Template similarity of the winning match (0.0-1.0)
    pub confidence: f64,
}
