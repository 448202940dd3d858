//! Generated clip records.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scene::{KillScene, KillType};
use crate::video::VideoId;

/// A generated highlight clip stored in object storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Unique clip ID
    pub id: String,

    /// Parent video
    pub video_id: VideoId,

    /// Generated filename (e.g., `clip_40s_1718000000000.mp4`)
    pub filename: String,

    /// Source scene timestamp in seconds
    pub timestamp: u32,

    /// Source scene score
    pub score: u32,

    pub kill_type: KillType,

    /// Object storage key
    pub storage_key: String,

    pub created_at: DateTime<Utc>,

    /// Always strictly after `created_at`
    pub expires_at: DateTime<Utc>,
}

impl Clip {
    /// Build clip metadata for a scene; non-positive TTLs are bumped to one second.
    pub fn for_scene(
        video_id: &VideoId,
        scene: &KillScene,
        filename: impl Into<String>,
        storage_key: impl Into<String>,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let ttl = if ttl <= Duration::zero() {
            Duration::seconds(1)
        } else {
            ttl
        };
        Self {
            id: Uuid::new_v4().to_string(),
            video_id: video_id.clone(),
            filename: filename.into(),
            timestamp: scene.timestamp,
            score: scene.score,
            kill_type: scene.kill_type,
            storage_key: storage_key.into(),
            created_at,
            expires_at: created_at + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn summary(&self) -> ClipSummary {
        ClipSummary {
            clip_id: self.id.clone(),
            filename: self.filename.clone(),
            timestamp: self.timestamp,
            score: self.score,
            kill_type: self.kill_type,
        }
    }
}

/// Lightweight clip view returned with a job result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipSummary {
    pub clip_id: String,
    pub filename: String,
    pub timestamp: u32,
    pub score: u32,
    pub kill_type: KillType,
}
