//! Per-job scratch directories.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use clipforge_models::VideoId;
use tracing::{debug, warn};

/// Prefix shared by every job workspace under the work dir.
pub const WORKSPACE_PREFIX: &str = "clipforge-";

/// `{work_dir}/clipforge-{video_id}`, removed when the job ends.
#[derive(Debug)]
pub struct JobWorkspace {
    root: PathBuf,
}

impl JobWorkspace {
    /// Create a fresh workspace, discarding leftovers of an earlier run.
    pub async fn create(work_dir: &Path, video_id: &VideoId) -> std::io::Result<Self> {
        let root = work_dir.join(format!("{}{}", WORKSPACE_PREFIX, video_id));
        if tokio::fs::try_exists(&root).await.unwrap_or(false) {
            tokio::fs::remove_dir_all(&root).await?;
        }
        tokio::fs::create_dir_all(&root).await?;
        debug!(path = %root.display(), "Created job workspace");
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn source_path(&self, video_id: &VideoId, extension: &str) -> PathBuf {
        self.root.join(format!("{}.{}", video_id, extension))
    }

    pub fn frames_dir(&self) -> PathBuf {
        self.root.join("frames")
    }

    /// Scratch directory for one scene's intermediates.
    pub fn scene_dir(&self, index: usize) -> PathBuf {
        self.root.join(format!("scene_{:03}", index))
    }

    /// Best-effort removal.
    pub async fn cleanup(self) {
        if let Err(e) = tokio::fs::remove_dir_all(&self.root).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.root.display(), error = %e, "Failed to remove job workspace");
            }
        }
    }
}

/// Remove `clipforge-*` directories under `work_dir` last modified more than
/// `max_age` ago. Returns how many were removed.
pub async fn sweep_orphaned(work_dir: &Path, max_age: Duration) -> std::io::Result<usize> {
    let mut entries = match tokio::fs::read_dir(work_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let now = SystemTime::now();
    let mut removed = 0;

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(WORKSPACE_PREFIX) {
            continue;
        }
        let metadata = match entry.metadata().await {
            Ok(m) if m.is_dir() => m,
            _ => continue,
        };
        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or_default();
        if age <= max_age {
            continue;
        }

        match tokio::fs::remove_dir_all(entry.path()).await {
            Ok(()) => {
                debug!(path = %entry.path().display(), age_secs = age.as_secs(), "Removed orphaned workspace");
                removed += 1;
            }
            Err(e) => warn!(path = %entry.path().display(), error = %e, "Failed to remove orphaned workspace"),
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_cleanup() {
        let work = tempfile::tempdir().unwrap();
        let id = VideoId::from_string("v1");

        let ws = JobWorkspace::create(work.path(), &id).await.unwrap();
        assert!(ws.path().ends_with("clipforge-v1"));
        tokio::fs::write(ws.path().join("stale.txt"), b"x").await.unwrap();

        // a second create starts clean
        let ws = JobWorkspace::create(work.path(), &id).await.unwrap();
        assert!(!ws.path().join("stale.txt").exists());
        assert_eq!(ws.source_path(&id, "mov").file_name().unwrap(), "v1.mov");

        let root = ws.path().to_path_buf();
        ws.cleanup().await;
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_sweep_respects_prefix_and_age() {
        let work = tempfile::tempdir().unwrap();
        std::fs::create_dir(work.path().join("clipforge-old")).unwrap();
        std::fs::create_dir(work.path().join("unrelated")).unwrap();

        // Nothing is older than an hour yet
        assert_eq!(sweep_orphaned(work.path(), Duration::from_secs(3600)).await.unwrap(), 0);

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(sweep_orphaned(work.path(), Duration::from_millis(1)).await.unwrap(), 1);
        assert!(!work.path().join("clipforge-old").exists());
        assert!(work.path().join("unrelated").exists());
    }

    #[tokio::test]
    async fn test_sweep_missing_dir() {
        let work = tempfile::tempdir().unwrap();
        let missing = work.path().join("nope");
        assert_eq!(sweep_orphaned(&missing, Duration::ZERO).await.unwrap(), 0);
    }
}
