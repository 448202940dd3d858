//! Video rows and lifecycle transitions.

use chrono::{DateTime, Utc};
use clipforge_models::{Clip, JobConfig, Video, VideoId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, warn};

use crate::clips::insert_clip;
use crate::convert::{from_millis, parse_column, to_millis, to_u32};
use crate::error::{DbError, DbResult};

/// Everything written when a job finishes.
#[derive(Debug, Clone, Copy)]
pub struct JobCompletion<'a> {
    pub video_id: &'a VideoId,
    pub user_id: &'a str,
    pub clips: &'a [Clip],
    pub duration_secs: u32,
    pub credits: u32,
}

/// Repository for the `videos` table.
#[derive(Clone)]
pub struct VideoRepository {
    pool: SqlitePool,
}

impl VideoRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, video: &Video) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO videos (id, user_id, filename, duration_secs, status, filter_mode, \
             caption_enabled, aspect_ratio, credits_charged, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(video.id.as_str())
        .bind(&video.user_id)
        .bind(&video.filename)
        .bind(video.duration_secs as i64)
        .bind(video.status.as_str())
        .bind(video.config.filter_mode.as_str())
        .bind(video.config.caption_enabled)
        .bind(video.config.aspect_ratio.as_str())
        .bind(video.credits_charged as i64)
        .bind(to_millis(video.created_at))
        .execute(&self.pool)
        .await?;

        debug!(video_id = %video.id, "Inserted video");
        Ok(())
    }

    pub async fn get(&self, video_id: &VideoId) -> DbResult<Option<Video>> {
        let row = sqlx::query("SELECT * FROM videos WHERE id = ?")
            .bind(video_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(video_from_row).transpose()
    }

    /// Move `uploaded -> processing` and store the job options, only if the
    /// video is still `uploaded`. Returns `false` when another request won.
    pub async fn try_begin_processing(&self, video_id: &VideoId, config: &JobConfig) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE videos SET status = 'processing', filter_mode = ?, caption_enabled = ?, \
             aspect_ratio = ?, processing_started_at = ? WHERE id = ? AND status = 'uploaded'",
        )
        .bind(config.filter_mode.as_str())
        .bind(config.caption_enabled)
        .bind(config.aspect_ratio.as_str())
        .bind(to_millis(Utc::now()))
        .bind(video_id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Move `processing -> uploaded`. Returns `false` if the video was not processing.
    pub async fn rollback_to_uploaded(&self, video_id: &VideoId) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE videos SET status = 'uploaded', processing_started_at = NULL \
             WHERE id = ? AND status = 'processing'",
        )
        .bind(video_id.as_str())
        .execute(&self.pool)
        .await?;

        let rolled_back = result.rows_affected() == 1;
        if !rolled_back {
            warn!(video_id = %video_id, "Rollback matched no processing video");
        }
        Ok(rolled_back)
    }

    /// Return every video stuck in `processing` since before `cutoff` to
    /// `uploaded`. Covers runs whose process died before rolling back.
    pub async fn reset_stale_processing(&self, cutoff: DateTime<Utc>) -> DbResult<u64> {
        let reset = sqlx::query(
            "UPDATE videos SET status = 'uploaded', processing_started_at = NULL \
             WHERE status = 'processing' AND processing_started_at < ?",
        )
        .bind(to_millis(cutoff))
        .execute(&self.pool)
        .await?
        .rows_affected();

        if reset > 0 {
            warn!(count = reset, "Reset stale processing videos");
        }
        Ok(reset)
    }

    /// Insert the clips, debit the owner and mark the video `completed` in
    /// one transaction. Nothing is written unless all three succeed.
    pub async fn complete_with_clips(&self, completion: JobCompletion<'_>) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        for clip in completion.clips {
            insert_clip(&mut *tx, clip).await?;
        }

        if completion.credits > 0 {
            let debited = sqlx::query(
                "UPDATE credit_accounts SET balance = balance - ?, updated_at = ? \
                 WHERE user_id = ? AND balance >= ?",
            )
            .bind(completion.credits as i64)
            .bind(to_millis(Utc::now()))
            .bind(completion.user_id)
            .bind(completion.credits as i64)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if debited == 0 {
                let balance: Option<i64> =
                    sqlx::query_scalar("SELECT balance FROM credit_accounts WHERE user_id = ?")
                        .bind(completion.user_id)
                        .fetch_optional(&mut *tx)
                        .await?;
                tx.rollback().await?;
                return Err(DbError::InsufficientCredits {
                    required: completion.credits,
                    balance: balance.map(|b| to_u32(b, "balance")).transpose()?.unwrap_or(0),
                });
            }
        }

        let completed = sqlx::query(
            "UPDATE videos SET status = 'completed', duration_secs = ?, credits_charged = ? \
             WHERE id = ? AND status = 'processing'",
        )
        .bind(completion.duration_secs as i64)
        .bind(completion.credits as i64)
        .bind(completion.video_id.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if completed == 0 {
            tx.rollback().await?;
            return Err(DbError::precondition_failed(format!(
                "video {} is not processing",
                completion.video_id
            )));
        }

        tx.commit().await?;
        info!(
            video_id = %completion.video_id,
            clips = completion.clips.len(),
            credits = completion.credits,
            "Job completion recorded"
        );
        Ok(())
    }
}

fn video_from_row(row: &SqliteRow) -> DbResult<Video> {
    let status: String = row.try_get("status")?;
    let filter_mode: String = row.try_get("filter_mode")?;
    let aspect_ratio: String = row.try_get("aspect_ratio")?;

    Ok(Video {
        id: VideoId::from_string(row.try_get::<String, _>("id")?),
        user_id: row.try_get("user_id")?,
        filename: row.try_get("filename")?,
        duration_secs: to_u32(row.try_get("duration_secs")?, "duration_secs")?,
        status: parse_column(&status, "status")?,
        config: JobConfig {
            filter_mode: parse_column(&filter_mode, "filter_mode")?,
            caption_enabled: row.try_get("caption_enabled")?,
            aspect_ratio: parse_column(&aspect_ratio, "aspect_ratio")?,
        },
        credits_charged: to_u32(row.try_get("credits_charged")?, "credits_charged")?,
        created_at: from_millis(row.try_get("created_at")?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Database;
    use chrono::Duration;
    use clipforge_models::{AspectRatio, FilterMode, KillScene, KillType, VideoStatus};

    async fn setup() -> (Database, Video) {
        let db = Database::in_memory().await.unwrap();
        let video = Video::new_upload(VideoId::new(), "user-1", "match.mp4");
        db.videos().insert(&video).await.unwrap();
        db.credits().grant("user-1", 10).await.unwrap();
        (db, video)
    }

    fn clip_for(video: &Video, t: u32) -> Clip {
        let scene = KillScene {
            timestamp: t,
            score: 90,
            kill_type: KillType::Triple,
            confidence: 0.9,
        };
        Clip::for_scene(
            &video.id,
            &scene,
            format!("clip_{}s_1.mp4", t),
            format!("clips/{}/x-clip_{}s_1.mp4", video.id, t),
            Utc::now(),
            Duration::minutes(10),
        )
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let (db, video) = setup().await;
        let loaded = db.videos().get(&video.id).await.unwrap().unwrap();
        assert_eq!(loaded.user_id, "user-1");
        assert_eq!(loaded.status, VideoStatus::Uploaded);
        assert_eq!(loaded.config, JobConfig::default());
        assert!(db.videos().get(&VideoId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_begin_processing_is_compare_and_set() {
        let (db, video) = setup().await;
        let config = JobConfig {
            filter_mode: FilterMode::Highlight,
            caption_enabled: true,
            aspect_ratio: AspectRatio::Portrait,
        };

        assert!(db.videos().try_begin_processing(&video.id, &config).await.unwrap());
        assert!(!db.videos().try_begin_processing(&video.id, &config).await.unwrap());

        let loaded = db.videos().get(&video.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, VideoStatus::Processing);
        assert_eq!(loaded.config, config);

        assert!(db.videos().rollback_to_uploaded(&video.id).await.unwrap());
        assert!(!db.videos().rollback_to_uploaded(&video.id).await.unwrap());
        let loaded = db.videos().get(&video.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, VideoStatus::Uploaded);
    }

    #[tokio::test]
    async fn test_reset_stale_processing_only_touches_old_claims() {
        let (db, video) = setup().await;
        let other = Video::new_upload(VideoId::new(), "user-1", "other.mp4");
        db.videos().insert(&other).await.unwrap();
        db.videos()
            .try_begin_processing(&video.id, &JobConfig::default())
            .await
            .unwrap();

        let reset = db
            .videos()
            .reset_stale_processing(Utc::now() - Duration::minutes(5))
            .await
            .unwrap();
        assert_eq!(reset, 0);
        let loaded = db.videos().get(&video.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, VideoStatus::Processing);

        let reset = db
            .videos()
            .reset_stale_processing(Utc::now() + Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(reset, 1);
        let loaded = db.videos().get(&video.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, VideoStatus::Uploaded);
        let untouched = db.videos().get(&other.id).await.unwrap().unwrap();
        assert_eq!(untouched.status, VideoStatus::Uploaded);

        // claimable again
        assert!(db.videos().try_begin_processing(&video.id, &JobConfig::default()).await.unwrap());
    }

    #[tokio::test]
    async fn test_complete_writes_everything() {
        let (db, video) = setup().await;
        db.videos()
            .try_begin_processing(&video.id, &JobConfig::default())
            .await
            .unwrap();

        let clips = vec![clip_for(&video, 40), clip_for(&video, 12)];
        db.videos()
            .complete_with_clips(JobCompletion {
                video_id: &video.id,
                user_id: "user-1",
                clips: &clips,
                duration_secs: 300,
                credits: 5,
            })
            .await
            .unwrap();

        let loaded = db.videos().get(&video.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, VideoStatus::Completed);
        assert_eq!(loaded.duration_secs, 300);
        assert_eq!(loaded.credits_charged, 5);
        assert_eq!(db.credits().balance("user-1").await.unwrap(), 5);

        let stored = db.clips().list_for_video(&video.id).await.unwrap();
        let timestamps: Vec<u32> = stored.iter().map(|c| c.timestamp).collect();
        assert_eq!(timestamps, vec![12, 40]);
    }

    #[tokio::test]
    async fn test_complete_with_insufficient_balance_writes_nothing() {
        let (db, video) = setup().await;
        db.videos()
            .try_begin_processing(&video.id, &JobConfig::default())
            .await
            .unwrap();

        let clips = vec![clip_for(&video, 40)];
        let err = db
            .videos()
            .complete_with_clips(JobCompletion {
                video_id: &video.id,
                user_id: "user-1",
                clips: &clips,
                duration_secs: 900,
                credits: 15,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::InsufficientCredits {
                required: 15,
                balance: 10
            }
        ));
        assert_eq!(db.credits().balance("user-1").await.unwrap(), 10);
        assert!(db.clips().list_for_video(&video.id).await.unwrap().is_empty());
        let loaded = db.videos().get(&video.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, VideoStatus::Processing);
    }

    #[tokio::test]
    async fn test_complete_requires_processing_status() {
        let (db, video) = setup().await;
        let err = db
            .videos()
            .complete_with_clips(JobCompletion {
                video_id: &video.id,
                user_id: "user-1",
                clips: &[],
                duration_secs: 60,
                credits: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::PreconditionFailed(_)));
        assert_eq!(db.credits().balance("user-1").await.unwrap(), 10);
    }
}
