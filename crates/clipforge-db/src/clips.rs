//! Clip rows.

use chrono::{DateTime, Utc};
use clipforge_models::{Clip, VideoId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite, SqlitePool};

use crate::convert::{from_millis, parse_column, to_millis, to_u32};
use crate::error::DbResult;

/// Insert one clip on any executor (pool or open transaction).
pub(crate) async fn insert_clip<'e, E>(executor: E, clip: &Clip) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO clips (id, video_id, filename, timestamp, score, kill_type, storage_key, \
         created_at, expires_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&clip.id)
    .bind(clip.video_id.as_str())
    .bind(&clip.filename)
    .bind(clip.timestamp as i64)
    .bind(clip.score as i64)
    .bind(clip.kill_type.as_str())
    .bind(&clip.storage_key)
    .bind(to_millis(clip.created_at))
    .bind(to_millis(clip.expires_at))
    .execute(executor)
    .await?;
    Ok(())
}

/// Repository for the `clips` table.
#[derive(Clone)]
pub struct ClipRepository {
    pool: SqlitePool,
}

impl ClipRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, clip: &Clip) -> DbResult<()> {
        insert_clip(&self.pool, clip).await
    }

    pub async fn get(&self, clip_id: &str) -> DbResult<Option<Clip>> {
        let row = sqlx::query("SELECT * FROM clips WHERE id = ?")
            .bind(clip_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(clip_from_row).transpose()
    }

    /// Clips of a video in timestamp order.
    pub async fn list_for_video(&self, video_id: &VideoId) -> DbResult<Vec<Clip>> {
        let rows = sqlx::query("SELECT * FROM clips WHERE video_id = ? ORDER BY timestamp, created_at")
            .bind(video_id.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(clip_from_row).collect()
    }

    /// Clips whose expiry is at or before `now`, oldest first.
    pub async fn list_expired(&self, now: DateTime<Utc>, limit: u32) -> DbResult<Vec<Clip>> {
        let rows = sqlx::query("SELECT * FROM clips WHERE expires_at <= ? ORDER BY expires_at LIMIT ?")
            .bind(to_millis(now))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(clip_from_row).collect()
    }

    /// Returns `true` if a row was removed.
    pub async fn delete(&self, clip_id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM clips WHERE id = ?")
            .bind(clip_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn clip_from_row(row: &SqliteRow) -> DbResult<Clip> {
    let kill_type: String = row.try_get("kill_type")?;
    Ok(Clip {
        id: row.try_get("id")?,
        video_id: VideoId::from_string(row.try_get::<String, _>("video_id")?),
        filename: row.try_get("filename")?,
        timestamp: to_u32(row.try_get("timestamp")?, "timestamp")?,
        score: to_u32(row.try_get("score")?, "score")?,
        kill_type: parse_column(&kill_type, "kill_type")?,
        storage_key: row.try_get("storage_key")?,
        created_at: from_millis(row.try_get("created_at")?)?,
        expires_at: from_millis(row.try_get("expires_at")?)?,
    })
}
