//! Table definitions.
//!
//! Times are stored as Unix milliseconds so expiry sweeps compare integers.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

const CREATE_CREDIT_ACCOUNTS: &str = r#"
CREATE TABLE IF NOT EXISTS credit_accounts (
    user_id     TEXT PRIMARY KEY NOT NULL,
    balance     INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0),
    created_at  INTEGER NOT NULL,
    updated_at  INTEGER NOT NULL
)"#;

const CREATE_VIDEOS: &str = r#"
CREATE TABLE IF NOT EXISTS videos (
    id               TEXT PRIMARY KEY NOT NULL,
    user_id          TEXT NOT NULL,
    filename         TEXT NOT NULL,
    duration_secs    INTEGER NOT NULL DEFAULT 0,
    status           TEXT NOT NULL DEFAULT 'uploaded'
                     CHECK (status IN ('uploaded', 'processing', 'completed')),
    filter_mode      TEXT NOT NULL DEFAULT 'all',
    caption_enabled  INTEGER NOT NULL DEFAULT 0,
    aspect_ratio     TEXT NOT NULL DEFAULT '16:9',
    credits_charged  INTEGER NOT NULL DEFAULT 0,
    created_at       INTEGER NOT NULL,
    processing_started_at INTEGER
)"#;

const CREATE_VIDEOS_USER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_videos_user_id ON videos (user_id)";

const CREATE_VIDEOS_PROCESSING_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_videos_processing ON videos (status, processing_started_at)";

const CREATE_CLIPS: &str = r#"
CREATE TABLE IF NOT EXISTS clips (
    id           TEXT PRIMARY KEY NOT NULL,
    video_id     TEXT NOT NULL REFERENCES videos (id) ON DELETE CASCADE,
    filename     TEXT NOT NULL,
    timestamp    INTEGER NOT NULL,
    score        INTEGER NOT NULL,
    kill_type    TEXT NOT NULL,
    storage_key  TEXT NOT NULL,
    created_at   INTEGER NOT NULL,
    expires_at   INTEGER NOT NULL
)"#;

const CREATE_CLIPS_VIDEO_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_clips_video_id ON clips (video_id, timestamp)";

const CREATE_CLIPS_EXPIRY_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_clips_expires_at ON clips (expires_at)";

/// Create all tables and indexes. Safe to run on every start.
pub async fn init_schema(pool: &SqlitePool) -> DbResult<()> {
    for ddl in [
        CREATE_CREDIT_ACCOUNTS,
        CREATE_VIDEOS,
        CREATE_VIDEOS_USER_INDEX,
        CREATE_VIDEOS_PROCESSING_INDEX,
        CREATE_CLIPS,
        CREATE_CLIPS_VIDEO_INDEX,
        CREATE_CLIPS_EXPIRY_INDEX,
    ] {
        sqlx::query(ddl).execute(pool).await?;
    }
    info!("Database schema ready");
    Ok(())
}
