//! Video upload, processing and status handlers.

use axum::extract::multipart::Field;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use clipforge_models::{
    source_extension, AspectRatio, FilterMode, JobConfig, JobResult, Video, VideoId, VideoStatus,
};
use clipforge_storage::video_source_key;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::config::ALLOWED_VIDEO_TYPES;
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::metrics;
use crate::state::AppState;

/// Longest accepted original filename.
const MAX_FILENAME_LENGTH: usize = 255;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub video_id: String,
    pub filename: String,
    pub status: VideoStatus,
    pub size_bytes: u64,
}

/// Accept a multipart `file` upload, store it and register the video.
///
/// Requires a positive credit balance. The body is spooled to disk, never
/// held in memory.
pub async fn upload_video(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let balance = state.db.credits().balance(&user.uid).await?;
    if balance == 0 {
        return Err(ApiError::InsufficientCredits {
            required: 1,
            balance,
        });
    }

    let field = loop {
        let next = multipart.next_field().await;
        match next.map_err(|e| multipart_error(e, state.config.max_upload_bytes))? {
            Some(field) if field.name() == Some("file") => break field,
            Some(_) => continue,
            None => return Err(ApiError::bad_request("Missing 'file' field")),
        }
    };

    let content_type = field.content_type().unwrap_or_default().to_ascii_lowercase();
    if !ALLOWED_VIDEO_TYPES.contains(&content_type.as_str()) {
        return Err(ApiError::UnsupportedMediaType(if content_type.is_empty() {
            "missing".to_string()
        } else {
            content_type
        }));
    }

    let filename = field
        .file_name()
        .map(|n| n.rsplit(['/', '\\']).next().unwrap_or(n).trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "upload.mp4".to_string());
    if filename.len() > MAX_FILENAME_LENGTH {
        return Err(ApiError::bad_request("Filename too long"));
    }

    let spool = tempfile::Builder::new()
        .prefix("clipforge-upload-")
        .tempfile_in(&state.config.upload_dir)
        .map_err(|e| ApiError::internal(format!("failed to create upload spool: {}", e)))?;
    let size_bytes = spool_field(field, spool.path(), state.config.max_upload_bytes).await?;
    if size_bytes == 0 {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }

    let video_id = VideoId::new();
    let key = video_source_key(&video_id, &source_extension(&filename));
    state.storage.put_file(spool.path(), &key, &content_type).await?;

    let video = Video::new_upload(video_id.clone(), user.uid.clone(), filename.clone());
    if let Err(e) = state.db.videos().insert(&video).await {
        if let Err(cleanup) = state.storage.delete(&key).await {
            warn!(key = %key, error = %cleanup, "Failed to remove orphaned upload");
        }
        return Err(e.into());
    }

    metrics::record_upload(size_bytes);
    info!(
        video_id = %video_id,
        user_id = %user.uid,
        size_bytes,
        content_type = %content_type,
        "Video uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            video_id: video_id.to_string(),
            filename,
            status: video.status,
            size_bytes,
        }),
    ))
}

/// Stream a multipart field into `path`, enforcing `limit`.
async fn spool_field(mut field: Field<'_>, path: &std::path::Path, limit: u64) -> ApiResult<u64> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| ApiError::internal(format!("failed to open upload spool: {}", e)))?;
    let mut written: u64 = 0;

    while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(e, limit))? {
        written += chunk.len() as u64;
        if written > limit {
            return Err(ApiError::PayloadTooLarge { limit });
        }
        file.write_all(&chunk)
            .await
            .map_err(|e| ApiError::internal(format!("failed to write upload spool: {}", e)))?;
    }
    file.flush()
        .await
        .map_err(|e| ApiError::internal(format!("failed to flush upload spool: {}", e)))?;
    Ok(written)
}

fn multipart_error(e: axum::extract::multipart::MultipartError, limit: u64) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge { limit }
    } else {
        ApiError::bad_request(format!("Malformed upload: {}", e.body_text()))
    }
}

/// Run the detection pipeline for a video and return its result.
///
/// The job runs on its own task, so a client disconnect stops the wait but
/// not the job.
pub async fn process_video(
    State(state): State<AppState>,
    user: AuthUser,
    Path(video_id): Path<String>,
    ApiJson(config): ApiJson<JobConfig>,
) -> ApiResult<Json<JobResult>> {
    let video_id = VideoId::from_string(video_id);
    let orchestrator = state.orchestrator.clone();
    let job = tokio::spawn(async move { orchestrator.run(&video_id, &user.uid, config).await });

    let result = job
        .await
        .map_err(|e| ApiError::internal(format!("processing task failed: {}", e)))??;
    Ok(Json(result))
}

#[derive(Debug, Serialize)]
pub struct ClipView {
    pub id: String,
    pub filename: String,
    pub timestamp: u32,
    pub score: u32,
    pub kill_type: String,
    pub expires_at: DateTime<Utc>,
    pub download_url: String,
}

#[derive(Debug, Serialize)]
pub struct VideoStatusResponse {
    pub video_id: String,
    pub filename: String,
    pub status: VideoStatus,
    pub filter_mode: FilterMode,
    pub caption_enabled: bool,
    pub aspect_ratio: AspectRatio,
    pub duration_secs: u32,
    pub credits_charged: u32,
    pub clips: Vec<ClipView>,
}

/// Current status; completed videos include their clips in timestamp order.
pub async fn get_video_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(video_id): Path<String>,
) -> ApiResult<Json<VideoStatusResponse>> {
    let video_id = VideoId::from_string(video_id);
    let video = state
        .db
        .videos()
        .get(&video_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;
    if !video.is_owned_by(&user.uid) {
        return Err(ApiError::forbidden("You do not have access to this video"));
    }

    let clips = if video.status == VideoStatus::Completed {
        state
            .db
            .clips()
            .list_for_video(&video_id)
            .await?
            .into_iter()
            .map(|clip| ClipView {
                download_url: format!("/api/clips/{}/download", clip.id),
                id: clip.id,
                filename: clip.filename,
                timestamp: clip.timestamp,
                score: clip.score,
                kill_type: clip.kill_type.to_string(),
                expires_at: clip.expires_at,
            })
            .collect()
    } else {
        Vec::new()
    };

    Ok(Json(VideoStatusResponse {
        video_id: video.id.to_string(),
        filename: video.filename,
        status: video.status,
        filter_mode: video.config.filter_mode,
        caption_enabled: video.config.caption_enabled,
        aspect_ratio: video.config.aspect_ratio,
        duration_secs: video.duration_secs,
        credits_charged: video.credits_charged,
        clips,
    }))
}
