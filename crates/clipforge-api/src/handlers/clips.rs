//! Clip delivery.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use tracing::info;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Redirect the owner to a short-lived presigned URL for the clip.
pub async fn download_clip(
    State(state): State<AppState>,
    user: AuthUser,
    Path(clip_id): Path<String>,
) -> ApiResult<Response> {
    let clip = state
        .db
        .clips()
        .get(&clip_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Clip not found"))?;

    let video = state
        .db
        .videos()
        .get(&clip.video_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Clip not found"))?;
    if !video.is_owned_by(&user.uid) {
        return Err(ApiError::forbidden("You do not have access to this clip"));
    }

    if clip.is_expired(Utc::now()) {
        return Err(ApiError::Gone("Clip has expired".to_string()));
    }

    let url = state
        .storage
        .signed_download_url(&clip.storage_key, state.config.download_url_ttl)
        .await?;
    info!(clip_id = %clip.id, user_id = %user.uid, "Issued clip download URL");

    Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response())
}
