//! Credit balance handler.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreditsResponse {
    pub credits: u32,
}

/// Balance of the authenticated user; a fresh account reads as zero.
pub async fn get_credits(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<CreditsResponse>> {
    let credits = state.db.credits().balance(&user.uid).await?;
    Ok(Json(CreditsResponse { credits }))
}
