//! Admin handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::AdminAuth;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Largest single grant.
const MAX_GRANT: u32 = 100_000;

#[derive(Debug, Deserialize)]
pub struct GrantCreditsRequest {
    pub amount: u32,
}

#[derive(Debug, Serialize)]
pub struct GrantCreditsResponse {
    pub user_id: String,
    pub credits: u32,
}

/// Add credits to a user's account, creating it if needed.
pub async fn grant_credits(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Path(uid): Path<String>,
    Json(request): Json<GrantCreditsRequest>,
) -> ApiResult<Json<GrantCreditsResponse>> {
    let uid = uid.trim().to_string();
    if uid.is_empty() || uid.len() > 128 {
        return Err(ApiError::bad_request("Invalid user id"));
    }
    if request.amount == 0 || request.amount > MAX_GRANT {
        return Err(ApiError::bad_request(format!(
            "amount must be between 1 and {}",
            MAX_GRANT
        )));
    }

    let credits = state.db.credits().grant(&uid, request.amount).await?;
    metrics::record_credits_granted(request.amount);
    info!(user_id = %uid, amount = request.amount, balance = credits, "Credits granted");

    Ok(Json(GrantCreditsResponse { user_id: uid, credits }))
}
