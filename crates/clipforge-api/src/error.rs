//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use clipforge_worker::WorkerError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Where clients are sent to buy more credits.
pub const TOP_UP_PATH: &str = "/credits";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Gone: {0}")]
    Gone(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Insufficient credits: required {required}, balance {balance}")]
    InsufficientCredits { required: u32, balance: u32 },

    #[error("Upload exceeds {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    #[error("Unsupported content type: {0}")]
    UnsupportedMediaType(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Storage error: {0}")]
    Storage(#[from] clipforge_storage::StorageError),

    #[error("Database error: {0}")]
    Db(#[from] clipforge_db::DbError),

    /// Worker failures carry their own caller-facing text.
    #[error("{public}")]
    Job { public: String, source: WorkerError },
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Gone(_) => StatusCode::GONE,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InsufficientCredits { .. } => StatusCode::PAYMENT_REQUIRED,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) | ApiError::Storage(_) | ApiError::Db(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Job { source, .. } => match source {
                WorkerError::Validation(_) => StatusCode::BAD_REQUEST,
                WorkerError::Unauthorized(_) => StatusCode::FORBIDDEN,
                WorkerError::NotFound(_) => StatusCode::NOT_FOUND,
                WorkerError::Conflict(_) => StatusCode::CONFLICT,
                WorkerError::InsufficientCredits { .. } => StatusCode::PAYMENT_REQUIRED,
                WorkerError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn code(&self) -> Option<&'static str> {
        match self {
            ApiError::InsufficientCredits { .. } => Some("insufficient_credits"),
            ApiError::Job { source, .. } => Some(source.kind()),
            ApiError::Timeout(_) => Some("timeout"),
            ApiError::RateLimited => Some("rate_limited"),
            _ => None,
        }
    }

    fn credit_shortfall(&self) -> Option<(u32, u32)> {
        match self {
            ApiError::InsufficientCredits { required, balance }
            | ApiError::Job {
                source: WorkerError::InsufficientCredits { required, balance },
                ..
            } => Some((*required, *balance)),
            _ => None,
        }
    }
}

impl From<WorkerError> for ApiError {
    fn from(e: WorkerError) -> Self {
        ApiError::Job {
            public: e.public_message(),
            source: e,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_url: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    required: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    balance: Option<u32>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        }

        // Don't expose internal error details in production
        let detail = match &self {
            ApiError::Internal(_) | ApiError::Storage(_) | ApiError::Db(_) => {
                if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                    "An internal error occurred".to_string()
                } else {
                    self.to_string()
                }
            }
            _ => self.to_string(),
        };

        let shortfall = self.credit_shortfall();
        let body = ErrorResponse {
            detail,
            code: self.code(),
            redirect_url: shortfall.map(|_| TOP_UP_PATH),
            required: shortfall.map(|(r, _)| r),
            balance: shortfall.map(|(_, b)| b),
        };

        (status, Json(body)).into_response()
    }
}
