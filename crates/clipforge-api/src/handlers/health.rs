//! Liveness and readiness probes.

use std::fmt::Display;
use std::future::Future;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::state::AppState;

/// Process is up; touches no dependencies.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Outcome of one dependency probe.
#[derive(Debug, Serialize)]
pub struct DependencyCheck {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DependencyCheck {
    async fn run<E: Display>(probe: impl Future<Output = Result<(), E>>) -> Self {
        let start = Instant::now();
        match probe.await {
            Ok(()) => Self {
                status: "ok",
                latency_ms: Some(start.elapsed().as_millis() as u64),
                error: None,
            },
            Err(e) => Self {
                status: "error",
                latency_ms: None,
                error: Some(e.to_string()),
            },
        }
    }

    fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Serialize)]
struct Readiness {
    status: &'static str,
    checks: Checks,
}

#[derive(Debug, Serialize)]
struct Checks {
    database: DependencyCheck,
    storage: DependencyCheck,
}

/// 200 when the database and object store both answer, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> Response {
    let database = DependencyCheck::run(state.db.ping()).await;
    let storage = DependencyCheck::run(state.storage.check_connectivity()).await;

    let ok = database.is_ok() && storage.is_ok();
    let body = Json(Readiness {
        status: if ok { "ready" } else { "not_ready" },
        checks: Checks { database, storage },
    });
    let code = if ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, body).into_response()
}
