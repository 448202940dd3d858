//! Axum HTTP API server.
//!
//! This crate provides:
//! - Upload boundary with content-type and size checks
//! - Synchronous processing submission and status polling
//! - Presigned clip downloads and credit endpoints
//! - Rate limiting, security headers and Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
