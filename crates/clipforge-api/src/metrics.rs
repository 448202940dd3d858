//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for `/metrics`.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "clipforge_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "clipforge_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "clipforge_http_requests_in_flight";
    pub const UPLOADS_TOTAL: &str = "clipforge_uploads_total";
    pub const UPLOAD_BYTES_TOTAL: &str = "clipforge_upload_bytes_total";
    pub const CREDITS_GRANTED_TOTAL: &str = "clipforge_credits_granted_total";
    pub const RATE_LIMIT_HITS_TOTAL: &str = "clipforge_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_upload(bytes: u64) {
    counter!(names::UPLOADS_TOTAL).increment(1);
    counter!(names::UPLOAD_BYTES_TOTAL).increment(bytes);
}

pub fn record_credits_granted(amount: u32) {
    counter!(names::CREDITS_GRANTED_TOTAL).increment(amount as u64);
}

pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Replace the identifier following a collection segment with a placeholder.
fn sanitize_path(path: &str) -> String {
    let mut out = Vec::new();
    let mut previous = "";
    for segment in path.split('/') {
        let placeholder = match previous {
            "videos" => Some(":video_id"),
            "clips" => Some(":clip_id"),
            "users" => Some(":uid"),
            _ => None,
        };
        match placeholder {
            Some(p) if !segment.is_empty() => out.push(p),
            _ => out.push(segment),
        }
        previous = segment;
    }
    out.join("/")
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/api/videos/550e8400-e29b-41d4-a716-446655440000/status"),
            "/api/videos/:video_id/status"
        );
        assert_eq!(
            sanitize_path("/api/clips/abc/download"),
            "/api/clips/:clip_id/download"
        );
        assert_eq!(
            sanitize_path("/api/admin/users/u1/credits"),
            "/api/admin/users/:uid/credits"
        );
        assert_eq!(sanitize_path("/api/videos"), "/api/videos");
    }
}
