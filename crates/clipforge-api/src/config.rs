//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

/// 5 GiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024 * 1024;

/// Content types accepted by the upload boundary.
pub const ALLOWED_VIDEO_TYPES: &[&str] = &["video/mp4", "video/quicktime", "video/x-msvideo"];

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second, per client IP
    pub rate_limit_rps: u32,
    /// Largest accepted upload
    pub max_upload_bytes: u64,
    /// Where uploads are spooled before reaching object storage
    pub upload_dir: PathBuf,
    /// Lifetime of presigned clip download URLs
    pub download_url_ttl: Duration,
    /// Environment (development/production)
    pub environment: String,
    /// HS256 secret for user bearer tokens
    pub jwt_secret: Option<String>,
    /// Bearer token guarding admin routes
    pub admin_token: Option<String>,
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            upload_dir: std::env::temp_dir(),
            download_url_ttl: Duration::from_secs(300),
            environment: "development".to_string(),
            jwt_secret: None,
            admin_token: None,
            metrics_enabled: true,
        }
    }
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(d.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(d.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(d.cors_origins),
            rate_limit_rps: std::env::var("RATE_LIMIT_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(d.rate_limit_rps),
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(d.max_upload_bytes),
            upload_dir: std::env::var("CLIPFORGE_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(d.upload_dir),
            download_url_ttl: d.download_url_ttl,
            environment: std::env::var("ENVIRONMENT").unwrap_or(d.environment),
            jwt_secret: non_empty("AUTH_JWT_SECRET"),
            admin_token: non_empty("ADMIN_API_TOKEN"),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(d.metrics_enabled),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Request body ceiling: the upload limit plus multipart framing.
    pub fn body_limit(&self) -> usize {
        usize::try_from(self.max_upload_bytes.saturating_add(1024 * 1024)).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.max_upload_bytes, 5_368_709_120);
        assert_eq!(config.download_url_ttl, Duration::from_secs(300));
        assert!(!config.is_production());
        assert!(config.body_limit() as u64 > config.max_upload_bytes);
    }
}
