//! Bearer token authentication.
//!
//! Users present an HS256 JWT whose `sub` is their user id. Admin routes
//! take the static `ADMIN_API_TOKEN` instead.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Decoded user token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Expiration
    pub exp: i64,
    /// Issued at
    #[serde(default)]
    pub iat: Option<i64>,
}

/// Verifies user bearer tokens against the shared secret.
pub struct TokenVerifier {
    key: Option<DecodingKey>,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: Option<&str>) -> Self {
        if secret.is_none() {
            warn!("AUTH_JWT_SECRET not set, all authenticated routes will reject");
        }
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            key: secret.map(|s| DecodingKey::from_secret(s.as_bytes())),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| ApiError::unauthorized("Authentication is not configured"))?;

        let data = decode::<Claims>(token, key, &self.validation).map_err(|e| {
            debug!(error = %e, "Token rejected");
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ApiError::unauthorized("Token expired")
                }
                _ => ApiError::unauthorized("Invalid token"),
            }
        })?;

        if data.claims.sub.trim().is_empty() {
            return Err(ApiError::unauthorized("Token missing subject"));
        }
        Ok(data.claims)
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let header = parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header format"))
}

/// Authenticated user extracted from request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
}

/// Axum extractor for authenticated user. Provisions an empty credit
/// account on first sight.
#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.tokens.verify(token)?;
        state.db.credits().ensure_account(&claims.sub).await?;
        Ok(AuthUser { uid: claims.sub })
    }
}

/// Marker extractor for requests bearing the admin token.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth;

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let expected = state
            .config
            .admin_token
            .as_deref()
            .ok_or_else(|| ApiError::forbidden("Admin access is disabled"))?;
        let token = bearer_token(parts)?;
        if !constant_time_eq(token.as_bytes(), expected.as_bytes()) {
            warn!("Rejected admin request with bad token");
            return Err(ApiError::forbidden("Invalid admin token"));
        }
        Ok(AdminAuth)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, sub: &str, exp_offset: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: sub.to_string(),
            exp: now + exp_offset,
            iat: Some(now),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_valid_token() {
        let verifier = TokenVerifier::new(Some("s3cret"));
        let claims = verifier.verify(&token("s3cret", "user_1", 600)).unwrap();
        assert_eq!(claims.sub, "user_1");
    }

    #[test]
    fn test_wrong_secret_and_expiry_rejected() {
        let verifier = TokenVerifier::new(Some("s3cret"));
        assert!(verifier.verify(&token("other", "user_1", 600)).is_err());
        assert!(verifier.verify(&token("s3cret", "user_1", -3600)).is_err());
    }

    #[test]
    fn test_unconfigured_rejects() {
        let verifier = TokenVerifier::new(None);
        assert!(verifier.verify(&token("s3cret", "user_1", 600)).is_err());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
