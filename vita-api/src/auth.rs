//! Authentication for VITA API requests.
//!
//! Token validation only: credentials, registration, and token issuance are
//! handled by an external identity service. This module verifies HS256
//! bearer tokens and resolves them to a `UserId` via the `AuthUser`
//! extractor. `generate_token` exists for tests and local tooling.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use vita_core::UserId;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Authentication configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 signing secret shared with the identity service.
    pub jwt_secret: String,
}

impl AuthConfig {
    /// Create AuthConfig from environment variables.
    ///
    /// Environment variables:
    /// - `VITA_JWT_SECRET`: Shared HS256 secret (default: "change_me", dev only)
    pub fn from_env() -> Self {
        let jwt_secret = std::env::var("VITA_JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("VITA_JWT_SECRET not set; using insecure development secret");
            "change_me".to_string()
        });
        Self { jwt_secret }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the secret.
        f.debug_struct("AuthConfig").finish_non_exhaustive()
    }
}

// ============================================================================
// CLAIMS
// ============================================================================

/// JWT claims carried by VITA access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: decimal user id.
    pub sub: String,
    /// Expiry as a Unix timestamp.
    pub exp: i64,
}

/// Validate a bearer token and extract the user id.
pub fn validate_token(config: &AuthConfig, token: &str) -> ApiResult<UserId> {
    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let validation = Validation::new(Algorithm::HS256);

    let data = decode::<Claims>(token, &key, &validation).map_err(|err| {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => ApiError::token_expired(),
            _ => ApiError::invalid_token("Token validation failed"),
        }
    })?;

    data.claims
        .sub
        .parse::<UserId>()
        .map_err(|_| ApiError::invalid_token("Token subject is not a user id"))
}

/// Mint a token for `user_id`, valid for `ttl_secs` seconds. Used by tests
/// and local tooling; production tokens come from the identity service.
pub fn generate_token(config: &AuthConfig, user_id: UserId, ttl_secs: i64) -> ApiResult<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: chrono::Utc::now().timestamp() + ttl_secs,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|err| ApiError::internal_error(format!("Failed to sign token: {}", err)))
}

// ============================================================================
// EXTRACTOR
// ============================================================================

/// Extractor resolving the authenticated user from the Authorization header.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AuthConfig::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Expected Bearer authentication"))?;

        let user_id = validate_token(&config, token)?;
        Ok(AuthUser(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
        }
    }

    #[test]
    fn test_token_round_trip() {
        let config = config();
        let token = generate_token(&config, 42, 3600).unwrap();
        let user_id = validate_token(&config, &token).unwrap();
        assert_eq!(user_id, 42);
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = config();
        let token = generate_token(&config, 42, -3600).unwrap();
        let err = validate_token(&config, &token).unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenExpired);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = generate_token(&config(), 42, 3600).unwrap();
        let other = AuthConfig {
            jwt_secret: "other-secret".to_string(),
        };
        let err = validate_token(&other, &token).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidToken);
    }

    #[test]
    fn test_garbage_token_rejected() {
        let err = validate_token(&config(), "not-a-token").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidToken);
    }

    #[test]
    fn test_debug_hides_secret() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("test-secret"));
    }
}
