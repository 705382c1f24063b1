//! Bearer token authentication
//!
//! Tokens are issued elsewhere; this module only verifies them and turns the
//! claims into an [`Actor`].

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use crate::handlers::AppState;
use crate::models::{Actor, Role};
use crate::utils::errors::VolunteerHubError;

/// HS256 token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i64,
    pub role: Role,
    /// Expiration (UTC Unix timestamp)
    pub exp: i64,
}

/// Verify an HS256 token against `secret`
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, VolunteerHubError> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|_| VolunteerHubError::Authentication("invalid or expired token".to_string()))
}

/// The authenticated caller of a request
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Actor);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = VolunteerHubError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| VolunteerHubError::Authentication("missing Authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| VolunteerHubError::Authentication("expected a Bearer token".to_string()))?;

        let claims = verify_token(token, &state.settings.auth.jwt_secret)?;
        Ok(AuthUser(Actor::new(claims.sub, claims.role)))
    }
}
