/**
 * Authentication
 *
 * Requests and WebSocket upgrades carry an HS256 JWT whose `sub` claim is the
 * username. Tokens are issued by the account service; this server only
 * verifies them with the shared `JWT_SECRET`.
 *
 * The token is read from the `Authorization: Bearer <token>` header, or from
 * the `access_token` query parameter for browser WebSocket clients, which
 * cannot set headers on the upgrade request.
 */

use axum::{
    extract::{FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    pub exp: u64,
    pub iat: u64,
}

/// Verify `token` and return its claims
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, BackendError> {
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map_err(|e| BackendError::unauthorized(format!("invalid token: {e}")))?;

    if data.claims.sub.trim().is_empty() {
        return Err(BackendError::unauthorized("token has no subject"));
    }
    Ok(data.claims)
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    access_token: Option<String>,
}

fn bearer_token(parts: &Parts) -> Option<String> {
    if let Some(header) = parts.headers.get(AUTHORIZATION) {
        return header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string());
    }
    Query::<TokenQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(query)| query.access_token)
}

/// Axum extractor for the authenticated username
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser(pub String);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            tracing::warn!("[Auth] Missing bearer token");
            BackendError::unauthorized("missing bearer token")
        })?;

        let claims = verify_token(&token, &state.config.jwt_secret)?;
        Ok(AuthUser(claims.sub))
    }
}
