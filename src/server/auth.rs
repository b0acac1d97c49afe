//! Bearer token extraction and role checks.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::error::ApiError;
use super::AppState;
use crate::auth::Claims;

/// The caller, as identified by a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub claims: Claims,
    /// The raw token, needed for renewal.
    pub token: String,
}

impl AuthUser {
    pub fn user_id(&self) -> i32 {
        self.claims.id_usuario
    }

    pub fn require_role(&self, role: &str) -> Result<(), ApiError> {
        if self.claims.rol == role {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!("Role required: {}", role)))
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(ApiError::invalid_token)?;
        let claims = state
            .jwt
            .decode_token(token)
            .ok_or_else(ApiError::invalid_token)?;

        Ok(Self {
            claims,
            token: token.to_string(),
        })
    }
}
