//! Login endpoint.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use serde_json::json;

use super::super::error::ApiError;
use super::super::AppState;
use crate::models::EventType;
use crate::services::TokenPair;

/// Shortest password accepted by the login form.
const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, ApiError> {
    let Json(request) = payload?;

    if request.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::Unprocessable(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_CHARS
        )));
    }

    let result = state
        .auth
        .login(&request.username, &request.password)
        .await
        .map_err(|e| ApiError::internal("Login failed", e))?;

    match result {
        Some(pair) => {
            let user_id = state
                .jwt
                .decode_token(&pair.access_token)
                .map(|claims| claims.id_usuario);
            state
                .events
                .record(
                    EventType::UserInteraction,
                    &format!("User {} logged in", request.username),
                    user_id,
                    Some(json!({ "username": request.username, "success": true })),
                )
                .await;
            Ok(Json(pair))
        }
        None => {
            state
                .events
                .record(
                    EventType::UserInteraction,
                    &format!("Failed login attempt for {}", request.username),
                    None,
                    Some(json!({ "username": request.username, "success": false })),
                )
                .await;
            Err(ApiError::Unauthorized("Invalid credentials".to_string()))
        }
    }
}
