//! Token renewal endpoint.

use axum::{extract::State, Json};

use super::super::auth::AuthUser;
use super::super::error::ApiError;
use super::super::AppState;
use crate::models::EventType;
use crate::services::TokenPair;

pub async fn renew_token(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<TokenPair>, ApiError> {
    let pair = state.tokens.renew_token(&user.token).ok_or_else(|| {
        ApiError::Unauthorized("Could not renew the token; it may have expired".to_string())
    })?;

    state
        .events
        .record(
            EventType::TokenRenewal,
            &format!("Token renewed for {}", user.claims.sub),
            Some(user.user_id()),
            None,
        )
        .await;

    Ok(Json(pair))
}
