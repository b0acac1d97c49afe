//! Service information endpoints.

use axum::{extract::State, Json};
use serde_json::{json, Value};

use super::super::AppState;

/// Landing endpoint describing the API.
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": &*state.app_name,
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/web/documents",
    }))
}

/// Health check endpoint for container orchestration.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
