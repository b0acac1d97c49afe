//! Router configuration for the web server.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        // Authentication
        .route("/api/auth/login", post(handlers::login))
        .route("/api/tokens/renew", post(handlers::renew_token))
        // CSV files
        .route("/api/files/upload", post(handlers::upload_file))
        .route("/api/files", get(handlers::list_files))
        .route(
            "/api/files/:file_id",
            get(handlers::get_file).delete(handlers::delete_file),
        )
        // Document analysis
        .route("/api/documents/analyze", post(handlers::analyze_document))
        .route("/api/documents", get(handlers::list_documents))
        .route(
            "/api/documents/:document_id",
            get(handlers::get_document).delete(handlers::delete_document),
        )
        // Audit history
        .route("/api/history/events", get(handlers::list_events))
        .route("/api/history/events/export", get(handlers::export_events))
        // HTML pages
        .route("/web/documents", get(handlers::documents_page))
        .route("/web/history", get(handlers::history_page))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
