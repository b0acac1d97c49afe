//! HTML pages.

use axum::{extract::State, response::Html};

use super::super::templates;
use super::super::AppState;

pub async fn documents_page(State(state): State<AppState>) -> Html<String> {
    Html(templates::documents_page(&state.app_name))
}

pub async fn history_page(State(state): State<AppState>) -> Html<String> {
    Html(templates::history_page(&state.app_name))
}
