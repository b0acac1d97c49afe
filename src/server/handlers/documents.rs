//! Document analysis endpoints.

use axum::{
    extract::{rejection::PathRejection, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::super::auth::AuthUser;
use super::super::error::ApiError;
use super::super::AppState;
use super::helpers::{non_empty, read_upload};
use crate::models::{Document, DocumentType, EventType};
use crate::services::document::{is_allowed_document, ALLOWED_EXTENSIONS};
use crate::services::AnalysisResponse;

/// Query params for listing documents.
#[derive(Debug, Deserialize)]
pub struct DocumentQuery {
    pub document_type: Option<String>,
}

fn document_not_found() -> ApiError {
    ApiError::NotFound("Document not found".to_string())
}

/// Analyze an uploaded PDF or image.
pub async fn analyze_document(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<AnalysisResponse>), ApiError> {
    let form = read_upload(multipart).await?;
    if !is_allowed_document(&form.filename) {
        return Err(ApiError::BadRequest(format!(
            "File type not allowed. Allowed: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    let user_id = user.user_id();
    state
        .events
        .record(
            EventType::DocumentUpload,
            &format!("Document {} uploaded", form.filename),
            Some(user_id),
            Some(json!({ "filename": form.filename, "size": form.content.len() })),
        )
        .await;

    let result = state
        .documents
        .analyze_document(form.content, &form.filename, &form.content_type, user_id)
        .await;

    match result {
        Ok(response) => {
            state
                .events
                .record(
                    EventType::AiProcessing,
                    &format!(
                        "Document {} analyzed as {}",
                        form.filename, response.document_type
                    ),
                    Some(user_id),
                    Some(json!({
                        "document_id": response.document_id,
                        "document_type": response.document_type,
                        "success": true,
                    })),
                )
                .await;
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(e) => {
            state
                .events
                .record(
                    EventType::AiProcessing,
                    &format!("Analysis of document {} failed", form.filename),
                    Some(user_id),
                    Some(json!({ "error": e.to_string(), "success": false })),
                )
                .await;
            Err(ApiError::internal("Error analyzing the document", e))
        }
    }
}

pub async fn list_documents(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<DocumentQuery>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let document_type = match non_empty(&params.document_type) {
        Some(value) => Some(DocumentType::from_str(value).ok_or_else(|| {
            ApiError::BadRequest(format!("Invalid document type: {}", value))
        })?),
        None => None,
    };

    Ok(Json(
        state
            .documents
            .list_for_user(user.user_id(), document_type)
            .await?,
    ))
}

pub async fn get_document(
    State(state): State<AppState>,
    user: AuthUser,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Document>, ApiError> {
    let Path(document_id) = path?;
    state
        .documents
        .get_for_user(document_id, user.user_id())
        .await?
        .map(Json)
        .ok_or_else(document_not_found)
}

pub async fn delete_document(
    State(state): State<AppState>,
    user: AuthUser,
    path: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(document_id) = path?;
    if state
        .documents
        .delete_for_user(document_id, user.user_id())
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(document_not_found())
    }
}
