//! CSV file endpoints.

use axum::{
    extract::{rejection::PathRejection, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;

use super::super::auth::AuthUser;
use super::super::error::ApiError;
use super::super::AppState;
use super::helpers::read_upload;
use crate::models::{EventType, StoredFile};
use crate::services::{FileDetail, UploadResponse};

const DEFAULT_CSV_CONTENT_TYPE: &str = "text/csv";

fn file_not_found() -> ApiError {
    ApiError::NotFound("File not found".to_string())
}

/// Upload and validate a CSV file. Restricted to the upload role.
pub async fn upload_file(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    user.require_role(&state.upload_role)?;

    let form = read_upload(multipart).await?;
    if !form.filename.to_lowercase().ends_with(".csv") {
        return Err(ApiError::BadRequest("The file must be a CSV".to_string()));
    }
    let param1 = form.required_field("param1")?;
    let param2 = form.required_field("param2")?;

    let content_type = if form.content_type.is_empty() {
        DEFAULT_CSV_CONTENT_TYPE
    } else {
        form.content_type.as_str()
    };

    let response = state
        .files
        .upload_and_validate(
            form.content,
            &form.filename,
            content_type,
            user.user_id(),
            param1,
            param2,
        )
        .await
        .map_err(|e| ApiError::internal("Error processing the file", e))?;

    state
        .events
        .record(
            EventType::FileUpload,
            &format!("File {} uploaded", form.filename),
            Some(user.user_id()),
            Some(json!({
                "file_id": response.file_id,
                "filename": form.filename,
                "issues": response.validations.len(),
            })),
        )
        .await;

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_files(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<StoredFile>>, ApiError> {
    Ok(Json(state.files.list_for_user(user.user_id()).await?))
}

pub async fn get_file(
    State(state): State<AppState>,
    user: AuthUser,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<FileDetail>, ApiError> {
    let Path(file_id) = path?;
    state
        .files
        .get_for_user(file_id, user.user_id())
        .await?
        .map(Json)
        .ok_or_else(file_not_found)
}

pub async fn delete_file(
    State(state): State<AppState>,
    user: AuthUser,
    path: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(file_id) = path?;
    if state.files.delete_for_user(file_id, user.user_id()).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(file_not_found())
    }
}
