//! Helper types and utility functions for handlers.

use axum::extract::Multipart;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::super::error::ApiError;

/// Name of the multipart part carrying the uploaded file.
const FILE_FIELD: &str = "file";

/// A file part plus any text parts sent with it.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub filename: String,
    /// Empty when the client did not send a usable content type.
    pub content_type: String,
    pub content: Vec<u8>,
    pub fields: Vec<(String, String)>,
}

impl UploadForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// A text part that must be present.
    pub fn required_field(&self, name: &str) -> Result<String, ApiError> {
        self.field(name)
            .map(str::to_string)
            .ok_or_else(|| ApiError::Unprocessable(format!("Missing form field '{}'", name)))
    }
}

/// Read a multipart body, requiring a `file` part.
pub async fn read_upload(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();
    let mut has_file = false;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == FILE_FIELD {
            form.filename = field.file_name().unwrap_or_default().to_string();
            form.content_type = field
                .content_type()
                .filter(|ct| *ct != "application/octet-stream")
                .unwrap_or_default()
                .to_string();
            form.content = field.bytes().await?.to_vec();
            has_file = true;
        } else {
            let value = field.text().await?;
            form.fields.push((name, value));
        }
    }

    if !has_file || form.filename.is_empty() {
        return Err(ApiError::Unprocessable(
            "Missing file upload in field 'file'".to_string(),
        ));
    }
    Ok(form)
}

/// Parse a timestamp query parameter.
///
/// Accepts RFC 3339, a naive date-time (taken as UTC) or a bare date
/// (midnight UTC).
pub fn parse_datetime_param(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Treat an empty query value like an absent one.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
