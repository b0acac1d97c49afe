//! Service layer for docanalysis business logic.
//!
//! This module contains domain logic separated from HTTP concerns.
//! Services are used by the web server and the CLI.

pub mod auth;
pub mod document;
pub mod event;
pub mod export;
pub mod file;
pub mod token;

pub use auth::{AuthService, TokenPair};
pub use document::{AnalysisResponse, DocumentService};
pub use event::{EventFilter, EventService};
pub use export::ExportFormat;
pub use file::{FileDetail, FileService, UploadResponse};
pub use token::TokenService;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use crate::auth::AuthError;
use crate::cognitive::CognitiveError;
use crate::repository::DieselError;
use crate::storage::{ObjectStore, StorageError};

/// Keys tried per upload before giving up on a free one.
const MAX_KEY_ATTEMPTS: u32 = 20;

/// Errors from the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("database error: {0}")]
    Database(#[from] DieselError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("analysis error: {0}")]
    Analysis(#[from] CognitiveError),

    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("export failed: {0}")]
    Export(String),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Sanitize a filename for use in an object key.
///
/// Path separators, characters reserved on common filesystems and control
/// characters become `_`. The result is at most 100 characters.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .take(100)
        .collect();

    let trimmed = cleaned.trim_matches(|c: char| c == '_' || c.is_whitespace());
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        "document".to_string()
    } else {
        trimmed.to_string()
    }
}

/// `YYYYmmdd_HHMMSS` in UTC, used to prefix object keys and export names.
pub fn timestamp_slug(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// `{prefix}/{user_id}/{slug}_{name}`; later attempts add `-{attempt}` to the slug.
pub fn object_key(prefix: &str, user_id: i32, slug: &str, attempt: u32, name: &str) -> String {
    if attempt == 0 {
        format!("{}/{}/{}_{}", prefix, user_id, slug, name)
    } else {
        format!("{}/{}/{}-{}_{}", prefix, user_id, slug, attempt, name)
    }
}

/// Upload under the first free key for `filename`, returning the key and URL.
///
/// Uploads in the same second share a slug, so a taken key moves on to the
/// next suffix instead of replacing the earlier object.
pub async fn store_new_object(
    store: &dyn ObjectStore,
    prefix: &str,
    user_id: i32,
    filename: &str,
    now: DateTime<Utc>,
    content: &[u8],
    content_type: &str,
) -> Result<(String, String), ServiceError> {
    let slug = timestamp_slug(now);
    let name = sanitize_filename(filename);

    for attempt in 0..MAX_KEY_ATTEMPTS {
        let key = object_key(prefix, user_id, &slug, attempt, &name);
        match store.upload(&key, content, content_type).await {
            Ok(url) => return Ok((key, url)),
            Err(StorageError::AlreadyExists(_)) => debug!("Key {} is taken", key),
            Err(e) => return Err(e.into()),
        }
    }

    Err(StorageError::AlreadyExists(object_key(prefix, user_id, &slug, 0, &name)).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStore;
    use chrono::TimeZone;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report.csv"), "report.csv");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("a:b*c?.pdf"), "a_b_c_.pdf");
        assert_eq!(sanitize_filename("///"), "document");
        assert_eq!(sanitize_filename(".."), "document");
        assert_eq!(sanitize_filename(""), "document");
    }

    #[test]
    fn test_sanitize_filename_truncates_by_character() {
        let long = format!("{}.csv", "é".repeat(150));
        let cleaned = sanitize_filename(&long);
        assert_eq!(cleaned.chars().count(), 100);
    }

    #[test]
    fn test_timestamp_slug() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
        assert_eq!(timestamp_slug(at), "20240305_070809");
    }

    #[test]
    fn test_object_key() {
        assert_eq!(
            object_key("uploads", 3, "20240305_070809", 0, "ventas.csv"),
            "uploads/3/20240305_070809_ventas.csv"
        );
        assert_eq!(
            object_key("documents", 3, "20240305_070809", 2, "scan.pdf"),
            "documents/3/20240305_070809-2_scan.pdf"
        );
    }

    #[tokio::test]
    async fn test_same_second_uploads_get_distinct_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();

        let (first, _) = store_new_object(&store, "uploads", 1, "same.csv", at, b"a\nFIRST\n", "text/csv")
            .await
            .unwrap();
        let (second, _) = store_new_object(&store, "uploads", 1, "same.csv", at, b"a\nSECOND\n", "text/csv")
            .await
            .unwrap();

        assert_eq!(first, "uploads/1/20240305_070809_same.csv");
        assert_eq!(second, "uploads/1/20240305_070809-1_same.csv");
        assert_eq!(std::fs::read(dir.path().join(&first)).unwrap(), b"a\nFIRST\n");
        assert_eq!(std::fs::read(dir.path().join(&second)).unwrap(), b"a\nSECOND\n");
    }
}
