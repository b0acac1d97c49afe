//! CSV upload and validation use case.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::{store_new_object, ServiceError};
use crate::models::{FileStatus, NewStoredFile, StoredFile, ValidationIssue};
use crate::repository::DieselFileRepository;
use crate::storage::ObjectStore;
use crate::validation::validate_csv;

/// Result of an upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub file_id: i32,
    pub s3_url: String,
    pub validations: Vec<ValidationIssue>,
    pub param1: String,
    pub param2: String,
}

/// A stored file with a temporary download link.
#[derive(Debug, Clone, Serialize)]
pub struct FileDetail {
    #[serde(flatten)]
    pub file: StoredFile,
    pub download_url: Option<String>,
}

/// Prefix of uploaded CSV object keys.
pub const UPLOAD_PREFIX: &str = "uploads";

#[derive(Clone)]
pub struct FileService {
    files: DieselFileRepository,
    store: Arc<dyn ObjectStore>,
    presign_ttl: Duration,
}

impl FileService {
    pub fn new(files: DieselFileRepository, store: Arc<dyn ObjectStore>, presign_ttl: Duration) -> Self {
        Self {
            files,
            store,
            presign_ttl,
        }
    }

    /// Store the file, validate it and record the result.
    ///
    /// Nothing is recorded when the upload fails. The file is `completed`
    /// when validation found nothing, otherwise `pending`.
    pub async fn upload_and_validate(
        &self,
        content: Vec<u8>,
        filename: &str,
        content_type: &str,
        user_id: i32,
        param1: String,
        param2: String,
    ) -> Result<UploadResponse, ServiceError> {
        let file_size = content.len() as i64;
        let validations = validate_csv(&content);
        let (key, url) = store_new_object(
            self.store.as_ref(),
            UPLOAD_PREFIX,
            user_id,
            filename,
            Utc::now(),
            &content,
            content_type,
        )
        .await?;

        let status = if validations.is_empty() {
            FileStatus::Completed
        } else {
            FileStatus::Pending
        };

        let created = self
            .files
            .create(&NewStoredFile {
                filename: filename.to_string(),
                s3_key: key.clone(),
                s3_url: Some(url.clone()),
                file_size,
                content_type: content_type.to_string(),
                status,
                validations,
                user_id,
            })
            .await;
        let stored = match created {
            Ok(stored) => stored,
            Err(e) => {
                if let Err(cleanup) = self.store.delete(&key).await {
                    warn!("Failed to remove {} after database error: {}", key, cleanup);
                }
                return Err(e.into());
            }
        };

        info!(
            "Stored {} ({} bytes) as file {} with {} validation issues",
            stored.filename,
            stored.file_size,
            stored.id,
            stored.validations.len()
        );

        Ok(UploadResponse {
            file_id: stored.id,
            s3_url: stored.s3_url.unwrap_or(url),
            validations: stored.validations,
            param1,
            param2,
        })
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<StoredFile>, ServiceError> {
        Ok(self.files.get_by_user_id(user_id).await?)
    }

    async fn owned(&self, id: i32, user_id: i32) -> Result<Option<StoredFile>, ServiceError> {
        Ok(self
            .files
            .get_by_id(id)
            .await?
            .filter(|file| file.user_id == user_id))
    }

    /// A file owned by `user_id`, with a presigned download URL when the
    /// store can produce one.
    pub async fn get_for_user(
        &self,
        id: i32,
        user_id: i32,
    ) -> Result<Option<FileDetail>, ServiceError> {
        let Some(file) = self.owned(id, user_id).await? else {
            return Ok(None);
        };

        let download_url = match self.store.presigned_url(&file.s3_key, self.presign_ttl).await {
            Ok(url) => url,
            Err(e) => {
                warn!("Failed to presign {}: {}", file.s3_key, e);
                None
            }
        };

        Ok(Some(FileDetail { file, download_url }))
    }

    /// Remove the stored object, then the record. `false` when the file does
    /// not exist or belongs to someone else.
    pub async fn delete_for_user(&self, id: i32, user_id: i32) -> Result<bool, ServiceError> {
        let Some(file) = self.owned(id, user_id).await? else {
            return Ok(false);
        };

        if !self.store.delete(&file.s3_key).await? {
            warn!("Object {} was already gone", file.s3_key);
        }
        Ok(self.files.delete(file.id).await?)
    }
}
