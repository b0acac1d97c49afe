//! Object storage for uploaded files.
//!
//! Production deployments keep objects in S3; the local backend stores them
//! under a directory and is used for development and tests.

mod local;
mod s3;

pub use local::LocalStore;
pub use s3::{S3Store, DEFAULT_PRESIGN_SECS};

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from an object storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("object already exists: {0}")]
    AlreadyExists(String),

    #[error("presigning failed: {0}")]
    Presign(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A key/value object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `content` under a new `key` and return the object's URL.
    ///
    /// Never replaces an existing object: a taken key fails with
    /// [`StorageError::AlreadyExists`].
    async fn upload(
        &self,
        key: &str,
        content: &[u8],
        content_type: &str,
    ) -> Result<String, StorageError>;

    /// Remove an object. Returns whether the backend acknowledged the delete.
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;

    /// A time-limited download URL, when the backend supports one.
    async fn presigned_url(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> Result<Option<String>, StorageError>;
}
