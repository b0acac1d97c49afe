//! Amazon S3 backend.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, error};

use super::{ObjectStore, StorageError};
use crate::config::S3Settings;

/// Default lifetime of presigned download URLs, in seconds.
pub const DEFAULT_PRESIGN_SECS: u64 = 3600;

const PRECONDITION_FAILED: u16 = 412;

/// Stores objects in a single S3 bucket.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
    region: String,
}

impl S3Store {
    /// Build a client from explicit keys when configured, otherwise from the
    /// default AWS credential chain.
    pub async fn from_settings(settings: &S3Settings) -> Self {
        let region = Region::new(settings.region.clone());

        let client = match (&settings.access_key_id, &settings.secret_access_key) {
            (Some(key_id), Some(secret)) => {
                let credentials =
                    Credentials::new(key_id.clone(), secret.clone(), None, None, "docanalysis");
                let config = aws_sdk_s3::Config::builder()
                    .behavior_version(BehaviorVersion::latest())
                    .region(region)
                    .credentials_provider(credentials)
                    .build();
                Client::from_conf(config)
            }
            _ => {
                let shared = aws_config::defaults(BehaviorVersion::latest())
                    .region(region)
                    .load()
                    .await;
                Client::new(&shared)
            }
        };

        Self {
            client,
            bucket: settings.bucket.clone(),
            region: settings.region.clone(),
        }
    }

    /// Public URL of an object in this bucket.
    pub fn object_url(&self, key: &str) -> String {
        object_url(&self.bucket, &self.region, key)
    }
}

/// `https://{bucket}.s3.{region}.amazonaws.com/{key}`
pub fn object_url(bucket: &str, region: &str, key: &str) -> String {
    format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, key)
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn upload(
        &self,
        key: &str,
        content: &[u8],
        content_type: &str,
    ) -> Result<String, StorageError> {
        debug!("Uploading {} bytes to s3://{}/{}", content.len(), self.bucket, key);

        // Conditional write: S3 answers 412 when the key is taken
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .if_none_match("*")
            .content_type(content_type)
            .body(ByteStream::from(content.to_vec()))
            .send()
            .await
            .map_err(|e| {
                let status = e.raw_response().map(|r| r.status().as_u16());
                if status == Some(PRECONDITION_FAILED) {
                    return StorageError::AlreadyExists(key.to_string());
                }
                error!("S3 upload of {} failed: {}", key, DisplayErrorContext(&e));
                StorageError::Backend(DisplayErrorContext(&e).to_string())
            })?;

        Ok(self.object_url(key))
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Backend(DisplayErrorContext(&e).to_string()))?;
        Ok(true)
    }

    async fn presigned_url(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> Result<Option<String>, StorageError> {
        let config =
            PresigningConfig::expires_in(expires_in).map_err(|e| StorageError::Presign(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(|e| StorageError::Presign(DisplayErrorContext(&e).to_string()))?;

        Ok(Some(request.uri().to_string()))
    }
}
