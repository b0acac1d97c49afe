//! Filesystem backend.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use super::{ObjectStore, StorageError};

/// Stores objects as files below a root directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to a path, refusing keys that would leave the root.
    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

async fn write_all(file: &mut tokio::fs::File, content: &[u8]) -> std::io::Result<()> {
    file.write_all(content).await?;
    file.flush().await
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn upload(
        &self,
        key: &str,
        content: &[u8],
        _content_type: &str,
    ) -> Result<String, StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = write_all(&mut file, content).await {
            drop(file);
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e.into());
        }
        Ok(format!("file://{}", path.display()))
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn presigned_url(
        &self,
        key: &str,
        _expires_in: Duration,
    ) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        Ok(path
            .exists()
            .then(|| format!("file://{}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_upload_presign_delete() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        let url = store
            .upload("uploads/1/data.csv", b"a,b\n1,2\n", "text/csv")
            .await
            .unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("uploads/1/data.csv"));
        assert_eq!(
            std::fs::read(dir.path().join("uploads/1/data.csv")).unwrap(),
            b"a,b\n1,2\n"
        );

        let presigned = store
            .presigned_url("uploads/1/data.csv", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(presigned.is_some());

        assert!(store.delete("uploads/1/data.csv").await.unwrap());
        assert!(!store.delete("uploads/1/data.csv").await.unwrap());
        assert!(store
            .presigned_url("uploads/1/data.csv", Duration::from_secs(60))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        for key in ["../outside.csv", "/etc/passwd", "a/../../b", ""] {
            assert!(matches!(
                store.upload(key, &[], "text/csv").await,
                Err(StorageError::InvalidKey(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_upload_never_replaces_existing_object() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        store
            .upload("uploads/1/same.csv", b"a\nFIRST\n", "text/csv")
            .await
            .unwrap();
        let second = store
            .upload("uploads/1/same.csv", b"a\nSECOND\n", "text/csv")
            .await;

        assert!(matches!(second, Err(StorageError::AlreadyExists(_))));
        assert_eq!(
            std::fs::read(dir.path().join("uploads/1/same.csv")).unwrap(),
            b"a\nFIRST\n"
        );
    }
}
