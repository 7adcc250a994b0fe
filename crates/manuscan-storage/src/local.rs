//! Filesystem-backed storage for development and single-host deployments.

use crate::traits::{ByteStream, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use futures::StreamExt;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Objects stored as plain files under `root`, keyed by relative path.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Open storage rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::ConfigError(format!("cannot create {}: {}", root.display(), e))
        })?;
        Ok(Self { root })
    }

    /// Resolve a key under the root. Keys that could escape it are rejected.
    fn resolve(&self, storage_key: &str) -> StorageResult<PathBuf> {
        let escapes = storage_key.is_empty()
            || storage_key.starts_with('/')
            || storage_key.contains('\\')
            || storage_key.split('/').any(|segment| segment == "..");
        if escapes {
            return Err(StorageError::InvalidKey(storage_key.to_string()));
        }
        Ok(self.root.join(storage_key))
    }
}

fn read_error(storage_key: &str, err: std::io::Error) -> StorageError {
    if err.kind() == ErrorKind::NotFound {
        StorageError::NotFound(storage_key.to_string())
    } else {
        StorageError::DownloadFailed(format!("{}: {}", storage_key, err))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put_object(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        let path = self.resolve(storage_key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let write = async {
            let mut file = fs::File::create(&path).await?;
            file.write_all(&data).await?;
            file.sync_all().await
        };
        write
            .await
            .map_err(|e| StorageError::UploadFailed(format!("{}: {}", storage_key, e)))?;

        tracing::debug!(path = %storage_key, size_bytes = data.len(), "Local object written");
        Ok(format!("file://{}", path.display()))
    }

    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream> {
        let path = self.resolve(storage_key)?;
        let file = fs::File::open(&path)
            .await
            .map_err(|e| read_error(storage_key, e))?;

        let key = storage_key.to_string();
        let stream = tokio_util::io::ReaderStream::new(file).map(move |chunk| {
            chunk.map_err(|e| {
                tracing::error!(path = %key, error = %e, "Local object read interrupted");
                StorageError::DownloadFailed(format!("{}: {}", key, e))
            })
        });
        Ok(Box::pin(stream))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.resolve(storage_key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(path = %storage_key, "Local object deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!("{}: {}", storage_key, e))),
        }
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.resolve(storage_key)?;
        Ok(fs::try_exists(&path).await?)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
