//! The `Storage` trait and its error type.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object write failed: {0}")]
    UploadFailed(String),

    #[error("Object read failed: {0}")]
    DownloadFailed(String),

    #[error("Object removal failed: {0}")]
    DeleteFailed(String),

    #[error("No object at {0}")]
    NotFound(String),

    #[error("Rejected object key: {0}")]
    InvalidKey(String),

    #[error("Object store error: {0}")]
    BackendError(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("Storage misconfigured: {0}")]
    ConfigError(String),
}

impl StorageError {
    /// True when the object is simply absent, as opposed to unreachable.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Object body delivered chunk by chunk
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// The shared bucket manuscripts land in.
///
/// Keys are the object paths carried by storage events. The scan pipeline
/// only reads and deletes; `put_object` exists for seeding and local setups.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` under `storage_key`, returning the object's URL.
    async fn put_object(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Stream an object without buffering it whole
    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream>;

    /// Remove an object. A missing object counts as removed.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    fn backend_type(&self) -> StorageBackend;
}
