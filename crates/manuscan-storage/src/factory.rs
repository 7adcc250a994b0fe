#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::{s3::S3Settings, S3Storage};
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use manuscan_core::Config;
use std::sync::Arc;

/// Build the configured backend. S3 unless `STORAGE_BACKEND=local`.
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend().unwrap_or(StorageBackend::S3) {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let settings = S3Settings::from_config(config)?;
            tracing::debug!(bucket = %settings.bucket, region = %settings.region, "Using S3 storage");
            Ok(Arc::new(S3Storage::new(settings)?))
        }

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let root = config.local_storage_path().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            tracing::debug!(root = %root, "Using local storage");
            Ok(Arc::new(LocalStorage::new(root).await?))
        }

        #[allow(unreachable_patterns)]
        other => Err(StorageError::ConfigError(format!(
            "storage backend '{}' was not compiled in",
            other
        ))),
    }
}
