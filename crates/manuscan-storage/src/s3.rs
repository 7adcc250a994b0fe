//! S3-compatible bucket access through `object_store`.

use crate::traits::{ByteStream, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use manuscan_core::Config;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, PutPayload};
use std::time::Instant;

/// Bucket coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for MinIO, GCS interop and similar providers
    pub endpoint: Option<String>,
}

impl S3Settings {
    pub fn from_config(config: &Config) -> StorageResult<Self> {
        let bucket = config
            .s3_bucket()
            .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
        let region = config.s3_region().or_else(|| config.aws_region()).ok_or_else(|| {
            StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
        })?;

        Ok(Self {
            bucket: bucket.to_string(),
            region: region.to_string(),
            endpoint: config.s3_endpoint().map(|e| e.trim_end_matches('/').to_string()),
        })
    }

    /// Path-style URL on custom endpoints, virtual-hosted style on AWS.
    fn object_url(&self, key: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key),
            None => format!("https://{}.s3.{}.amazonaws.com/{}", self.bucket, self.region, key),
        }
    }
}

#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    settings: S3Settings,
}

impl S3Storage {
    /// Credentials come from the standard `AWS_*` environment variables.
    pub fn new(settings: S3Settings) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(settings.region.as_str())
            .with_bucket_name(settings.bucket.as_str());

        if let Some(endpoint) = &settings.endpoint {
            builder = builder
                .with_endpoint(endpoint.as_str())
                .with_allow_http(endpoint.starts_with("http://"));
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self { store, settings })
    }

    fn read_error(&self, key: &str, started: Instant, err: ObjectStoreError) -> StorageError {
        if let ObjectStoreError::NotFound { .. } = err {
            return StorageError::NotFound(key.to_string());
        }
        tracing::error!(
            error = %err,
            bucket = %self.settings.bucket,
            path = %key,
            duration_ms = started.elapsed().as_millis() as u64,
            "S3 read failed"
        );
        StorageError::DownloadFailed(err.to_string())
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put_object(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        let started = Instant::now();
        let size_bytes = data.len();

        self.store
            .put(&Path::from(storage_key), PutPayload::from(Bytes::from(data)))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, path = %storage_key, size_bytes, "S3 write failed");
                StorageError::UploadFailed(e.to_string())
            })?;

        tracing::debug!(
            path = %storage_key,
            size_bytes,
            duration_ms = started.elapsed().as_millis() as u64,
            "S3 object written"
        );
        Ok(self.settings.object_url(storage_key))
    }

    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream> {
        let started = Instant::now();
        let object = self
            .store
            .get(&Path::from(storage_key))
            .await
            .map_err(|e| self.read_error(storage_key, started, e))?;

        let path = storage_key.to_string();
        let stream = object.into_stream().map(move |chunk| {
            chunk.map_err(|e| {
                tracing::error!(error = %e, path = %path, "S3 stream interrupted");
                StorageError::DownloadFailed(e.to_string())
            })
        });

        Ok(Box::pin(stream))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let started = Instant::now();

        match self.store.delete(&Path::from(storage_key)).await {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {
                tracing::info!(
                    bucket = %self.settings.bucket,
                    path = %storage_key,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "S3 object deleted"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, path = %storage_key, "S3 delete failed");
                Err(StorageError::DeleteFailed(e.to_string()))
            }
        }
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        match self.store.head(&Path::from(storage_key)).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
