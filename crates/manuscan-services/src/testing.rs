//! In-process doubles for the scanner, mail transports, and storage.
//!
//! Enabled for this crate's tests and, through the `test-util` feature, for
//! downstream integration tests.

use crate::mail::MailTransport;
use crate::scanner::MalwareScanner;
use async_trait::async_trait;
use manuscan_core::models::{EmailMessage, ScanResult};
use manuscan_core::{DeliveryError, ScanError};
use manuscan_storage::{ByteStream, Storage, StorageBackend, StorageError, StorageResult};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum TransportBehavior {
    /// Accept the message and return this id
    Accept(Option<String>),
    /// Fail with this reason
    Reject(String),
    /// Never complete
    Hang,
}

pub struct FakeTransport {
    name: &'static str,
    behavior: TransportBehavior,
    attempts: AtomicUsize,
    delivered: Mutex<Vec<EmailMessage>>,
}

impl FakeTransport {
    pub fn new(name: &'static str, behavior: TransportBehavior) -> Self {
        Self {
            name,
            behavior,
            attempts: AtomicUsize::new(0),
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Messages this transport accepted
    pub fn delivered(&self) -> Vec<EmailMessage> {
        self.delivered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl MailTransport for FakeTransport {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn deliver(&self, message: &EmailMessage) -> Result<Option<String>, DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            TransportBehavior::Accept(id) => {
                self.delivered
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(message.clone());
                Ok(id.clone())
            }
            TransportBehavior::Reject(reason) => Err(DeliveryError::failed(self.name, reason.clone())),
            TransportBehavior::Hang => {
                std::future::pending::<()>().await;
                Ok(None)
            }
        }
    }
}

/// One call to `FakeScanner::scan_file`
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    /// File contents at scan time
    pub contents: Vec<u8>,
}

/// Scanner returning a fixed verdict and recording what it was shown.
pub struct FakeScanner {
    verdict: Result<ScanResult, ScanError>,
    scanned: Mutex<Vec<ScannedFile>>,
}

impl FakeScanner {
    pub fn clean() -> Self {
        Self::with_verdict(Ok(ScanResult::clean()))
    }

    pub fn infected(viruses: &[&str]) -> Self {
        Self::with_verdict(Ok(ScanResult::infected(
            viruses.iter().map(|v| v.to_string()).collect(),
        )))
    }

    pub fn failing(error: ScanError) -> Self {
        Self::with_verdict(Err(error))
    }

    pub fn with_verdict(verdict: Result<ScanResult, ScanError>) -> Self {
        Self {
            verdict,
            scanned: Mutex::new(Vec::new()),
        }
    }

    pub fn scanned(&self) -> Vec<ScannedFile> {
        self.scanned
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl MalwareScanner for FakeScanner {
    async fn scan_file(&self, path: &Path) -> Result<ScanResult, ScanError> {
        let contents = tokio::fs::read(path)
            .await
            .map_err(|e| ScanError::Unreachable(format!("cannot read {}: {}", path.display(), e)))?;
        self.scanned
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ScannedFile {
                path: path.to_path_buf(),
                contents,
            });
        self.verdict.clone()
    }

    async fn ping(&self) -> Result<(), ScanError> {
        match &self.verdict {
            Err(e) => Err(e.clone()),
            Ok(_) => Ok(()),
        }
    }
}

/// Storage wrapper that can be told to fail downloads or deletes.
pub struct FlakyStorage {
    inner: Arc<dyn Storage>,
    fail_downloads: AtomicBool,
    fail_deletes: AtomicBool,
    downloads: AtomicUsize,
}

impl FlakyStorage {
    pub fn new(inner: Arc<dyn Storage>) -> Self {
        Self {
            inner,
            fail_downloads: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            downloads: AtomicUsize::new(0),
        }
    }

    pub fn fail_downloads(&self, fail: bool) {
        self.fail_downloads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Number of download attempts seen
    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for FlakyStorage {
    async fn put_object(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String> {
        self.inner.put_object(storage_key, data, content_type).await
    }

    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(StorageError::DownloadFailed("injected failure".to_string()));
        }
        self.inner.download_stream(storage_key).await
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::DeleteFailed("injected failure".to_string()));
        }
        self.inner.delete(storage_key).await
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        self.inner.exists(storage_key).await
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }
}
