//! Malware scanning of local files

#[cfg(feature = "clamav")]
pub mod clamav;

#[cfg(feature = "clamav")]
pub use clamav::{parse_scan_response, ClamAVScanner};

use async_trait::async_trait;
use manuscan_core::models::ScanResult;
use manuscan_core::ScanError;
use std::path::Path;

/// A malware scanner that inspects files on local disk.
///
/// Implementations only read the file; removing it is the caller's job.
#[async_trait]
pub trait MalwareScanner: Send + Sync {
    async fn scan_file(&self, path: &Path) -> Result<ScanResult, ScanError>;

    /// Check that the scanner daemon is reachable
    async fn ping(&self) -> Result<(), ScanError>;
}
