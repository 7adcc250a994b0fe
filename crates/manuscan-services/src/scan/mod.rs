//! Upload scanning pipeline
//!
//! `UploadScanTrigger` receives storage finalize events, copies watched
//! uploads to a scratch file, and runs the malware scanner. `VerdictHandler`
//! acts on the result: infected files are deleted and their submissions
//! rejected.

mod scratch;
mod trigger;
mod verdict;

pub use scratch::ScratchFile;
pub use trigger::UploadScanTrigger;
pub use verdict::VerdictHandler;

use manuscan_core::{AppError, ScanError};
use manuscan_storage::StorageError;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// What to do when the scanner cannot produce a verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanFailurePolicy {
    /// Log and leave the file and records untouched
    #[default]
    FailOpen,
    /// Propagate the scan error so the event is redelivered
    FailClosed,
}

impl ScanFailurePolicy {
    pub fn from_fail_closed(fail_closed: bool) -> Self {
        if fail_closed {
            ScanFailurePolicy::FailClosed
        } else {
            ScanFailurePolicy::FailOpen
        }
    }
}

/// Result of updating one submission after an infected verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RecordOutcome {
    pub submission_id: Uuid,
    pub updated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What the pipeline did with one upload event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Path outside the watched prefix; nothing was read or changed
    Ignored,
    Clean,
    Infected {
        object_deleted: bool,
        records: Vec<RecordOutcome>,
    },
    /// Scanner failed and the fail-open policy left everything in place
    ScanFailed { reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to download {path}: {source}")]
    Download {
        path: String,
        #[source]
        source: StorageError,
    },

    #[error("Failed to write scratch file: {0}")]
    Scratch(#[from] std::io::Error),

    #[error(transparent)]
    Scan(#[from] ScanError),
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Download { .. } => AppError::Download(err.to_string()),
            PipelineError::Scratch(e) => AppError::Internal(format!("Scratch file error: {}", e)),
            PipelineError::Scan(e) => AppError::Scan(e),
        }
    }
}
