//! Error types module
//!
//! Each pipeline concern has its own error type (validation, mail delivery,
//! scanning, record updates). `AppError` unifies them for callers that surface
//! errors over HTTP, and `ErrorMetadata` describes how each one is presented.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;
use uuid::Uuid;

/// Severity an error is logged at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Caller mistakes such as a blank field
    Debug,
    /// Upstream outages the caller can retry through
    Warn,
    Error,
}

/// How an error is presented to HTTP callers and in logs.
pub trait ErrorMetadata {
    fn http_status_code(&self) -> u16;

    /// Stable code clients branch on, e.g. `DELIVERY_FAILED`
    fn error_code(&self) -> &'static str;

    fn is_recoverable(&self) -> bool;

    fn suggested_action(&self) -> Option<&'static str>;

    /// Message safe to return to the caller
    fn client_message(&self) -> String;

    /// Details stay out of responses in production
    fn is_sensitive(&self) -> bool;

    fn log_level(&self) -> LogLevel;
}

/// A required input field was missing or blank.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// Mail could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("{transport} delivery failed: {reason}")]
    Failed {
        transport: &'static str,
        reason: String,
    },

    #[error("{transport} delivery timed out after {timeout_secs}s")]
    TimedOut {
        transport: &'static str,
        timeout_secs: u64,
    },

    #[error("Message could not be built for {transport}: {reason}")]
    InvalidMessage {
        transport: &'static str,
        reason: String,
    },
}

impl DeliveryError {
    pub fn failed(transport: &'static str, reason: impl Into<String>) -> Self {
        DeliveryError::Failed {
            transport,
            reason: reason.into(),
        }
    }

    /// Name of the transport that produced this error.
    pub fn transport(&self) -> &'static str {
        match self {
            DeliveryError::Failed { transport, .. }
            | DeliveryError::TimedOut { transport, .. }
            | DeliveryError::InvalidMessage { transport, .. } => transport,
        }
    }
}

/// The malware scanner could not produce a verdict.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("Scanner unreachable: {0}")]
    Unreachable(String),

    #[error("Scan timed out after {timeout_secs}s")]
    TimedOut { timeout_secs: u64 },

    #[error("Unexpected scanner response: {0}")]
    Protocol(String),

    #[error("Scan task failed: {0}")]
    Task(String),
}

/// A single submission record could not be updated.
#[derive(Debug, thiserror::Error)]
#[error("Failed to update submission {record_id}: {reason}")]
pub struct RecordUpdateError {
    pub record_id: Uuid,
    pub reason: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Mail delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

const MAX_CAUSE_DEPTH: usize = 5;
const RETRY_SHORTLY: &str = "Retry after a short delay";

/// Presentation of one `AppError` variant.
#[derive(Debug, Clone, Copy)]
struct ErrorProfile {
    status: u16,
    code: &'static str,
    level: LogLevel,
    recoverable: bool,
    action: Option<&'static str>,
    sensitive: bool,
}

impl ErrorProfile {
    const fn new(status: u16, code: &'static str, level: LogLevel) -> Self {
        Self {
            status,
            code,
            level,
            recoverable: false,
            action: None,
            sensitive: false,
        }
    }

    const fn hint(mut self, action: &'static str) -> Self {
        self.action = Some(action);
        self
    }

    const fn retryable(mut self, action: &'static str) -> Self {
        self.recoverable = true;
        self.hint(action)
    }

    const fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

impl AppError {
    fn profile(&self) -> ErrorProfile {
        use LogLevel::{Debug, Error, Warn};
        match self {
            AppError::Database(_) => {
                ErrorProfile::new(500, "DATABASE_ERROR", Error).retryable(RETRY_SHORTLY).sensitive()
            }
            AppError::Validation(_) => ErrorProfile::new(400, "INVALID_INPUT", Debug)
                .hint("Fill in every required field and try again"),
            AppError::Delivery(_) => {
                ErrorProfile::new(502, "DELIVERY_FAILED", Error).retryable(RETRY_SHORTLY)
            }
            AppError::Download(_) => ErrorProfile::new(502, "DOWNLOAD_FAILED", Error)
                .retryable("Redeliver the storage event")
                .sensitive(),
            AppError::Scan(_) => ErrorProfile::new(503, "SCAN_FAILED", Warn)
                .retryable("Retry once the scanner is reachable")
                .sensitive(),
            AppError::InvalidInput(_) => ErrorProfile::new(400, "INVALID_INPUT", Debug)
                .hint("Check request parameters and try again"),
            AppError::NotFound(_) => {
                ErrorProfile::new(404, "NOT_FOUND", Debug).hint("Verify the resource exists")
            }
            AppError::Unauthorized(_) => {
                ErrorProfile::new(401, "UNAUTHORIZED", Debug).hint("Check the service API key")
            }
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                ErrorProfile::new(500, "INTERNAL_ERROR", Error).retryable(RETRY_SHORTLY).sensitive()
            }
        }
    }

    /// Variant name reported as `error_type` outside production
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Database(_) => "Database",
            AppError::Validation(_) => "ValidationError",
            AppError::Delivery(_) => "DeliveryError",
            AppError::Download(_) => "DownloadError",
            AppError::Scan(_) => "ScanError",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::NotFound(_) => "NotFound",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// The error followed by up to five `Caused by:` lines from its source chain.
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();
        let causes = std::iter::successors(self.source(), |cause| (*cause).source());
        for (depth, cause) in causes.enumerate() {
            if depth == MAX_CAUSE_DEPTH {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", cause));
        }
        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        self.profile().status
    }

    fn error_code(&self) -> &'static str {
        self.profile().code
    }

    fn is_recoverable(&self) -> bool {
        self.profile().recoverable
    }

    fn suggested_action(&self) -> Option<&'static str> {
        self.profile().action
    }

    fn is_sensitive(&self) -> bool {
        self.profile().sensitive
    }

    fn log_level(&self) -> LogLevel {
        self.profile().level
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Validation(err) => err.to_string(),
            AppError::Delivery(err) => format!("Email could not be delivered: {}", err),
            AppError::InvalidInput(msg) | AppError::NotFound(msg) | AppError::Unauthorized(msg) => {
                msg.clone()
            }
            AppError::Database(_) => "Submission records are unavailable".to_string(),
            AppError::Download(_) => "Failed to fetch uploaded file".to_string(),
            AppError::Scan(_) => "Malware scanner unavailable".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}
