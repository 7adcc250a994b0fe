//! Manuscan Services Layer
//!
//! Business services for the manuscript pipeline: malware scanning of
//! uploaded files, mail delivery with provider fallback, and composition of
//! reviewer-facing notifications. The API crate wires these together; keep
//! HTTP handling there and orchestration here.

pub mod mail;
pub mod notification;
pub mod scan;
pub mod scanner;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

#[cfg(feature = "mail-http")]
pub use mail::HttpMailProvider;
#[cfg(feature = "mail-smtp")]
pub use mail::SmtpMailTransport;
pub use mail::{DeliveryReceipt, MailGateway, MailTransport};
pub use notification::{Notification, NotificationComposer, ReviewerInvitation};
pub use scan::{
    PipelineError, RecordOutcome, ScanFailurePolicy, ScanOutcome, ScratchFile, UploadScanTrigger,
    VerdictHandler,
};
#[cfg(feature = "clamav")]
pub use scanner::ClamAVScanner;
pub use scanner::MalwareScanner;

pub use manuscan_storage::{
    create_storage, LocalStorage, S3Storage, Storage, StorageBackend, StorageError, StorageResult,
};
