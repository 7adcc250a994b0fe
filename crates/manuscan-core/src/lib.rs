//! Manuscan Core Library
//!
//! This crate provides the domain models, error types, configuration, and field
//! validation shared by the storage, database, service, and API crates.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::{Config, MailConfig, ScannerConfig, SmtpConfig};
pub use error::{
    AppError, DeliveryError, ErrorMetadata, LogLevel, RecordUpdateError, ScanError,
    ValidationError,
};
pub use storage_types::StorageBackend;
