//! Manuscan Storage Library
//!
//! Storage abstraction over the shared object store that manuscripts are
//! uploaded to. The scan pipeline downloads objects by key, and deletes them
//! when the scanner flags them.
//!
//! # Storage key format
//!
//! Keys are the object paths reported by storage events (for example
//! `manuscripts/abc.pdf`). Keys must not contain `..` or a leading `/`.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use manuscan_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::{S3Settings, S3Storage};
pub use traits::{ByteStream, Storage, StorageError, StorageResult};
