//! Manuscan database layer
//!
//! Submission records are owned by the review tracker; the scan pipeline only
//! looks them up by stored file path and marks infected ones. `SubmissionStore`
//! exposes exactly that surface. `SubmissionRepository` is the Postgres
//! implementation and `InMemorySubmissionStore` backs tests and local runs.

pub mod memory;
pub mod submission;

pub use memory::InMemorySubmissionStore;
pub use submission::{SubmissionRepository, SubmissionStore};
