//! Manuscan API Library
//!
//! HTTP surface for the manuscript pipeline: callable email endpoints, the
//! storage finalize event receiver, health probes, and application setup.

mod api_doc;
pub mod constants;
mod handlers;
mod middleware;
pub mod setup;
mod telemetry;

pub mod error;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
