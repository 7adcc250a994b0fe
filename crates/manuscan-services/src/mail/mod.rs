//! Outbound mail delivery
//!
//! `MailGateway` sends through a primary HTTP provider and falls back to SMTP
//! once when the primary fails.

mod gateway;
#[cfg(feature = "mail-http")]
mod http;
#[cfg(feature = "mail-smtp")]
mod smtp;

pub use gateway::MailGateway;
#[cfg(feature = "mail-http")]
pub use http::HttpMailProvider;
#[cfg(feature = "mail-smtp")]
pub use smtp::SmtpMailTransport;

use async_trait::async_trait;
use manuscan_core::models::EmailMessage;
use manuscan_core::DeliveryError;
use serde::Serialize;

/// A single way of delivering an `EmailMessage`.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Short name used in logs and errors (e.g. "http", "smtp")
    fn name(&self) -> &'static str;

    /// Deliver the message, returning the provider's message id when it assigns one.
    async fn deliver(&self, message: &EmailMessage) -> Result<Option<String>, DeliveryError>;
}

/// Proof of a successful send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReceipt {
    pub message_id: String,
    /// Transport that accepted the message
    pub transport: &'static str,
}
