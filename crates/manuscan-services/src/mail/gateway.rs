use super::{DeliveryReceipt, MailTransport};
use manuscan_core::models::EmailMessage;
use manuscan_core::DeliveryError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Primary transport with a single fallback.
///
/// Each attempt runs under `attempt_timeout`; a timeout counts as a failure.
/// A message gets at most two attempts and the fallback only runs when the
/// primary failed.
#[derive(Clone)]
pub struct MailGateway {
    primary: Arc<dyn MailTransport>,
    fallback: Option<Arc<dyn MailTransport>>,
    attempt_timeout: Duration,
}

impl MailGateway {
    pub fn new(
        primary: Arc<dyn MailTransport>,
        fallback: Option<Arc<dyn MailTransport>>,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            primary,
            fallback,
            attempt_timeout,
        }
    }

    #[tracing::instrument(skip(self, message), fields(to = %message.to, subject = %message.subject))]
    pub async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, DeliveryError> {
        let primary_error = match self.attempt(self.primary.as_ref(), message).await {
            Ok(id) => {
                let message_id = id.unwrap_or_else(|| format!("unassigned-{}", Uuid::new_v4()));
                return Ok(DeliveryReceipt {
                    message_id,
                    transport: self.primary.name(),
                });
            }
            Err(e) => e,
        };

        let Some(fallback) = self.fallback.as_ref() else {
            tracing::error!(
                transport = self.primary.name(),
                error = %primary_error,
                "Mail delivery failed and no fallback transport is configured"
            );
            return Err(primary_error);
        };

        tracing::warn!(
            transport = self.primary.name(),
            fallback = fallback.name(),
            error = %primary_error,
            "Primary mail transport failed, trying fallback"
        );

        match self.attempt(fallback.as_ref(), message).await {
            Ok(id) => {
                let message_id = id.unwrap_or_else(|| format!("unassigned-{}", Uuid::new_v4()));
                Ok(DeliveryReceipt {
                    message_id,
                    transport: fallback.name(),
                })
            }
            Err(e) => {
                tracing::error!(
                    transport = fallback.name(),
                    error = %e,
                    "Fallback mail transport failed"
                );
                Err(e)
            }
        }
    }

    async fn attempt(
        &self,
        transport: &dyn MailTransport,
        message: &EmailMessage,
    ) -> Result<Option<String>, DeliveryError> {
        let start = Instant::now();
        match tokio::time::timeout(self.attempt_timeout, transport.deliver(message)).await {
            Ok(Ok(id)) => {
                tracing::info!(
                    transport = transport.name(),
                    message_id = id.as_deref().unwrap_or("-"),
                    duration_ms = start.elapsed().as_millis(),
                    "Mail delivered"
                );
                Ok(id)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(DeliveryError::TimedOut {
                transport: transport.name(),
                timeout_secs: self.attempt_timeout.as_secs(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeTransport, TransportBehavior};

    fn message() -> EmailMessage {
        EmailMessage {
            from: "Manuscan <editor@manuscan.app>".to_string(),
            to: "reviewer@example.org".to_string(),
            subject: "Invitation to review: On Rust".to_string(),
            html: "<p>Hi</p>".to_string(),
            text: None,
        }
    }

    fn gateway(primary: &Arc<FakeTransport>, fallback: Option<&Arc<FakeTransport>>) -> MailGateway {
        MailGateway::new(
            primary.clone(),
            fallback.map(|f| f.clone() as Arc<dyn MailTransport>),
            Duration::from_millis(200),
        )
    }

    #[tokio::test]
    async fn primary_success_skips_fallback() {
        let primary = Arc::new(FakeTransport::new("http", TransportBehavior::Accept(Some("re_123".into()))));
        let fallback = Arc::new(FakeTransport::new("smtp", TransportBehavior::Accept(None)));

        let receipt = gateway(&primary, Some(&fallback)).send(&message()).await.unwrap();

        assert_eq!(receipt.message_id, "re_123");
        assert_eq!(receipt.transport, "http");
        assert_eq!(primary.attempts(), 1);
        assert_eq!(fallback.attempts(), 0);
    }

    #[tokio::test]
    async fn primary_without_id_gets_placeholder() {
        let primary = Arc::new(FakeTransport::new("http", TransportBehavior::Accept(None)));

        let receipt = gateway(&primary, None).send(&message()).await.unwrap();

        assert!(receipt.message_id.starts_with("unassigned-"));
        assert!(receipt.message_id.len() > "unassigned-".len());
    }

    #[tokio::test]
    async fn failing_primary_uses_fallback() {
        let primary = Arc::new(FakeTransport::new("http", TransportBehavior::Reject("503 upstream".into())));
        let fallback = Arc::new(FakeTransport::new(
            "smtp",
            TransportBehavior::Accept(Some("<abc@manuscan.app>".into())),
        ));

        let receipt = gateway(&primary, Some(&fallback)).send(&message()).await.unwrap();

        assert_eq!(receipt.message_id, "<abc@manuscan.app>");
        assert_eq!(receipt.transport, "smtp");
        assert_eq!(primary.attempts(), 1);
        assert_eq!(fallback.attempts(), 1);
        assert_eq!(fallback.delivered()[0].to, "reviewer@example.org");
    }

    #[tokio::test]
    async fn both_failing_surfaces_fallback_error() {
        let primary = Arc::new(FakeTransport::new("http", TransportBehavior::Reject("primary down".into())));
        let fallback = Arc::new(FakeTransport::new("smtp", TransportBehavior::Reject("relay refused".into())));

        let err = gateway(&primary, Some(&fallback)).send(&message()).await.unwrap_err();

        assert_eq!(err.transport(), "smtp");
        assert!(err.to_string().contains("relay refused"));
        assert!(!err.to_string().contains("primary down"));
        assert_eq!(primary.attempts(), 1);
        assert_eq!(fallback.attempts(), 1);
    }

    #[tokio::test]
    async fn no_fallback_returns_primary_error() {
        let primary = Arc::new(FakeTransport::new("http", TransportBehavior::Reject("401 bad key".into())));

        let err = gateway(&primary, None).send(&message()).await.unwrap_err();

        assert_eq!(err.transport(), "http");
        assert_eq!(primary.attempts(), 1);
    }

    #[tokio::test]
    async fn slow_primary_times_out_and_falls_back() {
        let primary = Arc::new(FakeTransport::new("http", TransportBehavior::Hang));
        let fallback = Arc::new(FakeTransport::new("smtp", TransportBehavior::Accept(Some("fb-1".into()))));

        let receipt = gateway(&primary, Some(&fallback)).send(&message()).await.unwrap();

        assert_eq!(receipt.transport, "smtp");
        assert_eq!(receipt.message_id, "fb-1");
    }

    #[tokio::test]
    async fn slow_fallback_is_timeout_error() {
        let primary = Arc::new(FakeTransport::new("http", TransportBehavior::Reject("down".into())));
        let fallback = Arc::new(FakeTransport::new("smtp", TransportBehavior::Hang));

        let err = gateway(&primary, Some(&fallback)).send(&message()).await.unwrap_err();

        assert!(matches!(err, DeliveryError::TimedOut { transport: "smtp", .. }));
    }
}
