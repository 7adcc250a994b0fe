use super::MailTransport;
use anyhow::Context;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use manuscan_core::models::EmailMessage;
use manuscan_core::{DeliveryError, SmtpConfig};
use std::sync::Arc;
use uuid::Uuid;

const TRANSPORT: &str = "smtp";

/// SMTP relay transport used as the fallback path.
#[derive(Clone)]
pub struct SmtpMailTransport {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpMailTransport {
    pub fn from_config(config: &SmtpConfig) -> anyhow::Result<Self> {
        let credentials = match (&config.user, &config.password) {
            (Some(u), Some(p)) => Some(Credentials::new(u.clone(), p.clone())),
            _ => None,
        };

        let mailer = if config.tls {
            let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .context("Failed to configure SMTP STARTTLS relay")?
                .port(config.port);
            if let Some(credentials) = credentials {
                builder = builder.credentials(credentials);
            }
            tracing::info!(
                host = %config.host,
                port = config.port,
                "SMTP fallback initialized (STARTTLS)"
            );
            builder.build()
        } else {
            let mut builder =
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host).port(config.port);
            if let Some(credentials) = credentials {
                builder = builder.credentials(credentials);
            }
            tracing::info!(host = %config.host, port = config.port, "SMTP fallback initialized");
            builder.build()
        };

        Ok(Self {
            mailer: Arc::new(mailer),
        })
    }
}

/// Build the MIME message and the Message-ID assigned to it.
///
/// A text body produces multipart/alternative; otherwise the message is HTML only.
fn build_message(message: &EmailMessage) -> Result<(Message, String), DeliveryError> {
    let invalid = |reason: String| DeliveryError::InvalidMessage {
        transport: TRANSPORT,
        reason,
    };

    let from: Mailbox = message
        .from
        .parse()
        .map_err(|e| invalid(format!("invalid sender '{}': {}", message.from, e)))?;
    let to: Mailbox = message
        .to
        .parse()
        .map_err(|e| invalid(format!("invalid recipient '{}': {}", message.to, e)))?;

    let message_id = format!("<{}@{}>", Uuid::new_v4(), from.email.domain());

    let builder = Message::builder()
        .from(from)
        .to(to)
        .subject(message.subject.clone())
        .message_id(Some(message_id.clone()));

    let email = match message.text.as_deref() {
        Some(text) => builder.multipart(MultiPart::alternative_plain_html(
            text.to_string(),
            message.html.clone(),
        )),
        None => builder
            .header(ContentType::TEXT_HTML)
            .body(message.html.clone()),
    }
    .map_err(|e| invalid(e.to_string()))?;

    Ok((email, message_id))
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    fn name(&self) -> &'static str {
        TRANSPORT
    }

    async fn deliver(&self, message: &EmailMessage) -> Result<Option<String>, DeliveryError> {
        let (email, message_id) = build_message(message)?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| DeliveryError::failed(TRANSPORT, e.to_string()))?;

        Ok(Some(message_id))
    }
}
