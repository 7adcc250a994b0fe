use super::MailTransport;
use anyhow::Context;
use async_trait::async_trait;
use manuscan_core::models::EmailMessage;
use manuscan_core::DeliveryError;
use serde::Deserialize;

const TRANSPORT: &str = "http";

/// Transactional mail API client (Resend-compatible `POST /emails`).
#[derive(Clone)]
pub struct HttpMailProvider {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    #[serde(default)]
    id: Option<String>,
}

impl HttpMailProvider {
    /// No client-level timeout: each attempt is bounded by the gateway.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client for mail provider")?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl MailTransport for HttpMailProvider {
    fn name(&self) -> &'static str {
        TRANSPORT
    }

    async fn deliver(&self, message: &EmailMessage) -> Result<Option<String>, DeliveryError> {
        let url = format!("{}/emails", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(message)
            .send()
            .await
            .map_err(|e| DeliveryError::failed(TRANSPORT, format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DeliveryError::failed(
                TRANSPORT,
                format!("{} - {}", status, error_text),
            ));
        }

        // Accepted. From here an unreadable body still counts as delivered.
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(%status, error = %e, "Mail provider accepted message but body could not be read");
                return Ok(None);
            }
        };

        match serde_json::from_str::<SendEmailResponse>(&body) {
            Ok(parsed) => Ok(parsed.id.filter(|id| !id.is_empty())),
            Err(e) => {
                tracing::warn!(%status, error = %e, "Mail provider accepted message without a readable id");
                Ok(None)
            }
        }
    }
}
