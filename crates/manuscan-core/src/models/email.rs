use serde::{Deserialize, Serialize};

/// An outbound email.
///
/// Serializes to the primary provider's request body; `text` is omitted when
/// there is no plaintext alternative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}
