use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// One finalized object write to shared storage.
///
/// Field names follow the storage platform's object-finalize notification
/// (`bucket`, `name`, `size`, `contentType`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadEvent {
    /// Container (bucket) identifier
    pub bucket: String,
    /// Object path inside the container
    pub name: String,
    /// Object size in bytes; platforms commonly send it as a decimal string
    #[serde(default, deserialize_with = "deserialize_size")]
    pub size: Option<u64>,
    #[serde(default)]
    pub content_type: Option<String>,
}

impl UploadEvent {
    pub fn new(bucket: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            name: name.into(),
            size: None,
            content_type: None,
        }
    }

    /// Object path, used both as the storage key and the record lookup value.
    pub fn path(&self) -> &str {
        &self.name
    }
}

fn deserialize_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SizeRepr {
        Number(u64),
        Text(String),
    }

    match Option::<SizeRepr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(SizeRepr::Number(n)) => Ok(Some(n)),
        Some(SizeRepr::Text(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Outcome of running the malware scanner against a local copy of a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScanResult {
    pub infected: bool,
    /// Detected threat names (empty when clean)
    pub viruses: Vec<String>,
}

impl ScanResult {
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn infected(viruses: Vec<String>) -> Self {
        Self {
            infected: true,
            viruses,
        }
    }
}
