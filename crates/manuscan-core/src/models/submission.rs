use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Review status of a tracked submission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    UnderReview,
    Accepted,
    Rejected,
    /// Rejected because the uploaded manuscript carried malware
    RejectedInfected,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::UnderReview => "under_review",
            SubmissionStatus::Accepted => "accepted",
            SubmissionStatus::Rejected => "rejected",
            SubmissionStatus::RejectedInfected => "rejected_infected",
        }
    }
}

impl Display for SubmissionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SubmissionStatus::Pending),
            "under_review" => Ok(SubmissionStatus::UnderReview),
            "accepted" => Ok(SubmissionStatus::Accepted),
            "rejected" => Ok(SubmissionStatus::Rejected),
            "rejected_infected" => Ok(SubmissionStatus::RejectedInfected),
            _ => Err(anyhow::anyhow!("Invalid submission status: {}", s)),
        }
    }
}

/// A user's form submission that references an uploaded manuscript.
///
/// `file_url` and `storage_path` are either both set or both cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Submission {
    pub id: Uuid,
    pub form_id: Uuid,
    pub user_id: Uuid,
    pub status: SubmissionStatus,
    pub file_url: Option<String>,
    pub storage_path: Option<String>,
    pub infected_viruses: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    /// New pending submission pointing at an uploaded file.
    pub fn pending(
        form_id: Uuid,
        user_id: Uuid,
        storage_path: impl Into<String>,
        file_url: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            form_id,
            user_id,
            status: SubmissionStatus::Pending,
            file_url: Some(file_url.into()),
            storage_path: Some(storage_path.into()),
            infected_viruses: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_file(&self) -> bool {
        self.file_url.is_some() && self.storage_path.is_some()
    }
}
