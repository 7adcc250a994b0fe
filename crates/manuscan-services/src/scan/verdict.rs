use super::{RecordOutcome, ScanOutcome};
use manuscan_core::models::{ScanResult, UploadEvent};
use manuscan_core::RecordUpdateError;
use manuscan_db::SubmissionStore;
use manuscan_storage::Storage;
use std::sync::Arc;

/// Applies a scan verdict to storage and the submission tracker.
#[derive(Clone)]
pub struct VerdictHandler {
    storage: Arc<dyn Storage>,
    submissions: Arc<dyn SubmissionStore>,
}

impl VerdictHandler {
    pub fn new(storage: Arc<dyn Storage>, submissions: Arc<dyn SubmissionStore>) -> Self {
        Self {
            storage,
            submissions,
        }
    }

    /// Clean files are left alone. Infected files are deleted from storage and
    /// every submission referencing the path is rejected, one record at a time.
    #[tracing::instrument(skip(self, event, result), fields(path = %event.path(), infected = result.infected))]
    pub async fn apply(&self, event: &UploadEvent, result: &ScanResult) -> ScanOutcome {
        let path = event.path();

        if !result.infected {
            tracing::info!(path = %path, "Manuscript scan clean");
            return ScanOutcome::Clean;
        }

        tracing::warn!(path = %path, viruses = ?result.viruses, "Infected manuscript detected");

        let object_deleted = match self.storage.delete(path).await {
            Ok(()) => {
                tracing::info!(path = %path, "Infected object deleted");
                true
            }
            Err(e) => {
                tracing::error!(path = %path, error = %e, "Failed to delete infected object");
                false
            }
        };

        let submissions = match self.submissions.find_by_storage_path(path).await {
            Ok(submissions) => submissions,
            Err(e) => {
                tracing::error!(path = %path, error = %e, "Failed to look up submissions for infected file");
                Vec::new()
            }
        };

        let mut records = Vec::with_capacity(submissions.len());
        for submission in submissions {
            let outcome = match self
                .submissions
                .mark_infected(submission.id, &result.viruses)
                .await
            {
                Ok(()) => {
                    tracing::info!(submission_id = %submission.id, "Submission rejected as infected");
                    RecordOutcome {
                        submission_id: submission.id,
                        updated: true,
                        error: None,
                    }
                }
                Err(e) => {
                    let err = RecordUpdateError {
                        record_id: submission.id,
                        reason: e.to_string(),
                    };
                    tracing::error!(error = %err, "Submission update failed, continuing");
                    RecordOutcome {
                        submission_id: submission.id,
                        updated: false,
                        error: Some(err.to_string()),
                    }
                }
            };
            records.push(outcome);
        }

        ScanOutcome::Infected {
            object_deleted,
            records,
        }
    }
}
