use crate::submission::SubmissionStore;
use async_trait::async_trait;
use chrono::Utc;
use manuscan_core::models::{Submission, SubmissionStatus};
use manuscan_core::AppError;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local submission store.
///
/// Mirrors the Postgres repository's semantics. `fail_updates_for` and
/// `fail_lookups` let callers simulate tracker outages.
#[derive(Clone, Default)]
pub struct InMemorySubmissionStore {
    records: Arc<RwLock<HashMap<Uuid, Submission>>>,
    failing_updates: Arc<RwLock<HashSet<Uuid>>>,
    failing_lookups: Arc<RwLock<bool>>,
}

impl InMemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, submission: Submission) {
        self.records.write().await.insert(submission.id, submission);
    }

    pub async fn get(&self, id: Uuid) -> Option<Submission> {
        self.records.read().await.get(&id).cloned()
    }

    /// Make every `mark_infected` call for `id` fail
    pub async fn fail_updates_for(&self, id: Uuid) {
        self.failing_updates.write().await.insert(id);
    }

    /// Make `find_by_storage_path` fail until reset
    pub async fn fail_lookups(&self, fail: bool) {
        *self.failing_lookups.write().await = fail;
    }
}

#[async_trait]
impl SubmissionStore for InMemorySubmissionStore {
    async fn find_by_storage_path(&self, storage_path: &str) -> Result<Vec<Submission>, AppError> {
        if *self.failing_lookups.read().await {
            return Err(AppError::Internal("submission lookup unavailable".to_string()));
        }

        let records = self.records.read().await;
        let mut matches: Vec<Submission> = records
            .values()
            .filter(|s| s.storage_path.as_deref() == Some(storage_path))
            .cloned()
            .collect();
        matches.sort_by_key(|s| s.created_at);
        Ok(matches)
    }

    async fn mark_infected(&self, id: Uuid, viruses: &[String]) -> Result<(), AppError> {
        if self.failing_updates.read().await.contains(&id) {
            return Err(AppError::Internal(format!(
                "update rejected for submission {}",
                id
            )));
        }

        let mut records = self.records.write().await;
        let record = records
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Submission {} not found", id)))?;

        record.status = SubmissionStatus::RejectedInfected;
        record.infected_viruses = viruses.to_vec();
        record.file_url = None;
        record.storage_path = None;
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
