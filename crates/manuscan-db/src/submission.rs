use async_trait::async_trait;
use chrono::{DateTime, Utc};
use manuscan_core::models::{Submission, SubmissionStatus};
use manuscan_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

/// Update-only access to tracked submission records.
///
/// The pipeline can find records by stored file path and mark them infected;
/// it never creates or deletes records.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// All submissions whose stored file path equals `storage_path`.
    async fn find_by_storage_path(&self, storage_path: &str) -> Result<Vec<Submission>, AppError>;

    /// Set status to `rejected_infected`, attach the threat names, and clear
    /// both file references in a single write.
    async fn mark_infected(&self, id: Uuid, viruses: &[String]) -> Result<(), AppError>;

    /// Connectivity check for health endpoints
    async fn ping(&self) -> Result<(), AppError>;
}

/// Postgres repository for the `submissions` table
#[derive(Clone)]
pub struct SubmissionRepository {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct SubmissionRow {
    id: Uuid,
    form_id: Uuid,
    user_id: Uuid,
    status: String,
    file_url: Option<String>,
    storage_path: Option<String>,
    infected_viruses: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = AppError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<SubmissionStatus>()
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(Submission {
            id: row.id,
            form_id: row.form_id,
            user_id: row.user_id,
            status,
            file_url: row.file_url,
            storage_path: row.storage_path,
            infected_viruses: row.infected_viruses,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl SubmissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionStore for SubmissionRepository {
    async fn find_by_storage_path(&self, storage_path: &str) -> Result<Vec<Submission>, AppError> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, form_id, user_id, status, file_url, storage_path,
                   infected_viruses, created_at, updated_at
            FROM submissions
            WHERE storage_path = $1
            ORDER BY created_at
            "#,
        )
        .bind(storage_path)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Submission::try_from).collect()
    }

    async fn mark_infected(&self, id: Uuid, viruses: &[String]) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE submissions
            SET status = $2,
                infected_viruses = $3,
                file_url = NULL,
                storage_path = NULL,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(SubmissionStatus::RejectedInfected.as_str())
        .bind(viruses)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Submission {} not found", id)));
        }

        tracing::debug!(submission_id = %id, "Submission marked as infected");
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
