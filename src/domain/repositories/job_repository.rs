use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::{IngestionJob, UploadedDocument};
use crate::domain::value_objects::JobStatus;

#[derive(Debug)]
pub enum JobRepositoryError {
    NotFound(Uuid),
    DatabaseError(String),
}

impl std::fmt::Display for JobRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobRepositoryError::NotFound(id) => write!(f, "Job not found: {}", id),
            JobRepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for JobRepositoryError {}

#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Insert a job row and its document rows in one transaction. Either all
    /// rows commit or none do.
    async fn create_with_documents(
        &self,
        job: &IngestionJob,
        documents: &[UploadedDocument],
    ) -> Result<(), JobRepositoryError>;

    async fn find_by_id(&self, job_id: Uuid) -> Result<Option<IngestionJob>, JobRepositoryError>;

    /// Lookup scoped to the owning user; `None` when the job exists but
    /// belongs to someone else.
    async fn find_for_user(
        &self,
        job_id: Uuid,
        user_id: &str,
    ) -> Result<Option<IngestionJob>, JobRepositoryError>;

    /// Atomically claim the oldest runnable queued job: conditional update
    /// from `queued` to `processing_structure`, incrementing the attempt
    /// count and stamping `updated_at`. Returns the post-update row, or
    /// `None` when nothing is runnable or another worker won the race.
    async fn claim_next(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<IngestionJob>, JobRepositoryError>;

    /// Write `status` and `error`, stamping `updated_at`. Rows already in a
    /// terminal status are never modified.
    async fn set_status(
        &self,
        job_id: Uuid,
        status: JobStatus,
        error: Option<String>,
    ) -> Result<(), JobRepositoryError>;

    /// Put a non-terminal job back on the queue with an error message and a
    /// deferred `next_run_at`.
    async fn requeue(
        &self,
        job_id: Uuid,
        error: String,
        next_run_at: DateTime<Utc>,
    ) -> Result<(), JobRepositoryError>;
}
