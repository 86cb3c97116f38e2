use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::UploadedDocument;
use crate::domain::value_objects::StructuredStatus;

#[derive(Debug)]
pub enum DocumentRepositoryError {
    DatabaseError(String),
}

impl std::fmt::Display for DocumentRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentRepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for DocumentRepositoryError {}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// All documents for a job, ordered by `created_at` ascending so retried
    /// jobs reprocess in the same sequence.
    async fn find_by_job_id(
        &self,
        job_id: Uuid,
    ) -> Result<Vec<UploadedDocument>, DocumentRepositoryError>;

    async fn set_structured_status(
        &self,
        document_id: Uuid,
        status: StructuredStatus,
        error: Option<String>,
    ) -> Result<(), DocumentRepositoryError>;
}
