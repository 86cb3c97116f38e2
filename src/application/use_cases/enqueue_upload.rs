use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{IncomingDocument, IngestionJob, UploadedDocument};
use crate::domain::repositories::{JobRepository, job_repository::JobRepositoryError};

#[derive(Debug)]
pub enum EnqueueUploadError {
    StorageError(String),
}

impl std::fmt::Display for EnqueueUploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnqueueUploadError::StorageError(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for EnqueueUploadError {}

impl From<JobRepositoryError> for EnqueueUploadError {
    fn from(error: JobRepositoryError) -> Self {
        EnqueueUploadError::StorageError(error.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct EnqueueUploadRequest {
    pub user_id: String,
    pub upload_session_id: String,
    pub documents: Vec<IncomingDocument>,
}

#[derive(Debug, Clone)]
pub struct EnqueueUploadResponse {
    pub job_id: Uuid,
}

/// The sole write entry from the upload handler: one job plus its document
/// rows, committed atomically. The call is not idempotent; a retrying caller
/// supplies a fresh upload session id.
pub struct EnqueueUploadUseCase {
    job_repository: Arc<dyn JobRepository>,
}

impl EnqueueUploadUseCase {
    pub fn new(job_repository: Arc<dyn JobRepository>) -> Self {
        Self { job_repository }
    }

    pub async fn execute(
        &self,
        request: EnqueueUploadRequest,
    ) -> Result<EnqueueUploadResponse, EnqueueUploadError> {
        let job = IngestionJob::enqueue(request.user_id.clone(), request.upload_session_id);
        // An empty upload still gets a job row; the worker completes it as a
        // no-op on first claim.
        let documents: Vec<UploadedDocument> = request
            .documents
            .into_iter()
            .map(|incoming| UploadedDocument::staged(job.id(), request.user_id.clone(), incoming))
            .collect();

        self.job_repository
            .create_with_documents(&job, &documents)
            .await?;

        Ok(EnqueueUploadResponse { job_id: job.id() })
    }
}
