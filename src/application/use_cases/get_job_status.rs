use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{IngestionJob, UploadedDocument};
use crate::domain::repositories::{
    DocumentRepository, JobRepository, document_repository::DocumentRepositoryError,
    job_repository::JobRepositoryError,
};

#[derive(Debug)]
pub enum GetJobStatusError {
    StorageError(String),
}

impl std::fmt::Display for GetJobStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GetJobStatusError::StorageError(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for GetJobStatusError {}

impl From<JobRepositoryError> for GetJobStatusError {
    fn from(error: JobRepositoryError) -> Self {
        GetJobStatusError::StorageError(error.to_string())
    }
}

impl From<DocumentRepositoryError> for GetJobStatusError {
    fn from(error: DocumentRepositoryError) -> Self {
        GetJobStatusError::StorageError(error.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct JobWithDocuments {
    pub job: IngestionJob,
    pub documents: Vec<UploadedDocument>,
}

/// Read side for the status polling endpoint: a job and its documents,
/// scoped to the owning user.
pub struct GetJobStatusUseCase {
    job_repository: Arc<dyn JobRepository>,
    document_repository: Arc<dyn DocumentRepository>,
}

impl GetJobStatusUseCase {
    pub fn new(
        job_repository: Arc<dyn JobRepository>,
        document_repository: Arc<dyn DocumentRepository>,
    ) -> Self {
        Self {
            job_repository,
            document_repository,
        }
    }

    pub async fn get_job_with_documents(
        &self,
        job_id: Uuid,
        user_id: &str,
    ) -> Result<Option<JobWithDocuments>, GetJobStatusError> {
        let Some(job) = self.job_repository.find_for_user(job_id, user_id).await? else {
            return Ok(None);
        };
        let documents = self.document_repository.find_by_job_id(job_id).await?;
        Ok(Some(JobWithDocuments { job, documents }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::InMemoryStore;
    use crate::domain::entities::{IncomingDocument, UploadedDocument};

    #[tokio::test]
    async fn returns_job_and_documents_for_the_owner() {
        let store = InMemoryStore::shared();
        let use_case = GetJobStatusUseCase::new(store.clone(), store.clone());

        let job = IngestionJob::enqueue("user-1", "session-1");
        let job_id = job.id();
        store.insert_job(job);
        store.insert_document(UploadedDocument::staged(
            job_id,
            "user-1",
            IncomingDocument {
                original_name: "a.csv".to_string(),
                stored_name: "a.csv".to_string(),
                stored_path: "session-1/a.csv".to_string(),
                mime_type: "text/csv".to_string(),
                size_bytes: 10,
            },
        ));

        let found = use_case
            .get_job_with_documents(job_id, "user-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.job.id(), job_id);
        assert_eq!(found.documents.len(), 1);
    }

    #[tokio::test]
    async fn other_users_see_nothing() {
        let store = InMemoryStore::shared();
        let use_case = GetJobStatusUseCase::new(store.clone(), store.clone());

        let job = IngestionJob::enqueue("user-1", "session-1");
        let job_id = job.id();
        store.insert_job(job);

        assert!(
            use_case
                .get_job_with_documents(job_id, "user-2")
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            use_case
                .get_job_with_documents(Uuid::new_v4(), "user-1")
                .await
                .unwrap()
                .is_none()
        );
    }
}
