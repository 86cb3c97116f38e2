use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::domain::entities::{IngestionJob, UploadedDocument};
use crate::domain::repositories::{
    DocumentRepository, JobRepository, document_repository::DocumentRepositoryError,
    job_repository::JobRepositoryError,
};
use crate::domain::value_objects::{JobStatus, StructuredStatus, retry_policy};

#[derive(Debug)]
pub enum QueueError {
    StorageError(String),
}

impl std::fmt::Display for QueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueError::StorageError(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for QueueError {}

impl From<JobRepositoryError> for QueueError {
    fn from(error: JobRepositoryError) -> Self {
        QueueError::StorageError(error.to_string())
    }
}

impl From<DocumentRepositoryError> for QueueError {
    fn from(error: DocumentRepositoryError) -> Self {
        QueueError::StorageError(error.to_string())
    }
}

/// Queue operations over the durable store: claim, reschedule, terminate.
///
/// Claiming is the only contended path; its compare-and-swap lives in the
/// job repository so that N workers over the same database each claim
/// distinct jobs.
pub struct IngestionQueue {
    job_repository: Arc<dyn JobRepository>,
    document_repository: Arc<dyn DocumentRepository>,
}

impl IngestionQueue {
    pub fn new(
        job_repository: Arc<dyn JobRepository>,
        document_repository: Arc<dyn DocumentRepository>,
    ) -> Self {
        Self {
            job_repository,
            document_repository,
        }
    }

    /// Claim the oldest runnable queued job, if any. Returns `None` both
    /// when the queue is empty and when a concurrent worker won the race.
    pub async fn claim_next(&self) -> Result<Option<IngestionJob>, QueueError> {
        let claimed = self.job_repository.claim_next(Utc::now()).await?;
        if let Some(job) = &claimed {
            info!(
                job_id = %job.id(),
                attempt = job.attempt_count(),
                "claimed ingestion job"
            );
        }
        Ok(claimed)
    }

    /// Documents of a job in their enqueue order.
    pub async fn documents_for_job(
        &self,
        job_id: Uuid,
    ) -> Result<Vec<UploadedDocument>, QueueError> {
        Ok(self.document_repository.find_by_job_id(job_id).await?)
    }

    pub async fn set_job_status(
        &self,
        job_id: Uuid,
        status: JobStatus,
        error: Option<String>,
    ) -> Result<(), QueueError> {
        self.job_repository.set_status(job_id, status, error).await?;
        Ok(())
    }

    pub async fn set_document_status(
        &self,
        document_id: Uuid,
        status: StructuredStatus,
        error: Option<String>,
    ) -> Result<(), QueueError> {
        self.document_repository
            .set_structured_status(document_id, status, error)
            .await?;
        Ok(())
    }

    /// Terminate the job when its attempts are exhausted, otherwise put it
    /// back on the queue behind an exponential backoff window. A missing job
    /// row is a no-op.
    pub async fn fail_with_retry(
        &self,
        job_id: Uuid,
        error_message: String,
    ) -> Result<(), QueueError> {
        let Some(job) = self.job_repository.find_by_id(job_id).await? else {
            return Ok(());
        };
        if job.is_terminal() {
            return Ok(());
        }

        if job.has_attempts_left() {
            let next_run_at = Utc::now() + retry_policy::backoff(job.attempt_count());
            info!(
                job_id = %job_id,
                attempt = job.attempt_count(),
                next_run_at = %next_run_at,
                error = %error_message,
                "requeueing failed job"
            );
            self.job_repository
                .requeue(job_id, error_message, next_run_at)
                .await?;
        } else {
            info!(
                job_id = %job_id,
                attempt = job.attempt_count(),
                error = %error_message,
                "job failed permanently"
            );
            self.job_repository
                .set_status(job_id, JobStatus::Failed, Some(error_message))
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::InMemoryStore;
    use crate::domain::entities::IngestionJob;

    fn queue_over(store: &Arc<InMemoryStore>) -> IngestionQueue {
        IngestionQueue::new(store.clone(), store.clone())
    }

    #[tokio::test]
    async fn claim_next_returns_none_on_empty_queue() {
        let store = InMemoryStore::shared();
        let queue = queue_over(&store);

        assert!(queue.claim_next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn claim_next_takes_oldest_and_increments_attempts() {
        let store = InMemoryStore::shared();
        let queue = queue_over(&store);

        let first = IngestionJob::enqueue("user-1", "session-a");
        let second = IngestionJob::enqueue("user-1", "session-b");
        store.insert_job(first.clone());
        store.insert_job(second.clone());

        let claimed = queue.claim_next().await.unwrap().unwrap();
        assert_eq!(claimed.id(), first.id());
        assert_eq!(claimed.status(), JobStatus::ProcessingStructure);
        assert_eq!(claimed.attempt_count(), 1);

        let next = queue.claim_next().await.unwrap().unwrap();
        assert_eq!(next.id(), second.id());

        assert!(queue.claim_next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn claim_next_skips_deferred_jobs() {
        let store = InMemoryStore::shared();
        let queue = queue_over(&store);

        let job = IngestionJob::enqueue("user-1", "session-a");
        let job_id = job.id();
        store.insert_job(job);
        store.defer_job(job_id, chrono::Duration::seconds(30));

        assert!(queue.claim_next().await.unwrap().is_none());

        store.defer_job(job_id, chrono::Duration::seconds(-1));
        assert!(queue.claim_next().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn fail_with_retry_requeues_while_attempts_remain() {
        let store = InMemoryStore::shared();
        let queue = queue_over(&store);

        let job = IngestionJob::enqueue("user-1", "session-a");
        let job_id = job.id();
        store.insert_job(job);

        queue.claim_next().await.unwrap().unwrap();
        let before = Utc::now();
        queue
            .fail_with_retry(job_id, "embedder unreachable".to_string())
            .await
            .unwrap();

        let requeued = store.job(job_id).unwrap();
        assert_eq!(requeued.status(), JobStatus::Queued);
        assert_eq!(requeued.attempt_count(), 1);
        assert_eq!(requeued.error(), Some("embedder unreachable"));
        assert!(requeued.next_run_at() > before);
        assert!(requeued.next_run_at() <= before + chrono::Duration::seconds(61));
    }

    #[tokio::test]
    async fn fail_with_retry_terminates_when_attempts_exhausted() {
        let store = InMemoryStore::shared();
        let queue = queue_over(&store);

        let job = IngestionJob::enqueue("user-1", "session-a");
        let job_id = job.id();
        store.insert_job(job);

        for _ in 0..3 {
            store.defer_job(job_id, chrono::Duration::seconds(-1));
            queue.claim_next().await.unwrap().unwrap();
            queue
                .fail_with_retry(job_id, "still broken".to_string())
                .await
                .unwrap();
        }

        let failed = store.job(job_id).unwrap();
        assert_eq!(failed.status(), JobStatus::Failed);
        assert_eq!(failed.attempt_count(), 3);
        assert_eq!(failed.error(), Some("still broken"));

        // Terminal jobs are never claimable again.
        assert!(queue.claim_next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fail_with_retry_on_missing_job_is_a_no_op() {
        let store = InMemoryStore::shared();
        let queue = queue_over(&store);

        queue
            .fail_with_retry(Uuid::new_v4(), "gone".to_string())
            .await
            .unwrap();
    }
}
