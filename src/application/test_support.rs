//! In-memory repository fakes and scripted providers for exercising the
//! queue and processor orchestration without a database.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::application::ports::{
    Embedder, EmbedderError, EmbeddingVector, StructureOutcome, Structurer,
};
use crate::domain::entities::{ChunkEmbedding, DocumentChunk, IngestionJob, UploadedDocument};
use crate::domain::repositories::{
    ChunkRepository, DocumentRepository, EmbeddingRepository, JobRepository,
    chunk_repository::ChunkRepositoryError, document_repository::DocumentRepositoryError,
    embedding_repository::EmbeddingRepositoryError, job_repository::JobRepositoryError,
};
use crate::domain::value_objects::{JobStatus, StructuredStatus};

#[derive(Default)]
pub struct InMemoryStore {
    jobs: Mutex<HashMap<Uuid, IngestionJob>>,
    documents: Mutex<Vec<UploadedDocument>>,
    chunks: Mutex<Vec<DocumentChunk>>,
    embeddings: Mutex<Vec<ChunkEmbedding>>,
}

impl InMemoryStore {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert_job(&self, job: IngestionJob) {
        self.jobs.lock().unwrap().insert(job.id(), job);
    }

    pub fn insert_document(&self, document: UploadedDocument) {
        self.documents.lock().unwrap().push(document);
    }

    pub fn job(&self, job_id: Uuid) -> Option<IngestionJob> {
        self.jobs.lock().unwrap().get(&job_id).cloned()
    }

    pub fn document(&self, document_id: Uuid) -> Option<UploadedDocument> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id() == document_id)
            .cloned()
    }

    pub fn chunks_for(&self, document_id: Uuid) -> Vec<DocumentChunk> {
        let mut chunks: Vec<DocumentChunk> = self
            .chunks
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.document_id() == document_id)
            .cloned()
            .collect();
        chunks.sort_by_key(|c| c.chunk_index());
        chunks
    }

    pub fn embeddings_for_chunk(&self, chunk_id: Uuid) -> Vec<ChunkEmbedding> {
        self.embeddings
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.chunk_id() == chunk_id)
            .cloned()
            .collect()
    }

    /// Shift a job's `next_run_at` relative to now (negative durations make
    /// a backed-off job immediately claimable again).
    pub fn defer_job(&self, job_id: Uuid, delta: Duration) {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(job) = jobs.get(&job_id) {
            let updated = rebuild(job, job.status(), job.attempt_count(), Utc::now() + delta, job.error().map(String::from));
            jobs.insert(job_id, updated);
        }
    }

    /// Operator-style reset used by the retry idempotence tests.
    pub fn reset_to_queued(&self, job_id: Uuid) {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(job) = jobs.get(&job_id) {
            let updated = rebuild(job, JobStatus::Queued, 0, Utc::now(), None);
            jobs.insert(job_id, updated);
        }
    }
}

fn rebuild(
    job: &IngestionJob,
    status: JobStatus,
    attempt_count: i32,
    next_run_at: DateTime<Utc>,
    error: Option<String>,
) -> IngestionJob {
    IngestionJob::from_database(
        job.id(),
        job.user_id().to_string(),
        job.upload_session_id().to_string(),
        status,
        attempt_count,
        job.max_attempts(),
        next_run_at,
        error,
        job.created_at(),
        Utc::now(),
    )
}

#[async_trait]
impl JobRepository for InMemoryStore {
    async fn create_with_documents(
        &self,
        job: &IngestionJob,
        documents: &[UploadedDocument],
    ) -> Result<(), JobRepositoryError> {
        self.insert_job(job.clone());
        for document in documents {
            self.insert_document(document.clone());
        }
        Ok(())
    }

    async fn find_by_id(&self, job_id: Uuid) -> Result<Option<IngestionJob>, JobRepositoryError> {
        Ok(self.job(job_id))
    }

    async fn find_for_user(
        &self,
        job_id: Uuid,
        user_id: &str,
    ) -> Result<Option<IngestionJob>, JobRepositoryError> {
        Ok(self.job(job_id).filter(|job| job.user_id() == user_id))
    }

    async fn claim_next(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<IngestionJob>, JobRepositoryError> {
        let mut jobs = self.jobs.lock().unwrap();
        let candidate = jobs
            .values()
            .filter(|job| job.is_claimable_at(now))
            .min_by_key(|job| job.created_at())
            .map(|job| job.id());
        let Some(job_id) = candidate else {
            return Ok(None);
        };
        let job = jobs.get(&job_id).cloned().expect("candidate vanished");
        let claimed = rebuild(
            &job,
            JobStatus::ProcessingStructure,
            job.attempt_count() + 1,
            job.next_run_at(),
            job.error().map(String::from),
        );
        jobs.insert(job_id, claimed.clone());
        Ok(Some(claimed))
    }

    async fn set_status(
        &self,
        job_id: Uuid,
        status: JobStatus,
        error: Option<String>,
    ) -> Result<(), JobRepositoryError> {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(job) = jobs.get(&job_id) {
            if job.is_terminal() {
                return Ok(());
            }
            let updated = rebuild(job, status, job.attempt_count(), job.next_run_at(), error);
            jobs.insert(job_id, updated);
        }
        Ok(())
    }

    async fn requeue(
        &self,
        job_id: Uuid,
        error: String,
        next_run_at: DateTime<Utc>,
    ) -> Result<(), JobRepositoryError> {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(job) = jobs.get(&job_id) {
            if job.is_terminal() {
                return Ok(());
            }
            let updated = rebuild(
                job,
                JobStatus::Queued,
                job.attempt_count(),
                next_run_at,
                Some(error),
            );
            jobs.insert(job_id, updated);
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentRepository for InMemoryStore {
    async fn find_by_job_id(
        &self,
        job_id: Uuid,
    ) -> Result<Vec<UploadedDocument>, DocumentRepositoryError> {
        // Insertion order doubles as created_at order here.
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.job_id() == job_id)
            .cloned()
            .collect())
    }

    async fn set_structured_status(
        &self,
        document_id: Uuid,
        status: StructuredStatus,
        error: Option<String>,
    ) -> Result<(), DocumentRepositoryError> {
        let mut documents = self.documents.lock().unwrap();
        if let Some(document) = documents.iter_mut().find(|d| d.id() == document_id) {
            *document = UploadedDocument::from_database(
                document.id(),
                document.job_id(),
                document.user_id().to_string(),
                document.original_name().to_string(),
                document.stored_name().to_string(),
                document.stored_path().to_string(),
                document.mime_type().to_string(),
                document.size_bytes(),
                status,
                error,
                document.created_at(),
            );
        }
        Ok(())
    }
}

#[async_trait]
impl ChunkRepository for InMemoryStore {
    async fn save_batch(&self, chunks: &[DocumentChunk]) -> Result<(), ChunkRepositoryError> {
        self.chunks.lock().unwrap().extend_from_slice(chunks);
        Ok(())
    }

    async fn find_by_document_id(
        &self,
        document_id: Uuid,
    ) -> Result<Vec<DocumentChunk>, ChunkRepositoryError> {
        Ok(self.chunks_for(document_id))
    }

    async fn delete_by_document_id(
        &self,
        document_id: Uuid,
    ) -> Result<i64, ChunkRepositoryError> {
        let mut chunks = self.chunks.lock().unwrap();
        let before = chunks.len();
        let removed_ids: Vec<Uuid> = chunks
            .iter()
            .filter(|c| c.document_id() == document_id)
            .map(|c| c.id())
            .collect();
        chunks.retain(|c| c.document_id() != document_id);
        // Embeddings cascade with their chunks.
        self.embeddings
            .lock()
            .unwrap()
            .retain(|e| !removed_ids.contains(&e.chunk_id()));
        Ok((before - chunks.len()) as i64)
    }
}

#[async_trait]
impl EmbeddingRepository for InMemoryStore {
    async fn save(&self, embedding: &ChunkEmbedding) -> Result<(), EmbeddingRepositoryError> {
        self.embeddings.lock().unwrap().push(embedding.clone());
        Ok(())
    }

    async fn find_by_chunk_id(
        &self,
        chunk_id: Uuid,
    ) -> Result<Vec<ChunkEmbedding>, EmbeddingRepositoryError> {
        Ok(self.embeddings_for_chunk(chunk_id))
    }
}

/// Structurer returning a canned outcome regardless of input.
pub struct ScriptedStructurer {
    outcome: StructureOutcome,
}

impl ScriptedStructurer {
    pub fn new(outcome: StructureOutcome) -> Self {
        Self { outcome }
    }
}

#[async_trait]
impl Structurer for ScriptedStructurer {
    fn provider_id(&self) -> &str {
        "scripted"
    }

    async fn structure(&self, _path: &Path, _mime_type: &str) -> StructureOutcome {
        self.outcome.clone()
    }
}

/// Embedder that fails on scripted call numbers (1-based), delegating
/// otherwise.
pub struct FlakyEmbedder {
    inner: Arc<dyn Embedder>,
    failing_calls: Vec<u32>,
    calls: Mutex<u32>,
}

impl FlakyEmbedder {
    /// Fail the first `failures` calls.
    pub fn failing_first(inner: Arc<dyn Embedder>, failures: u32) -> Self {
        Self::failing_calls(inner, &(1..=failures).collect::<Vec<_>>())
    }

    pub fn failing_calls(inner: Arc<dyn Embedder>, calls: &[u32]) -> Self {
        Self {
            inner,
            failing_calls: calls.to_vec(),
            calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl Embedder for FlakyEmbedder {
    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    async fn embed(&self, text: &str) -> Result<EmbeddingVector, EmbedderError> {
        {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if self.failing_calls.contains(&*calls) {
                return Err(EmbedderError::NetworkError(
                    "connection reset by peer".to_string(),
                ));
            }
        }
        self.inner.embed(text).await
    }
}
