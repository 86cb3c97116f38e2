use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::application::ports::{Embedder, StructureOutcome, Structurer};
use crate::application::services::ingestion_queue::{IngestionQueue, QueueError};
use crate::domain::entities::{ChunkEmbedding, DocumentChunk, UploadedDocument};
use crate::domain::repositories::{
    ChunkRepository, EmbeddingRepository, chunk_repository::ChunkRepositoryError,
    embedding_repository::EmbeddingRepositoryError,
};
use crate::domain::value_objects::{JobStatus, StructuredStatus};

#[derive(Debug)]
enum ProcessingError {
    StorageError(String),
    EmbeddingError(String),
}

impl std::fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            ProcessingError::EmbeddingError(msg) => write!(f, "{}", msg),
        }
    }
}

impl From<QueueError> for ProcessingError {
    fn from(error: QueueError) -> Self {
        ProcessingError::StorageError(error.to_string())
    }
}

impl From<ChunkRepositoryError> for ProcessingError {
    fn from(error: ChunkRepositoryError) -> Self {
        ProcessingError::StorageError(error.to_string())
    }
}

impl From<EmbeddingRepositoryError> for ProcessingError {
    fn from(error: EmbeddingRepositoryError) -> Self {
        ProcessingError::StorageError(error.to_string())
    }
}

/// Drives one claimed job through structuring and embedding.
///
/// This is the only component that turns failures into persisted job and
/// document state: providers and repositories surface errors, the processor
/// routes them. `process` never returns an error to the worker loop.
///
/// Retry policy for revisited documents: a document already `structured` is
/// complete (every chunk embedded before the status was written) and is
/// skipped; any other revisited document has its prior chunks, and by
/// cascade their embeddings, deleted before restructuring.
pub struct JobProcessor {
    queue: Arc<IngestionQueue>,
    chunk_repository: Arc<dyn ChunkRepository>,
    embedding_repository: Arc<dyn EmbeddingRepository>,
    structurer: Arc<dyn Structurer>,
    embedder: Arc<dyn Embedder>,
    staging_root: PathBuf,
}

impl JobProcessor {
    pub fn new(
        queue: Arc<IngestionQueue>,
        chunk_repository: Arc<dyn ChunkRepository>,
        embedding_repository: Arc<dyn EmbeddingRepository>,
        structurer: Arc<dyn Structurer>,
        embedder: Arc<dyn Embedder>,
        staging_root: PathBuf,
    ) -> Self {
        Self {
            queue,
            chunk_repository,
            embedding_repository,
            structurer,
            embedder,
            staging_root,
        }
    }

    /// Process a claimed job to a terminal or requeued state.
    pub async fn process(&self, job_id: Uuid) {
        if let Err(reason) = self.validate_providers() {
            self.record_failure(job_id, format!("Provider configuration invalid: {}", reason))
                .await;
            return;
        }

        match self.run(job_id).await {
            Ok(()) => info!(job_id = %job_id, "ingestion job finished"),
            Err(failure) => self.record_failure(job_id, failure.to_string()).await,
        }
    }

    fn validate_providers(&self) -> Result<(), String> {
        self.structurer.validate_config()?;
        self.embedder.validate_config()?;
        Ok(())
    }

    async fn record_failure(&self, job_id: Uuid, message: String) {
        warn!(job_id = %job_id, error = %message, "ingestion job attempt failed");
        if let Err(err) = self.queue.fail_with_retry(job_id, message).await {
            error!(job_id = %job_id, error = %err, "could not record job failure");
        }
    }

    async fn run(&self, job_id: Uuid) -> Result<(), ProcessingError> {
        let documents = self.queue.documents_for_job(job_id).await?;

        for document in &documents {
            // A terminal document survived a prior attempt; its outcome
            // stands.
            if document.structured_status().is_terminal() {
                continue;
            }
            self.process_document(job_id, document).await?;
        }

        self.queue
            .set_job_status(job_id, JobStatus::Completed, None)
            .await?;
        Ok(())
    }

    async fn process_document(
        &self,
        job_id: Uuid,
        document: &UploadedDocument,
    ) -> Result<(), ProcessingError> {
        self.queue
            .set_document_status(document.id(), StructuredStatus::Processing, None)
            .await?;
        // Drop partial output from an interrupted attempt so indices stay
        // dense and no chunk carries two embeddings.
        self.chunk_repository
            .delete_by_document_id(document.id())
            .await?;

        let path = match self.resolve_staged_path(document.stored_path()) {
            Ok(path) => path,
            Err(reason) => {
                warn!(
                    job_id = %job_id,
                    document_id = %document.id(),
                    stored_path = %document.stored_path(),
                    "rejected staged path"
                );
                self.queue
                    .set_document_status(document.id(), StructuredStatus::Failed, Some(reason))
                    .await?;
                return Ok(());
            }
        };

        match self.structurer.structure(&path, document.mime_type()).await {
            StructureOutcome::Unsupported(reason) => {
                self.queue
                    .set_document_status(
                        document.id(),
                        StructuredStatus::Unsupported,
                        Some(reason),
                    )
                    .await?;
            }
            StructureOutcome::Failed(reason) => {
                self.queue
                    .set_document_status(document.id(), StructuredStatus::Failed, Some(reason))
                    .await?;
            }
            StructureOutcome::Structured(drafts) => {
                let chunks = DocumentChunk::sequence(document.id(), drafts);
                if chunks.is_empty() {
                    // A structured document must own at least one chunk.
                    self.queue
                        .set_document_status(
                            document.id(),
                            StructuredStatus::Failed,
                            Some("Structuring produced no usable chunks".to_string()),
                        )
                        .await?;
                    return Ok(());
                }

                self.chunk_repository.save_batch(&chunks).await?;
                self.queue
                    .set_job_status(job_id, JobStatus::ProcessingEmbeddings, None)
                    .await?;
                self.embed_chunks(document, &chunks).await?;
                self.queue
                    .set_document_status(document.id(), StructuredStatus::Structured, None)
                    .await?;
            }
        }
        Ok(())
    }

    async fn embed_chunks(
        &self,
        document: &UploadedDocument,
        chunks: &[DocumentChunk],
    ) -> Result<(), ProcessingError> {
        for chunk in chunks {
            let vector = self.embedder.embed(chunk.text()).await.map_err(|err| {
                ProcessingError::EmbeddingError(format!(
                    "Embedding failed for chunk {} of document {}: {}",
                    chunk.chunk_index(),
                    document.id(),
                    err
                ))
            })?;
            let embedding = ChunkEmbedding::new(chunk.id(), vector.model, vector.values);
            self.embedding_repository.save(&embedding).await?;
        }
        Ok(())
    }

    /// Resolve a document's `stored_path` under the staging root. Absolute
    /// paths and any parent-directory traversal are rejected before the file
    /// is touched.
    fn resolve_staged_path(&self, stored_path: &str) -> Result<PathBuf, String> {
        let relative = Path::new(stored_path);
        let escapes = relative.is_absolute()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(format!(
                "Stored path escapes the staging root: {}",
                stored_path
            ));
        }
        Ok(self.staging_root.join(relative))
    }
}
