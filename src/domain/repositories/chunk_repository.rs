use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::DocumentChunk;

#[derive(Debug)]
pub enum ChunkRepositoryError {
    DatabaseError(String),
}

impl std::fmt::Display for ChunkRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkRepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for ChunkRepositoryError {}

#[async_trait]
pub trait ChunkRepository: Send + Sync {
    /// Write all rows in order. Empty input is a no-op.
    async fn save_batch(&self, chunks: &[DocumentChunk]) -> Result<(), ChunkRepositoryError>;

    /// Chunks for a document ordered by `chunk_index` ascending.
    async fn find_by_document_id(
        &self,
        document_id: Uuid,
    ) -> Result<Vec<DocumentChunk>, ChunkRepositoryError>;

    /// Remove a document's chunks (their embeddings cascade away with them).
    /// Returns the number of deleted rows.
    async fn delete_by_document_id(
        &self,
        document_id: Uuid,
    ) -> Result<i64, ChunkRepositoryError>;
}
