use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::ChunkEmbedding;

#[derive(Debug)]
pub enum EmbeddingRepositoryError {
    DatabaseError(String),
}

impl std::fmt::Display for EmbeddingRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingRepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for EmbeddingRepositoryError {}

#[async_trait]
pub trait EmbeddingRepository: Send + Sync {
    async fn save(&self, embedding: &ChunkEmbedding) -> Result<(), EmbeddingRepositoryError>;

    async fn find_by_chunk_id(
        &self,
        chunk_id: Uuid,
    ) -> Result<Vec<ChunkEmbedding>, EmbeddingRepositoryError>;
}
