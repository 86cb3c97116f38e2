use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A fixed-length vector produced by an embedding model from a chunk's text.
/// Unique per `(chunk_id, embedding_model)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkEmbedding {
    id: Uuid,
    chunk_id: Uuid,
    embedding_model: String,
    embedding_dim: i32,
    embedding: Vec<f32>,
    created_at: DateTime<Utc>,
}

impl ChunkEmbedding {
    pub fn new(chunk_id: Uuid, embedding_model: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            chunk_id,
            embedding_model: embedding_model.into(),
            embedding_dim: embedding.len() as i32,
            embedding,
            created_at: Utc::now(),
        }
    }

    pub fn from_database(
        id: Uuid,
        chunk_id: Uuid,
        embedding_model: String,
        embedding_dim: i32,
        embedding: Vec<f32>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            chunk_id,
            embedding_model,
            embedding_dim,
            embedding,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn chunk_id(&self) -> Uuid {
        self.chunk_id
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn embedding_dim(&self) -> i32 {
        self.embedding_dim
    }

    pub fn embedding(&self) -> &[f32] {
        &self.embedding
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
