use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::ChunkEmbedding;
use crate::infrastructure::database::schema::chunk_embeddings;

#[derive(Debug, Queryable, Identifiable, Selectable, Associations)]
#[diesel(belongs_to(super::ChunkModel, foreign_key = chunk_id))]
#[diesel(table_name = chunk_embeddings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EmbeddingModel {
    pub id: Uuid,
    pub chunk_id: Uuid,
    pub embedding_model: String,
    pub embedding_dim: i32,
    pub embedding: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = chunk_embeddings)]
pub struct NewEmbeddingModel {
    pub id: Uuid,
    pub chunk_id: Uuid,
    pub embedding_model: String,
    pub embedding_dim: i32,
    pub embedding: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<&ChunkEmbedding> for NewEmbeddingModel {
    fn from(embedding: &ChunkEmbedding) -> Self {
        Self {
            id: embedding.id(),
            chunk_id: embedding.chunk_id(),
            embedding_model: embedding.embedding_model().to_string(),
            embedding_dim: embedding.embedding_dim(),
            // Vectors are stored as plain JSON arrays of numbers.
            embedding: serde_json::json!(embedding.embedding()),
            created_at: embedding.created_at(),
        }
    }
}

impl TryFrom<EmbeddingModel> for ChunkEmbedding {
    type Error = String;

    fn try_from(model: EmbeddingModel) -> Result<Self, Self::Error> {
        let values: Vec<f32> = serde_json::from_value(model.embedding)
            .map_err(|e| format!("Stored embedding is not a number array: {}", e))?;
        Ok(ChunkEmbedding::from_database(
            model.id,
            model.chunk_id,
            model.embedding_model,
            model.embedding_dim,
            values,
            model.created_at,
        ))
    }
}
