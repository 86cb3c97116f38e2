use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::DocumentChunk;
use crate::infrastructure::database::schema::document_chunks;

#[derive(Debug, Queryable, Identifiable, Selectable, Associations)]
#[diesel(belongs_to(super::DocumentModel, foreign_key = document_id))]
#[diesel(table_name = document_chunks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChunkModel {
    pub id: Uuid,
    pub document_id: Uuid,
    pub chunk_index: i32,
    pub chunk_text: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = document_chunks)]
pub struct NewChunkModel {
    pub id: Uuid,
    pub document_id: Uuid,
    pub chunk_index: i32,
    pub chunk_text: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<&DocumentChunk> for NewChunkModel {
    fn from(chunk: &DocumentChunk) -> Self {
        Self {
            id: chunk.id(),
            document_id: chunk.document_id(),
            chunk_index: chunk.chunk_index(),
            chunk_text: chunk.text().to_string(),
            metadata: chunk.metadata().cloned(),
            created_at: chunk.created_at(),
        }
    }
}

impl From<ChunkModel> for DocumentChunk {
    fn from(model: ChunkModel) -> Self {
        DocumentChunk::from_database(
            model.id,
            model.document_id,
            model.chunk_index,
            model.chunk_text,
            model.metadata,
            model.created_at,
        )
    }
}
