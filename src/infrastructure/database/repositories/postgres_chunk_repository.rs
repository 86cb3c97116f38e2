use async_trait::async_trait;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::DocumentChunk;
use crate::domain::repositories::{ChunkRepository, chunk_repository::ChunkRepositoryError};
use crate::infrastructure::database::connection::{DbConnection, DbPool};
use crate::infrastructure::database::models::{ChunkModel, NewChunkModel};
use crate::infrastructure::database::schema::document_chunks;

pub struct PostgresChunkRepository {
    pool: DbPool,
}

impl PostgresChunkRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn get_connection(&self) -> Result<DbConnection, ChunkRepositoryError> {
        self.pool.get().map_err(|e| {
            ChunkRepositoryError::DatabaseError(format!(
                "Failed to get database connection: {}",
                e
            ))
        })
    }
}

#[async_trait]
impl ChunkRepository for PostgresChunkRepository {
    async fn save_batch(&self, chunks: &[DocumentChunk]) -> Result<(), ChunkRepositoryError> {
        if chunks.is_empty() {
            return Ok(());
        }
        let new_chunks: Vec<NewChunkModel> = chunks.iter().map(NewChunkModel::from).collect();
        let mut conn = self.get_connection()?;

        tokio::task::spawn_blocking(move || {
            diesel::insert_into(document_chunks::table)
                .values(&new_chunks)
                .execute(&mut conn)
                .map_err(|e| {
                    ChunkRepositoryError::DatabaseError(format!("Failed to save chunks: {}", e))
                })
        })
        .await
        .map_err(|e| ChunkRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        Ok(())
    }

    async fn find_by_document_id(
        &self,
        document_id: Uuid,
    ) -> Result<Vec<DocumentChunk>, ChunkRepositoryError> {
        let mut conn = self.get_connection()?;

        let models = tokio::task::spawn_blocking(move || {
            document_chunks::table
                .filter(document_chunks::document_id.eq(document_id))
                .order(document_chunks::chunk_index.asc())
                .load::<ChunkModel>(&mut conn)
                .map_err(|e| {
                    ChunkRepositoryError::DatabaseError(format!("Failed to load chunks: {}", e))
                })
        })
        .await
        .map_err(|e| ChunkRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        Ok(models.into_iter().map(DocumentChunk::from).collect())
    }

    async fn delete_by_document_id(
        &self,
        document_id: Uuid,
    ) -> Result<i64, ChunkRepositoryError> {
        let mut conn = self.get_connection()?;

        let deleted = tokio::task::spawn_blocking(move || {
            diesel::delete(
                document_chunks::table.filter(document_chunks::document_id.eq(document_id)),
            )
            .execute(&mut conn)
            .map_err(|e| {
                ChunkRepositoryError::DatabaseError(format!("Failed to delete chunks: {}", e))
            })
        })
        .await
        .map_err(|e| ChunkRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        Ok(deleted as i64)
    }
}
