use async_trait::async_trait;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::ChunkEmbedding;
use crate::domain::repositories::{
    EmbeddingRepository, embedding_repository::EmbeddingRepositoryError,
};
use crate::infrastructure::database::connection::{DbConnection, DbPool};
use crate::infrastructure::database::models::{EmbeddingModel, NewEmbeddingModel};
use crate::infrastructure::database::schema::chunk_embeddings;

pub struct PostgresEmbeddingRepository {
    pool: DbPool,
}

impl PostgresEmbeddingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn get_connection(&self) -> Result<DbConnection, EmbeddingRepositoryError> {
        self.pool.get().map_err(|e| {
            EmbeddingRepositoryError::DatabaseError(format!(
                "Failed to get database connection: {}",
                e
            ))
        })
    }
}

#[async_trait]
impl EmbeddingRepository for PostgresEmbeddingRepository {
    async fn save(&self, embedding: &ChunkEmbedding) -> Result<(), EmbeddingRepositoryError> {
        let new_embedding = NewEmbeddingModel::from(embedding);
        let mut conn = self.get_connection()?;

        tokio::task::spawn_blocking(move || {
            // One row per (chunk, model); a rewrite of the same chunk keeps
            // the existing row.
            diesel::insert_into(chunk_embeddings::table)
                .values(&new_embedding)
                .on_conflict((chunk_embeddings::chunk_id, chunk_embeddings::embedding_model))
                .do_nothing()
                .execute(&mut conn)
                .map_err(|e| {
                    EmbeddingRepositoryError::DatabaseError(format!(
                        "Failed to save embedding: {}",
                        e
                    ))
                })
        })
        .await
        .map_err(|e| EmbeddingRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        Ok(())
    }

    async fn find_by_chunk_id(
        &self,
        chunk_id: Uuid,
    ) -> Result<Vec<ChunkEmbedding>, EmbeddingRepositoryError> {
        let mut conn = self.get_connection()?;

        let models = tokio::task::spawn_blocking(move || {
            chunk_embeddings::table
                .filter(chunk_embeddings::chunk_id.eq(chunk_id))
                .load::<EmbeddingModel>(&mut conn)
                .map_err(|e| {
                    EmbeddingRepositoryError::DatabaseError(format!(
                        "Failed to load embeddings: {}",
                        e
                    ))
                })
        })
        .await
        .map_err(|e| EmbeddingRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        let mut embeddings = Vec::with_capacity(models.len());
        for model in models {
            embeddings.push(
                ChunkEmbedding::try_from(model).map_err(EmbeddingRepositoryError::DatabaseError)?,
            );
        }
        Ok(embeddings)
    }
}
