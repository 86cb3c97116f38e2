use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::UploadedDocument;
use crate::domain::repositories::{
    DocumentRepository, document_repository::DocumentRepositoryError,
};
use crate::domain::value_objects::StructuredStatus;
use crate::infrastructure::database::connection::{DbConnection, DbPool};
use crate::infrastructure::database::models::DocumentModel;
use crate::infrastructure::database::schema::{ingestion_jobs, uploaded_documents};

pub struct PostgresDocumentRepository {
    pool: DbPool,
}

impl PostgresDocumentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn get_connection(&self) -> Result<DbConnection, DocumentRepositoryError> {
        self.pool.get().map_err(|e| {
            DocumentRepositoryError::DatabaseError(format!(
                "Failed to get database connection: {}",
                e
            ))
        })
    }
}

#[async_trait]
impl DocumentRepository for PostgresDocumentRepository {
    async fn find_by_job_id(
        &self,
        job_id: Uuid,
    ) -> Result<Vec<UploadedDocument>, DocumentRepositoryError> {
        let mut conn = self.get_connection()?;

        let models = tokio::task::spawn_blocking(move || {
            uploaded_documents::table
                .filter(uploaded_documents::job_id.eq(job_id))
                .order(uploaded_documents::created_at.asc())
                .load::<DocumentModel>(&mut conn)
                .map_err(|e| {
                    DocumentRepositoryError::DatabaseError(format!(
                        "Failed to load documents: {}",
                        e
                    ))
                })
        })
        .await
        .map_err(|e| DocumentRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        let mut documents = Vec::with_capacity(models.len());
        for model in models {
            documents.push(
                UploadedDocument::try_from(model)
                    .map_err(DocumentRepositoryError::DatabaseError)?,
            );
        }
        Ok(documents)
    }

    async fn set_structured_status(
        &self,
        document_id: Uuid,
        status: StructuredStatus,
        error: Option<String>,
    ) -> Result<(), DocumentRepositoryError> {
        let mut conn = self.get_connection()?;

        tokio::task::spawn_blocking(move || {
            diesel::update(uploaded_documents::table.filter(uploaded_documents::id.eq(document_id)))
                .set((
                    uploaded_documents::structured_status.eq(status.as_str()),
                    uploaded_documents::error.eq(error),
                ))
                .execute(&mut conn)
                .map_err(|e| {
                    DocumentRepositoryError::DatabaseError(format!(
                        "Failed to update document status: {}",
                        e
                    ))
                })?;

            // Keep the owning job's updated_at moving so status pollers see
            // per-document progress.
            diesel::update(
                ingestion_jobs::table.filter(
                    ingestion_jobs::id.eq_any(
                        uploaded_documents::table
                            .filter(uploaded_documents::id.eq(document_id))
                            .select(uploaded_documents::job_id),
                    ),
                ),
            )
            .set(ingestion_jobs::updated_at.eq(Utc::now()))
            .execute(&mut conn)
            .map_err(|e| {
                DocumentRepositoryError::DatabaseError(format!(
                    "Failed to touch owning job: {}",
                    e
                ))
            })
        })
        .await
        .map_err(|e| DocumentRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        Ok(())
    }
}
