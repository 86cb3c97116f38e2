use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::{IngestionJob, UploadedDocument};
use crate::domain::repositories::{JobRepository, job_repository::JobRepositoryError};
use crate::domain::value_objects::JobStatus;
use crate::infrastructure::database::connection::{DbConnection, DbPool};
use crate::infrastructure::database::models::{JobModel, NewDocumentModel, NewJobModel};
use crate::infrastructure::database::schema::{ingestion_jobs, uploaded_documents};

const TERMINAL_STATUSES: [&str; 2] = ["completed", "failed"];

pub struct PostgresJobRepository {
    pool: DbPool,
}

impl PostgresJobRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn get_connection(&self) -> Result<DbConnection, JobRepositoryError> {
        self.pool.get().map_err(|e| {
            JobRepositoryError::DatabaseError(format!("Failed to get database connection: {}", e))
        })
    }
}

#[async_trait]
impl JobRepository for PostgresJobRepository {
    async fn create_with_documents(
        &self,
        job: &IngestionJob,
        documents: &[UploadedDocument],
    ) -> Result<(), JobRepositoryError> {
        let new_job = NewJobModel::from(job);
        let new_documents: Vec<NewDocumentModel> =
            documents.iter().map(NewDocumentModel::from).collect();
        let mut conn = self.get_connection()?;

        tokio::task::spawn_blocking(move || {
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                diesel::insert_into(ingestion_jobs::table)
                    .values(&new_job)
                    .execute(conn)?;
                if !new_documents.is_empty() {
                    diesel::insert_into(uploaded_documents::table)
                        .values(&new_documents)
                        .execute(conn)?;
                }
                Ok(())
            })
            .map_err(|e| {
                JobRepositoryError::DatabaseError(format!("Failed to enqueue job: {}", e))
            })
        })
        .await
        .map_err(|e| JobRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        Ok(())
    }

    async fn find_by_id(&self, job_id: Uuid) -> Result<Option<IngestionJob>, JobRepositoryError> {
        let mut conn = self.get_connection()?;

        let model = tokio::task::spawn_blocking(move || {
            ingestion_jobs::table
                .filter(ingestion_jobs::id.eq(job_id))
                .first::<JobModel>(&mut conn)
                .optional()
                .map_err(|e| {
                    JobRepositoryError::DatabaseError(format!("Failed to find job: {}", e))
                })
        })
        .await
        .map_err(|e| JobRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        model
            .map(IngestionJob::try_from)
            .transpose()
            .map_err(JobRepositoryError::DatabaseError)
    }

    async fn find_for_user(
        &self,
        job_id: Uuid,
        user_id: &str,
    ) -> Result<Option<IngestionJob>, JobRepositoryError> {
        let user_id = user_id.to_string();
        let mut conn = self.get_connection()?;

        let model = tokio::task::spawn_blocking(move || {
            ingestion_jobs::table
                .filter(ingestion_jobs::id.eq(job_id))
                .filter(ingestion_jobs::user_id.eq(user_id))
                .first::<JobModel>(&mut conn)
                .optional()
                .map_err(|e| {
                    JobRepositoryError::DatabaseError(format!("Failed to find job: {}", e))
                })
        })
        .await
        .map_err(|e| JobRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        model
            .map(IngestionJob::try_from)
            .transpose()
            .map_err(JobRepositoryError::DatabaseError)
    }

    async fn claim_next(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<IngestionJob>, JobRepositoryError> {
        let mut conn = self.get_connection()?;

        let claimed = tokio::task::spawn_blocking(move || {
            let candidate = ingestion_jobs::table
                .filter(ingestion_jobs::status.eq(JobStatus::Queued.as_str()))
                .filter(ingestion_jobs::next_run_at.le(now))
                .filter(ingestion_jobs::attempt_count.lt(ingestion_jobs::max_attempts))
                .order(ingestion_jobs::created_at.asc())
                .select(ingestion_jobs::id)
                .first::<Uuid>(&mut conn)
                .optional()
                .map_err(|e| {
                    JobRepositoryError::DatabaseError(format!("Failed to scan queue: {}", e))
                })?;

            let Some(job_id) = candidate else {
                return Ok(None);
            };

            // Conditional on the row still being queued; a concurrent worker
            // claiming the same row makes this update match nothing.
            diesel::update(
                ingestion_jobs::table
                    .filter(ingestion_jobs::id.eq(job_id))
                    .filter(ingestion_jobs::status.eq(JobStatus::Queued.as_str())),
            )
            .set((
                ingestion_jobs::status.eq(JobStatus::ProcessingStructure.as_str()),
                ingestion_jobs::attempt_count.eq(ingestion_jobs::attempt_count + 1),
                ingestion_jobs::updated_at.eq(now),
            ))
            .get_result::<JobModel>(&mut conn)
            .optional()
            .map_err(|e| JobRepositoryError::DatabaseError(format!("Failed to claim job: {}", e)))
        })
        .await
        .map_err(|e| JobRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        claimed
            .map(IngestionJob::try_from)
            .transpose()
            .map_err(JobRepositoryError::DatabaseError)
    }

    async fn set_status(
        &self,
        job_id: Uuid,
        status: JobStatus,
        error: Option<String>,
    ) -> Result<(), JobRepositoryError> {
        let mut conn = self.get_connection()?;

        tokio::task::spawn_blocking(move || {
            diesel::update(
                ingestion_jobs::table
                    .filter(ingestion_jobs::id.eq(job_id))
                    .filter(ingestion_jobs::status.ne_all(TERMINAL_STATUSES.to_vec())),
            )
            .set((
                ingestion_jobs::status.eq(status.as_str()),
                ingestion_jobs::error.eq(error),
                ingestion_jobs::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .map_err(|e| {
                JobRepositoryError::DatabaseError(format!("Failed to update job status: {}", e))
            })
        })
        .await
        .map_err(|e| JobRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        Ok(())
    }

    async fn requeue(
        &self,
        job_id: Uuid,
        error: String,
        next_run_at: DateTime<Utc>,
    ) -> Result<(), JobRepositoryError> {
        let mut conn = self.get_connection()?;

        tokio::task::spawn_blocking(move || {
            diesel::update(
                ingestion_jobs::table
                    .filter(ingestion_jobs::id.eq(job_id))
                    .filter(ingestion_jobs::status.ne_all(TERMINAL_STATUSES.to_vec())),
            )
            .set((
                ingestion_jobs::status.eq(JobStatus::Queued.as_str()),
                ingestion_jobs::error.eq(Some(error)),
                ingestion_jobs::next_run_at.eq(next_run_at),
                ingestion_jobs::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .map_err(|e| {
                JobRepositoryError::DatabaseError(format!("Failed to requeue job: {}", e))
            })
        })
        .await
        .map_err(|e| JobRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        Ok(())
    }
}
