use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::IngestionJob;
use crate::domain::value_objects::JobStatus;
use crate::infrastructure::database::schema::ingestion_jobs;

#[derive(Debug, Queryable, Identifiable, Selectable)]
#[diesel(table_name = ingestion_jobs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct JobModel {
    pub id: Uuid,
    pub user_id: String,
    pub upload_session_id: String,
    pub status: String,
    pub attempt_count: i32,
    pub max_attempts: i32,
    pub next_run_at: DateTime<Utc>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = ingestion_jobs)]
pub struct NewJobModel {
    pub id: Uuid,
    pub user_id: String,
    pub upload_session_id: String,
    pub status: String,
    pub attempt_count: i32,
    pub max_attempts: i32,
    pub next_run_at: DateTime<Utc>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&IngestionJob> for NewJobModel {
    fn from(job: &IngestionJob) -> Self {
        Self {
            id: job.id(),
            user_id: job.user_id().to_string(),
            upload_session_id: job.upload_session_id().to_string(),
            status: job.status().as_str().to_string(),
            attempt_count: job.attempt_count(),
            max_attempts: job.max_attempts(),
            next_run_at: job.next_run_at(),
            error: job.error().map(|s| s.to_string()),
            created_at: job.created_at(),
            updated_at: job.updated_at(),
        }
    }
}

impl TryFrom<JobModel> for IngestionJob {
    type Error = String;

    fn try_from(model: JobModel) -> Result<Self, Self::Error> {
        let status = JobStatus::parse(&model.status)?;
        Ok(IngestionJob::from_database(
            model.id,
            model.user_id,
            model.upload_session_id,
            status,
            model.attempt_count,
            model.max_attempts,
            model.next_run_at,
            model.error,
            model.created_at,
            model.updated_at,
        ))
    }
}
