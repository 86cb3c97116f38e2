use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::JobStatus;

pub const DEFAULT_MAX_ATTEMPTS: i32 = 3;

/// One ingestion unit spanning a single upload session's files.
///
/// Created by the enqueue operation and mutated only through the queue and
/// the processor. `attempt_count` counts successful claims and never exceeds
/// `max_attempts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionJob {
    id: Uuid,
    user_id: String,
    upload_session_id: String,
    status: JobStatus,
    attempt_count: i32,
    max_attempts: i32,
    next_run_at: DateTime<Utc>,
    error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl IngestionJob {
    /// A freshly enqueued job, claimable immediately.
    pub fn enqueue(user_id: impl Into<String>, upload_session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            upload_session_id: upload_session_id.into(),
            status: JobStatus::Queued,
            attempt_count: 0,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            next_run_at: now,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstruct a job from persisted row values.
    #[allow(clippy::too_many_arguments)]
    pub fn from_database(
        id: Uuid,
        user_id: String,
        upload_session_id: String,
        status: JobStatus,
        attempt_count: i32,
        max_attempts: i32,
        next_run_at: DateTime<Utc>,
        error: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            upload_session_id,
            status,
            attempt_count,
            max_attempts,
            next_run_at,
            error,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn upload_session_id(&self) -> &str {
        &self.upload_session_id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn attempt_count(&self) -> i32 {
        self.attempt_count
    }

    pub fn max_attempts(&self) -> i32 {
        self.max_attempts
    }

    pub fn next_run_at(&self) -> DateTime<Utc> {
        self.next_run_at
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn has_attempts_left(&self) -> bool {
        self.attempt_count < self.max_attempts
    }

    /// Whether a claim at `now` would pick this job up.
    pub fn is_claimable_at(&self, now: DateTime<Utc>) -> bool {
        self.status.is_queued() && self.next_run_at <= now && self.has_attempts_left()
    }
}
