use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::StructuredStatus;

/// Metadata for one file staged by the upload handler, as handed to the
/// enqueue operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingDocument {
    pub original_name: String,
    pub stored_name: String,
    pub stored_path: String,
    pub mime_type: String,
    pub size_bytes: i64,
}

/// One file within an ingestion job. Cascades away with its job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedDocument {
    id: Uuid,
    job_id: Uuid,
    user_id: String,
    original_name: String,
    stored_name: String,
    stored_path: String,
    mime_type: String,
    size_bytes: i64,
    structured_status: StructuredStatus,
    error: Option<String>,
    created_at: DateTime<Utc>,
}

impl UploadedDocument {
    pub fn staged(job_id: Uuid, user_id: impl Into<String>, incoming: IncomingDocument) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id,
            user_id: user_id.into(),
            original_name: incoming.original_name,
            stored_name: incoming.stored_name,
            stored_path: incoming.stored_path,
            mime_type: incoming.mime_type,
            size_bytes: incoming.size_bytes,
            structured_status: StructuredStatus::Pending,
            error: None,
            created_at: Utc::now(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_database(
        id: Uuid,
        job_id: Uuid,
        user_id: String,
        original_name: String,
        stored_name: String,
        stored_path: String,
        mime_type: String,
        size_bytes: i64,
        structured_status: StructuredStatus,
        error: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            job_id,
            user_id,
            original_name,
            stored_name,
            stored_path,
            mime_type,
            size_bytes,
            structured_status,
            error,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn stored_name(&self) -> &str {
        &self.stored_name
    }

    pub fn stored_path(&self) -> &str {
        &self.stored_path
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size_bytes(&self) -> i64 {
        self.size_bytes
    }

    pub fn structured_status(&self) -> StructuredStatus {
        self.structured_status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// File extension including the leading dot, lowercased.
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.stored_name)
    }
}

/// Lowercased extension (with leading dot) of a file name, if any.
pub fn extension_of(name: &str) -> Option<String> {
    let dot = name.rfind('.')?;
    if dot == 0 || dot == name.len() - 1 {
        return None;
    }
    Some(name[dot..].to_ascii_lowercase())
}
