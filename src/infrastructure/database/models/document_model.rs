use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::UploadedDocument;
use crate::domain::value_objects::StructuredStatus;
use crate::infrastructure::database::schema::uploaded_documents;

#[derive(Debug, Queryable, Identifiable, Selectable, Associations)]
#[diesel(belongs_to(super::JobModel, foreign_key = job_id))]
#[diesel(table_name = uploaded_documents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DocumentModel {
    pub id: Uuid,
    pub job_id: Uuid,
    pub user_id: String,
    pub original_name: String,
    pub stored_name: String,
    pub stored_path: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub structured_status: String,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = uploaded_documents)]
pub struct NewDocumentModel {
    pub id: Uuid,
    pub job_id: Uuid,
    pub user_id: String,
    pub original_name: String,
    pub stored_name: String,
    pub stored_path: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub structured_status: String,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&UploadedDocument> for NewDocumentModel {
    fn from(document: &UploadedDocument) -> Self {
        Self {
            id: document.id(),
            job_id: document.job_id(),
            user_id: document.user_id().to_string(),
            original_name: document.original_name().to_string(),
            stored_name: document.stored_name().to_string(),
            stored_path: document.stored_path().to_string(),
            mime_type: document.mime_type().to_string(),
            size_bytes: document.size_bytes(),
            structured_status: document.structured_status().as_str().to_string(),
            error: document.error().map(|s| s.to_string()),
            created_at: document.created_at(),
        }
    }
}

impl TryFrom<DocumentModel> for UploadedDocument {
    type Error = String;

    fn try_from(model: DocumentModel) -> Result<Self, Self::Error> {
        let status = StructuredStatus::parse(&model.structured_status)?;
        Ok(UploadedDocument::from_database(
            model.id,
            model.job_id,
            model.user_id,
            model.original_name,
            model.stored_name,
            model.stored_path,
            model.mime_type,
            model.size_bytes,
            status,
            model.error,
            model.created_at,
        ))
    }
}
