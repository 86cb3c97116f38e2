use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A provider's proposed chunk, before persistence. Whatever index the
/// provider supplied is discarded; indices are reassigned densely on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkDraft {
    pub text: String,
    pub metadata: Option<serde_json::Value>,
}

impl ChunkDraft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(text: impl Into<String>, metadata: serde_json::Value) -> Self {
        Self {
            text: text.into(),
            metadata: Some(metadata),
        }
    }
}

/// One semantically coherent text unit extracted from a document.
///
/// `chunk_index` values per document form a contiguous prefix starting at 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    id: Uuid,
    document_id: Uuid,
    chunk_index: i32,
    text: String,
    metadata: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl DocumentChunk {
    /// Turn provider drafts into a persistable sequence: trims each text,
    /// drops entries that are empty after trimming, and assigns dense
    /// 0-based indices regardless of the provider's input order markers.
    pub fn sequence(document_id: Uuid, drafts: Vec<ChunkDraft>) -> Vec<DocumentChunk> {
        let now = Utc::now();
        drafts
            .into_iter()
            .filter_map(|draft| {
                let text = draft.text.trim();
                if text.is_empty() {
                    return None;
                }
                Some((text.to_string(), draft.metadata))
            })
            .enumerate()
            .map(|(index, (text, metadata))| DocumentChunk {
                id: Uuid::new_v4(),
                document_id,
                chunk_index: index as i32,
                text,
                metadata,
                created_at: now,
            })
            .collect()
    }

    pub fn from_database(
        id: Uuid,
        document_id: Uuid,
        chunk_index: i32,
        text: String,
        metadata: Option<serde_json::Value>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            document_id,
            chunk_index,
            text,
            metadata,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn document_id(&self) -> Uuid {
        self.document_id
    }

    pub fn chunk_index(&self) -> i32 {
        self.chunk_index
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn metadata(&self) -> Option<&serde_json::Value> {
        self.metadata.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
