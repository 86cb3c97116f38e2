pub mod chunk_embedding;
pub mod document_chunk;
pub mod ingestion_job;
pub mod uploaded_document;

pub use chunk_embedding::ChunkEmbedding;
pub use document_chunk::{ChunkDraft, DocumentChunk};
pub use ingestion_job::IngestionJob;
pub use uploaded_document::{IncomingDocument, UploadedDocument};
