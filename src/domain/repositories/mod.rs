pub mod chunk_repository;
pub mod document_repository;
pub mod embedding_repository;
pub mod job_repository;

pub use chunk_repository::ChunkRepository;
pub use document_repository::DocumentRepository;
pub use embedding_repository::EmbeddingRepository;
pub use job_repository::JobRepository;
