pub mod embedder;
pub mod structurer;
pub mod text_extractor;

pub use embedder::{Embedder, EmbedderError, EmbeddingVector};
pub use structurer::{StructureOutcome, Structurer};
pub use text_extractor::{TextExtractionError, TextExtractor};
