use async_trait::async_trait;
use std::path::Path;

#[derive(Debug)]
pub enum TextExtractionError {
    UnsupportedExtension(String),
    NoExtractor(String),
    CorruptedFile(String),
    IoError(String),
}

impl std::fmt::Display for TextExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextExtractionError::UnsupportedExtension(ext) => {
                write!(f, "Unsupported extension: {}", ext)
            }
            TextExtractionError::NoExtractor(ext) => {
                write!(f, "No extractor available for {}", ext)
            }
            TextExtractionError::CorruptedFile(msg) => write!(f, "Corrupted file: {}", msg),
            TextExtractionError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for TextExtractionError {}

/// Maps a staged file to its plain-text content.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<String, TextExtractionError>;
}
