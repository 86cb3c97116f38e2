use async_trait::async_trait;

#[derive(Debug)]
pub enum EmbedderError {
    NetworkError(String),
    ApiError(String),
    InvalidResponse(String),
}

impl std::fmt::Display for EmbedderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbedderError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            EmbedderError::ApiError(msg) => write!(f, "API error: {}", msg),
            EmbedderError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

impl std::error::Error for EmbedderError {}

/// One embedding as returned by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingVector {
    pub model: String,
    pub dimensions: usize,
    pub values: Vec<f32>,
}

/// Capability converting a chunk's text to a vector. Errors here abort the
/// whole job attempt (bounded retry at the queue level), unlike structuring
/// outcomes which are per-document.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier stored alongside each embedding row.
    fn model_id(&self) -> &str;

    fn validate_config(&self) -> Result<(), String> {
        Ok(())
    }

    async fn embed(&self, text: &str) -> Result<EmbeddingVector, EmbedderError>;
}
