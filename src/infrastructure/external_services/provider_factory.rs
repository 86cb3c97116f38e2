use std::env;
use std::sync::Arc;

use crate::application::ports::{Embedder, Structurer, TextExtractor};
use crate::infrastructure::external_services::{
    DeterministicEmbedder, DeterministicStructurer, ModelStructurer, RemoteEmbedder,
};

#[derive(Debug)]
pub enum ProviderFactoryError {
    UnknownProvider(String),
    ClientError(String),
}

impl std::fmt::Display for ProviderFactoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderFactoryError::UnknownProvider(id) => {
                write!(f, "Unknown provider id: {}", id)
            }
            ProviderFactoryError::ClientError(msg) => write!(f, "Client error: {}", msg),
        }
    }
}

impl std::error::Error for ProviderFactoryError {}

/// Structurer selected by `DOCUMENT_STRUCTURER_PROVIDER`. New providers get
/// an id here and an implementation of the `Structurer` port.
pub fn structurer_from_env(
    extractor: Arc<dyn TextExtractor>,
) -> Result<Arc<dyn Structurer>, ProviderFactoryError> {
    let provider_id =
        env::var("DOCUMENT_STRUCTURER_PROVIDER").unwrap_or_else(|_| "deterministic".to_string());
    match provider_id.as_str() {
        "deterministic" => Ok(Arc::new(DeterministicStructurer::new())),
        "model" => {
            let structurer = ModelStructurer::from_env(extractor)
                .map_err(|e| ProviderFactoryError::ClientError(e.to_string()))?;
            Ok(Arc::new(structurer))
        }
        other => Err(ProviderFactoryError::UnknownProvider(other.to_string())),
    }
}

/// Embedder selected by `EMBEDDING_PROVIDER`.
pub fn embedder_from_env() -> Result<Arc<dyn Embedder>, ProviderFactoryError> {
    let provider_id =
        env::var("EMBEDDING_PROVIDER").unwrap_or_else(|_| "deterministic".to_string());
    match provider_id.as_str() {
        "deterministic" => Ok(Arc::new(DeterministicEmbedder::new())),
        "remote" => {
            let embedder = RemoteEmbedder::from_env()
                .map_err(|e| ProviderFactoryError::ClientError(e.to_string()))?;
            Ok(Arc::new(embedder))
        }
        other => Err(ProviderFactoryError::UnknownProvider(other.to_string())),
    }
}
