use async_trait::async_trait;
use reqwest::{Client, Error as ReqwestError};
use serde::Serialize;
use serde_json::Value;
use std::env;
use std::time::Duration;

use crate::application::ports::{Embedder, EmbedderError, EmbeddingVector};

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Clone)]
pub struct RemoteEmbedderConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for RemoteEmbedderConfig {
    fn default() -> Self {
        let base_url = env::var("EMBEDDING_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:11434".to_string());
        let model =
            env::var("EMBEDDING_MODEL").unwrap_or_else(|_| "nomic-embed-text".to_string());

        Self {
            base_url,
            model,
            timeout_secs: 60,
        }
    }
}

/// Embedder backed by an HTTP endpoint answering `{model, prompt}` with
/// `{embedding: number[]}`. The vector length reported by the server becomes
/// the stored dimension.
pub struct RemoteEmbedder {
    client: Client,
    config: RemoteEmbedderConfig,
}

impl RemoteEmbedder {
    pub fn new(config: RemoteEmbedderConfig) -> Result<Self, ReqwestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, ReqwestError> {
        Self::new(RemoteEmbedderConfig::default())
    }

    fn context(&self, detail: impl std::fmt::Display) -> String {
        format!("embedding provider remote/{}: {}", self.config.model, detail)
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    fn model_id(&self) -> &str {
        &self.config.model
    }

    fn validate_config(&self) -> Result<(), String> {
        url::Url::parse(&self.config.base_url)
            .map_err(|e| format!("EMBEDDING_BASE_URL is not a valid URL: {}", e))?;
        if self.config.model.trim().is_empty() {
            return Err("EMBEDDING_MODEL is empty".to_string());
        }
        Ok(())
    }

    async fn embed(&self, text: &str) -> Result<EmbeddingVector, EmbedderError> {
        let url = format!(
            "{}/api/embeddings",
            self.config.base_url.trim_end_matches('/')
        );
        let request = EmbeddingRequest {
            model: &self.config.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| EmbedderError::NetworkError(self.context(e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EmbedderError::InvalidResponse(self.context(e)))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(String::from))
                .unwrap_or(body);
            return Err(EmbedderError::ApiError(
                self.context(format!("{}: {}", status, detail)),
            ));
        }

        let payload: Value = serde_json::from_str(&body)
            .map_err(|e| EmbedderError::InvalidResponse(self.context(e)))?;

        let values =
            parse_embedding_payload(&payload).map_err(|e| EmbedderError::InvalidResponse(self.context(e)))?;

        Ok(EmbeddingVector {
            model: self.config.model.clone(),
            dimensions: values.len(),
            values,
        })
    }
}

/// The payload must carry a non-empty `embedding` array of finite numbers.
fn parse_embedding_payload(payload: &Value) -> Result<Vec<f32>, String> {
    let embedding = payload
        .get("embedding")
        .ok_or_else(|| "payload has no 'embedding' field".to_string())?;
    let entries = embedding
        .as_array()
        .ok_or_else(|| "'embedding' is not an array".to_string())?;
    if entries.is_empty() {
        return Err("'embedding' is empty".to_string());
    }

    entries
        .iter()
        .map(|entry| {
            entry
                .as_f64()
                .filter(|v| v.is_finite())
                .map(|v| v as f32)
                .ok_or_else(|| format!("'embedding' contains a non-finite entry: {}", entry))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_well_formed_payload() {
        let values = parse_embedding_payload(&json!({"embedding": [0.25, -1.5, 3.0]})).unwrap();
        assert_eq!(values, vec![0.25, -1.5, 3.0]);
    }

    #[test]
    fn rejects_missing_or_non_array_payloads() {
        assert!(parse_embedding_payload(&json!({})).is_err());
        assert!(parse_embedding_payload(&json!({"embedding": "oops"})).is_err());
    }

    #[test]
    fn rejects_empty_vectors() {
        assert!(parse_embedding_payload(&json!({"embedding": []})).is_err());
    }

    #[test]
    fn rejects_non_finite_entries() {
        assert!(parse_embedding_payload(&json!({"embedding": [0.1, null, 0.3]})).is_err());
        assert!(parse_embedding_payload(&json!({"embedding": [0.1, "NaN"]})).is_err());
    }
}
