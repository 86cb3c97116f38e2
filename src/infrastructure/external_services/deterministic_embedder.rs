use async_trait::async_trait;

use crate::application::ports::{Embedder, EmbedderError, EmbeddingVector};

pub const DIMENSIONS: usize = 128;
const MODEL_ID: &str = "deterministic-fold-128";

/// Stand-in embedder producing a stable 128-dim vector from the text's code
/// points. Good enough to exercise the pipeline end to end without a model
/// server.
pub struct DeterministicEmbedder;

impl DeterministicEmbedder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DeterministicEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for DeterministicEmbedder {
    fn model_id(&self) -> &str {
        MODEL_ID
    }

    async fn embed(&self, text: &str) -> Result<EmbeddingVector, EmbedderError> {
        let mut values = vec![0.0f32; DIMENSIONS];
        for (i, ch) in text.chars().enumerate() {
            values[i % DIMENSIONS] += (ch as u32 % 31) as f32 / 31.0;
        }

        // L2-normalize with a norm floor of 1 so empty input stays a zero
        // vector instead of dividing by zero.
        let norm = values
            .iter()
            .map(|v| v * v)
            .sum::<f32>()
            .sqrt()
            .max(1.0);
        for value in &mut values {
            *value /= norm;
        }

        Ok(EmbeddingVector {
            model: MODEL_ID.to_string(),
            dimensions: DIMENSIONS,
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn produces_128_dimensions() {
        let vector = DeterministicEmbedder::new().embed("hello world").await.unwrap();

        assert_eq!(vector.dimensions, DIMENSIONS);
        assert_eq!(vector.values.len(), DIMENSIONS);
        assert_eq!(vector.model, MODEL_ID);
    }

    #[tokio::test]
    async fn same_text_same_vector() {
        let embedder = DeterministicEmbedder::new();
        let a = embedder.embed("repeatable").await.unwrap();
        let b = embedder.embed("repeatable").await.unwrap();

        assert_eq!(a.values, b.values);
    }

    #[tokio::test]
    async fn long_text_is_unit_norm() {
        let text = "the quick brown fox jumps over the lazy dog ".repeat(20);
        let vector = DeterministicEmbedder::new().embed(&text).await.unwrap();

        let norm: f32 = vector.values.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn empty_text_stays_a_zero_vector() {
        let vector = DeterministicEmbedder::new().embed("").await.unwrap();

        assert!(vector.values.iter().all(|v| *v == 0.0));
    }
}
