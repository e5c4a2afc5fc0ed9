//! Deterministic embedding stub for tests and offline demos.

use async_trait::async_trait;

use super::error::ProviderResult;
use super::EmbeddingProvider;
use crate::hashing::normalize_text;

/// Hash-seeded pseudo-embedder.
///
/// Seeds a small LCG from the normalized text's hash and scales the output
/// to unit norm: identical (normalized) inputs yield identical vectors,
/// distinct inputs yield uncorrelated ones. No model weights, no I/O.
#[derive(Debug, Clone)]
pub struct MockProvider {
    model: String,
    dimension: usize,
}

impl MockProvider {
    pub fn new(dimension: usize) -> Self {
        Self {
            model: "mock-embed".to_string(),
            dimension,
        }
    }

    pub fn with_model(model: impl Into<String>, dimension: usize) -> Self {
        Self {
            model: model.into(),
            dimension,
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        use std::hash::{DefaultHasher, Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        normalize_text(text).hash(&mut hasher);
        let seed = hasher.finish();

        let mut values = Vec::with_capacity(self.dimension);
        let mut state = seed;
        for _ in 0..self.dimension {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let value = ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
            values.push(value);
        }

        let norm: f32 = values.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut values {
                *x /= norm;
            }
        }

        values
    }
}

#[async_trait]
impl EmbeddingProvider for MockProvider {
    async fn embed(&self, texts: &[String]) -> ProviderResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
