//! Embedding provider boundary.
//!
//! The engine consumes embeddings through [`EmbeddingProvider`]; it never
//! calls a network service directly. [`OllamaProvider`] adapts a local
//! Ollama server; [`MockProvider`] (behind the `mock` feature) is a
//! deterministic stand-in for tests and offline runs.

mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod ollama;

pub use error::{ProviderError, ProviderResult};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockProvider;
pub use ollama::OllamaProvider;

use async_trait::async_trait;

use crate::hashing::text_key;

/// A fixed-dimension embedding, keyed by (model identifier, normalized text).
///
/// Two texts that normalize identically share a key and therefore a vector;
/// the key also names the durable row on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingVector {
    pub key: [u8; 32],
    pub model: String,
    pub values: Vec<f32>,
}

impl EmbeddingVector {
    /// Builds a vector for `text`, deriving the content key from the model
    /// identifier and the normalized text.
    pub fn for_text(model: &str, text: &str, values: Vec<f32>) -> Self {
        Self {
            key: text_key(model, text),
            model: model.to_string(),
            values,
        }
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Approximate in-memory footprint, used for cache size accounting.
    pub fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.model.len()
            + self.values.len() * std::mem::size_of::<f32>()
    }
}

/// Batch text-to-vector capability, consumed (never owned) by the engine.
///
/// Implementations must return exactly one vector per input text, in input
/// order, each with the dimension reported by [`dimension`](Self::dimension).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds a batch of texts.
    async fn embed(&self, texts: &[String]) -> ProviderResult<Vec<Vec<f32>>>;

    /// Model identifier, part of every content key.
    fn model(&self) -> &str;

    /// Fixed vector dimension for this model.
    fn dimension(&self) -> usize;
}
