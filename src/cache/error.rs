use thiserror::Error;

use crate::embedding::ProviderError;

/// Errors surfaced by the embedding cache.
///
/// `Clone` is required: a failed computation is broadcast to every caller
/// waiting on the same key.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CacheError {
    /// The provider failed or timed out on every permitted attempt.
    #[error("embedding failed after {attempts} attempt(s): {source}")]
    EmbeddingFailed {
        attempts: u32,
        #[source]
        source: ProviderError,
    },
}

impl CacheError {
    /// Returns the underlying provider error.
    pub fn provider_error(&self) -> &ProviderError {
        match self {
            CacheError::EmbeddingFailed { source, .. } => source,
        }
    }
}

pub type CacheResult<T> = Result<T, CacheError>;
