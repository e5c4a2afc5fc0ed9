use crate::embedding::EmbeddingVector;

/// Where a requested embedding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheStatus {
    /// Served from the in-memory cache.
    Hit,
    /// Reloaded from a durable row on disk.
    Rehydrated,
    /// Computed by the embedding provider on this call.
    Computed,
}

impl CacheStatus {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Rehydrated => "REHYDRATED",
            CacheStatus::Computed => "COMPUTED",
        }
    }

    /// Returns `true` when the embedding was served without a provider call.
    #[inline]
    pub fn is_hit(&self) -> bool {
        !matches!(self, CacheStatus::Computed)
    }
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An embedding together with how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEmbedding {
    pub vector: EmbeddingVector,
    pub status: CacheStatus,
}

impl CachedEmbedding {
    #[inline]
    pub fn new(vector: EmbeddingVector, status: CacheStatus) -> Self {
        Self { vector, status }
    }
}

/// Point-in-time counters for a cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Live entries currently held in memory.
    pub entries: usize,
    /// Bytes attributed to live entries.
    pub total_bytes: u64,
    /// Lookups served from memory.
    pub hits: u64,
    /// Lookups that required a provider call.
    pub misses: u64,
    /// Lookups served from durable rows.
    pub rehydrations: u64,
    /// Entries removed to stay under the size budget.
    pub evictions: u64,
}
