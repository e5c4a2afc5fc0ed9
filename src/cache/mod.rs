//! Embedding cache: in-memory entries, single-flight computation, and
//! rehydration from durable rows.

pub mod config;
pub mod error;
pub mod store;
pub mod types;


pub use config::{CacheConfig, RetryPolicy};
pub use error::{CacheError, CacheResult};
pub use store::CacheStore;
pub use types::{CacheStats, CacheStatus, CachedEmbedding};
