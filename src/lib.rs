//! ContextVec library crate (used by the demo binary and integration tests).
//!
//! # Public API Surface
//!
//! The exports are organized by module:
//!
//! ## Core Types (Stable)
//! - [`AnalysisEngine`], [`AnalysisResult`] - One-call page analysis
//! - [`EngineConfig`], [`ConfigError`] - Engine configuration
//! - [`HierarchyBuilder`], [`ContentHierarchy`] - Element validation
//!
//! ## Embeddings & Caching
//! - [`EmbeddingProvider`], [`OllamaProvider`] - Text-to-vector boundary
//! - [`CacheStore`], [`CacheStatus`] - Single-flight embedding cache
//! - [`VectorStore`], [`EmbeddingRow`] - Durable vector rows and run history
//!
//! ## Scoring
//! - [`SimilarityEngine`], [`SimilarityMatrix`] - Relation scoring
//! - [`ChecklistEvaluator`], [`ChecklistResult`] - The graded rule catalogue
//!
//! ## Utilities
//! - [`normalize_text`], [`text_key`] - Content key derivation
//!
//! ## Test/Mock Support
//! [`MockProvider`] is available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod checklist;
pub mod config;
pub mod constants;
pub mod embedding;
pub mod engine;
pub mod hashing;
pub mod hierarchy;
pub mod similarity;
pub mod storage;

pub use cache::{
    CacheConfig, CacheError, CacheResult, CacheStats, CacheStatus, CacheStore, CachedEmbedding,
    RetryPolicy,
};
pub use checklist::{
    Band, ChecklistEvaluator, ChecklistResult, Evidence, Priority, RULES, RuleCode, RuleConfig,
    RuleDef, RuleStatus, rule_def,
};
pub use config::{ConfigError, ConfigResult, EmbeddingConfig, EngineConfig};
pub use constants::{CHECKLIST_RULE_COUNT, DEFAULT_EMBED_MODEL, DEFAULT_EMBEDDING_DIM};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockProvider;
pub use embedding::{
    EmbeddingProvider, EmbeddingVector, OllamaProvider, ProviderError, ProviderResult,
};
pub use engine::{
    AnalysisEngine, AnalysisResult, EmbeddingFailure, EngineError, EngineResult, Finding,
};
pub use hashing::{content_key, key_hex, normalize_text, text_key};
pub use hierarchy::{
    ContentHierarchy, ContentNode, HierarchyBuilder, HierarchyError, HierarchyResult, NodeKind,
    RawElement,
};
pub use similarity::{
    NodeVectors, RelationKind, SimilarityEdge, SimilarityEngine, SimilarityMatrix, centroid,
    cosine_similarity,
};
pub use storage::{
    AnalysisRecord, EmbeddingRow, StorageError, StorageResult, StoreStats, VectorStore,
};
