use thiserror::Error;

use crate::config::ConfigError;
use crate::hierarchy::HierarchyError;
use crate::storage::StorageError;

/// Errors that abort an analysis request outright.
///
/// Embedding failures are deliberately absent: a dead provider degrades the
/// affected rules to inconclusive and the run still produces a report.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine configuration was rejected at construction.
    #[error("invalid engine configuration: {0}")]
    Config(#[from] ConfigError),

    /// The element list could not form a hierarchy.
    #[error("invalid content hierarchy: {0}")]
    Hierarchy(#[from] HierarchyError),

    /// The vector store could not be opened at construction.
    #[error("vector store unavailable: {0}")]
    Storage(#[from] StorageError),
}

/// Convenience result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
