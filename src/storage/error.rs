use std::path::PathBuf;
use thiserror::Error;

/// Failure modes of the on-disk vector store.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Underlying filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An rkyv row failed to encode or decode. Callers treat this as a
    /// corrupt row: evict lazily and recompute, never fatal.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The store root could not be created or opened.
    #[error("storage root unavailable: {path}")]
    StorageUnavailable { path: PathBuf },
}

pub type StorageResult<T> = Result<T, StorageError>;
