//! Durable vector store (file-per-row layout plus analysis history).
//!
//! Rows are rkyv files named by content key under `embeddings/`; writes go
//! through tempfile staging, fsync, and rename, so readers only ever see
//! whole rows. [`VectorStore::store_batch`] stages every row before
//! publishing any of them, keeping an analysis run's vectors visible
//! together or not at all. The analysis history is a line-delimited JSON
//! log, append-only; clearing embeddings never touches it.

pub mod error;
mod model;


pub use error::{StorageError, StorageResult};
pub use model::{AnalysisRecord, EmbeddingRow};

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use rkyv::rancor::Error as RkyvError;
use rkyv::{from_bytes, to_bytes};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};

use crate::hashing::key_hex;

const ROW_EXTENSION: &str = "rkyv";
const EMBEDDINGS_DIR: &str = "embeddings";
const HISTORY_FILE: &str = "history.jsonl";

/// Aggregate stats for the store directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of embedding row files.
    pub embedding_rows: usize,
    /// Total bytes across all row files.
    pub embedding_bytes: u64,
    /// Number of readable history records.
    pub history_records: usize,
}

/// Stores and retrieves [`EmbeddingRow`] records on disk, indexed by
/// content key.
///
/// The store never calls an embedding provider; it is a passive persistence
/// layer populated with vectors that cache misses computed.
#[derive(Debug, Clone)]
pub struct VectorStore {
    root: PathBuf,
    embeddings_dir: PathBuf,
    history_path: PathBuf,
}

impl VectorStore {
    /// Opens a store rooted at `root`, creating the layout if needed.
    pub fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        let embeddings_dir = root.join(EMBEDDINGS_DIR);

        fs::create_dir_all(&embeddings_dir).map_err(|_| StorageError::StorageUnavailable {
            path: embeddings_dir.clone(),
        })?;

        let history_path = root.join(HISTORY_FILE);
        info!(root = %root.display(), "vector store opened");

        Ok(Self {
            root,
            embeddings_dir,
            history_path,
        })
    }

    /// Returns the root storage directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn row_path(&self, key: &[u8; 32]) -> PathBuf {
        self.embeddings_dir
            .join(format!("{}.{}", key_hex(key), ROW_EXTENSION))
    }

    /// O(1) existence check by content key.
    pub fn exists(&self, key: &[u8; 32]) -> bool {
        self.row_path(key).exists()
    }

    /// Loads the row for `key`. Returns `Ok(None)` when absent and
    /// `Err(Serialization)` when the bytes do not validate; the caller
    /// decides whether to evict the corrupt row.
    pub fn load(&self, key: &[u8; 32]) -> StorageResult<Option<EmbeddingRow>> {
        let path = self.row_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path)?;
        // SAFETY: rows are immutable once published; replacement goes
        // through rename, which leaves the mapped inode intact.
        let mmap = unsafe { Mmap::map(&file) }?;

        let row = from_bytes::<EmbeddingRow, RkyvError>(&mmap)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Some(row))
    }

    fn stage(&self, row: &EmbeddingRow) -> StorageResult<(NamedTempFile, PathBuf)> {
        let bytes = to_bytes::<RkyvError>(row)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        // Staged in the destination directory so the final rename stays on
        // one filesystem.
        let mut tmp = NamedTempFile::new_in(&self.embeddings_dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;

        Ok((tmp, self.row_path(&row.key)))
    }

    /// Writes one row (stage, fsync, rename).
    pub fn store(&self, row: &EmbeddingRow) -> StorageResult<()> {
        let (tmp, path) = self.stage(row)?;
        tmp.persist(&path).map_err(|e| StorageError::Io(e.error))?;

        debug!(key = %key_hex(&row.key), dim = row.dimension(), "embedding row stored");
        Ok(())
    }

    /// Persists a batch. Every row is staged before any becomes visible, so
    /// a batch that fails to stage leaves no partial rows behind.
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub fn store_batch(&self, rows: &[EmbeddingRow]) -> StorageResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut staged = Vec::with_capacity(rows.len());
        for row in rows {
            // Tempfiles delete themselves if staging aborts here.
            staged.push(self.stage(row)?);
        }

        let mut stored = 0;
        for (tmp, path) in staged {
            tmp.persist(&path).map_err(|e| StorageError::Io(e.error))?;
            stored += 1;
        }

        debug!(rows = stored, "embedding batch stored");
        Ok(stored)
    }

    /// Removes the row for `key`. Returns `false` when no row existed.
    pub fn delete(&self, key: &[u8; 32]) -> StorageResult<bool> {
        let path = self.row_path(key);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        Ok(true)
    }

    fn row_files(&self) -> StorageResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        if !self.embeddings_dir.exists() {
            return Ok(files);
        }

        for entry in fs::read_dir(&self.embeddings_dir)? {
            let entry = entry?;
            let path = entry.path();

            if let Some(ext) = path.extension()
                && ext == ROW_EXTENSION
            {
                files.push(path);
            }
        }

        Ok(files)
    }

    /// Removes every embedding row. History records are untouched.
    pub fn clear_embeddings(&self) -> StorageResult<usize> {
        let files = self.row_files()?;

        let mut removed = 0;
        for path in &files {
            fs::remove_file(path)?;
            removed += 1;
        }

        info!(removed, "cleared embedding rows");
        Ok(removed)
    }

    /// Appends one analysis record to the history log.
    pub fn record_analysis(&self, record: &AnalysisRecord) -> StorageResult<()> {
        let line = serde_json::to_string(record)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.history_path)?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_all()?;

        debug!(run_id = %record.run_id, score = record.overall_score, "analysis recorded");
        Ok(())
    }

    /// Returns history records oldest-first, skipping unreadable lines.
    pub fn history(&self) -> StorageResult<Vec<AnalysisRecord>> {
        if !self.history_path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.history_path)?;
        let mut records = Vec::new();

        for (index, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(line = index + 1, error = %e, "skipping unreadable history line");
                }
            }
        }

        Ok(records)
    }

    /// Returns row/byte counts by directory scan, plus history length.
    pub fn stats(&self) -> StorageResult<StoreStats> {
        let files = self.row_files()?;

        let mut total_bytes = 0;
        for path in &files {
            if let Ok(metadata) = fs::metadata(path) {
                total_bytes += metadata.len();
            }
        }

        Ok(StoreStats {
            embedding_rows: files.len(),
            embedding_bytes: total_bytes,
            history_records: self.history()?.len(),
        })
    }
}
