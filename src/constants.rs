//! Default tunables shared across the crate.
//!
//! Everything here can be overridden at runtime through a `CONTEXTVEC_*`
//! environment variable; each config module documents the names it reads.
//! The constants are what you get when nothing is set, kept in one place so
//! the config layers and their tests agree on the out-of-the-box behavior.

pub const DEFAULT_EMBED_MODEL: &str = "mxbai-embed-large";
pub const DEFAULT_EMBEDDING_DIM: usize = 1024;

pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

pub const DEFAULT_CACHE_TTL_HOURS: u64 = 24;
pub const DEFAULT_CACHE_MAX_SIZE_MB: u64 = 100;

pub const DEFAULT_DRIFT_THRESHOLD: f32 = 0.50;
pub const DEFAULT_H2_COUNT_MIN: usize = 4;
pub const DEFAULT_H2_COUNT_MAX: usize = 8;

pub const DEFAULT_EMBED_CONCURRENCY: usize = 4;
pub const DEFAULT_EMBED_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RETRY_LIMIT: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 200;

/// Number of checklist codes (CV-001 through CV-036). The rule table and
/// [`RuleCode::ALL`](crate::checklist::RuleCode::ALL) are both sized by this,
/// so a catalogue edit that misses one side fails to compile.
pub const CHECKLIST_RULE_COUNT: usize = 36;
