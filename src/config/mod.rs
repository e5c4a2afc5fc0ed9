//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `CONTEXTVEC_*` environment
//! variables. Construction is lenient for tunables and strict for the fields
//! that change what the vectors mean; [`EngineConfig::validate`] is the
//! fatal gate the engine runs at startup.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::{ConfigError, ConfigResult};

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::{CacheConfig, RetryPolicy};
use crate::checklist::RuleConfig;
use crate::constants::{
    DEFAULT_EMBED_CONCURRENCY, DEFAULT_EMBED_MODEL, DEFAULT_EMBED_TIMEOUT_SECS,
    DEFAULT_EMBEDDING_DIM, DEFAULT_OLLAMA_BASE_URL, DEFAULT_RETRY_BASE_DELAY_MS,
    DEFAULT_RETRY_LIMIT,
};

/// Embedding provider settings.
///
/// The model identifier participates in every cache key, so two configs with
/// different models never share vectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingConfig {
    /// Model identifier sent to the provider. Default: `mxbai-embed-large`.
    pub model: String,

    /// Expected vector width. Rows and responses with any other width are
    /// rejected. Default: `1024`.
    pub dimension: usize,

    /// Base URL of the Ollama-compatible endpoint.
    pub base_url: String,

    /// How many embedding calls may run at once during an analysis.
    pub concurrency: usize,

    /// Per-call timeout; a call past this counts as a failed attempt.
    pub call_timeout: Duration,

    /// Attempts per text before the failure is reported.
    pub retry_limit: u32,

    /// Backoff starts here and doubles per attempt.
    pub retry_base_delay: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_EMBED_MODEL.to_string(),
            dimension: DEFAULT_EMBEDDING_DIM,
            base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            concurrency: DEFAULT_EMBED_CONCURRENCY,
            call_timeout: Duration::from_secs(DEFAULT_EMBED_TIMEOUT_SECS),
            retry_limit: DEFAULT_RETRY_LIMIT,
            retry_base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
        }
    }
}

impl EmbeddingConfig {
    pub const ENV_MODEL: &'static str = "CONTEXTVEC_EMBED_MODEL";
    pub const ENV_DIMENSION: &'static str = "CONTEXTVEC_EMBED_DIM";
    pub const ENV_BASE_URL: &'static str = "CONTEXTVEC_OLLAMA_URL";
    pub const ENV_CONCURRENCY: &'static str = "CONTEXTVEC_EMBED_CONCURRENCY";
    pub const ENV_TIMEOUT_SECS: &'static str = "CONTEXTVEC_EMBED_TIMEOUT_SECS";
    pub const ENV_RETRY_LIMIT: &'static str = "CONTEXTVEC_RETRY_LIMIT";
    pub const ENV_RETRY_BASE_DELAY_MS: &'static str = "CONTEXTVEC_RETRY_BASE_DELAY_MS";

    /// Loads embedding settings from environment variables (falling back to
    /// defaults). The dimension and concurrency are parsed strictly because
    /// a silently wrong value would corrupt keys or serialize every call.
    pub fn from_env() -> ConfigResult<Self> {
        let defaults = Self::default();

        let dimension = parse_strict_usize(Self::ENV_DIMENSION, defaults.dimension)?;
        let concurrency = parse_strict_usize(Self::ENV_CONCURRENCY, defaults.concurrency)?;

        Ok(Self {
            model: parse_string_from_env(Self::ENV_MODEL, defaults.model),
            dimension,
            base_url: parse_string_from_env(Self::ENV_BASE_URL, defaults.base_url),
            concurrency,
            call_timeout: Duration::from_secs(parse_u64_from_env(
                Self::ENV_TIMEOUT_SECS,
                DEFAULT_EMBED_TIMEOUT_SECS,
            )),
            retry_limit: parse_u64_from_env(Self::ENV_RETRY_LIMIT, u64::from(DEFAULT_RETRY_LIMIT))
                as u32,
            retry_base_delay: Duration::from_millis(parse_u64_from_env(
                Self::ENV_RETRY_BASE_DELAY_MS,
                DEFAULT_RETRY_BASE_DELAY_MS,
            )),
        })
    }

    /// Retry policy for the cache's compute path, derived from the embedding
    /// settings so both ends agree on the timeout.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_limit, self.retry_base_delay, self.call_timeout)
    }
}

/// Top-level engine configuration: provider, cache, rules, and data layout.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub embedding: EmbeddingConfig,
    pub cache: CacheConfig,
    pub rules: RuleConfig,

    /// Directory for durable rows and the analysis history.
    /// Default: `./.data`.
    pub data_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            embedding: EmbeddingConfig::default(),
            cache: CacheConfig::default(),
            rules: RuleConfig::default(),
            data_dir: PathBuf::from("./.data"),
        }
    }
}

impl EngineConfig {
    pub const ENV_DATA_DIR: &'static str = "CONTEXTVEC_DATA_DIR";

    /// Loads the full configuration from environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            embedding: EmbeddingConfig::from_env()?,
            cache: CacheConfig::from_env(),
            rules: RuleConfig::from_env(),
            data_dir: env::var(Self::ENV_DATA_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
        })
    }

    /// Validates invariants across the whole configuration (does not create
    /// directories). Any error here aborts engine construction.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.embedding.model.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "embedding.model",
                message: "model identifier must not be empty".to_string(),
            });
        }
        if self.embedding.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "embedding.base_url",
                message: "provider URL must not be empty".to_string(),
            });
        }
        if self.embedding.dimension == 0 {
            return Err(ConfigError::InvalidValue {
                key: "embedding.dimension",
                message: "vector width must be at least 1".to_string(),
            });
        }
        if self.embedding.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                key: "embedding.concurrency",
                message: "at least one concurrent call is required".to_string(),
            });
        }
        if self.cache.max_size_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "cache.max_size_bytes",
                message: "cache budget must be at least 1 byte".to_string(),
            });
        }
        if self.data_dir.exists() && !self.data_dir.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: self.data_dir.clone(),
            });
        }
        self.rules.validate()
    }
}

fn parse_string_from_env(var_name: &str, default: String) -> String {
    env::var(var_name).unwrap_or(default)
}

fn parse_u64_from_env(var_name: &str, default: u64) -> u64 {
    env::var(var_name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_strict_usize(key: &'static str, default: usize) -> ConfigResult<usize> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|e| ConfigError::InvalidInteger {
                key,
                value,
                source: e,
            }),
        Err(_) => Ok(default),
    }
}
