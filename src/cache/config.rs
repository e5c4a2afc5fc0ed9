use std::env;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CACHE_MAX_SIZE_MB, DEFAULT_CACHE_TTL_HOURS, DEFAULT_EMBED_TIMEOUT_SECS,
    DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_RETRY_LIMIT,
};

/// Tuning for the in-memory embedding cache.
///
/// Entries expire `ttl` after creation and the cache holds at most
/// `max_size_bytes` of vectors, evicting the oldest entries first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Entry lifetime measured from creation. Default: 24 hours.
    pub ttl: Duration,

    /// Size budget for live entries. Default: 100 MiB.
    pub max_size_bytes: u64,

    /// Interval used by [`start_sweeper`](super::CacheStore::start_sweeper).
    /// Default: 5 minutes.
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_CACHE_TTL_HOURS * 60 * 60),
            max_size_bytes: DEFAULT_CACHE_MAX_SIZE_MB * 1024 * 1024,
            sweep_interval: Duration::from_secs(300),
        }
    }
}

impl CacheConfig {
    const ENV_TTL_HOURS: &'static str = "CONTEXTVEC_CACHE_TTL_HOURS";
    const ENV_MAX_SIZE_MB: &'static str = "CONTEXTVEC_CACHE_MAX_SIZE_MB";
    const ENV_SWEEP_INTERVAL_SECS: &'static str = "CONTEXTVEC_CACHE_SWEEP_INTERVAL_SECS";

    /// Loads cache settings from `CONTEXTVEC_*` environment variables,
    /// falling back to defaults for unset or unparseable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let ttl_hours = parse_u64_from_env(Self::ENV_TTL_HOURS, DEFAULT_CACHE_TTL_HOURS);
        let max_size_mb = parse_u64_from_env(Self::ENV_MAX_SIZE_MB, DEFAULT_CACHE_MAX_SIZE_MB);
        let sweep_secs = parse_u64_from_env(
            Self::ENV_SWEEP_INTERVAL_SECS,
            defaults.sweep_interval.as_secs(),
        );

        Self {
            ttl: Duration::from_secs(ttl_hours * 60 * 60),
            max_size_bytes: max_size_mb * 1024 * 1024,
            sweep_interval: Duration::from_secs(sweep_secs),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_size_bytes(mut self, max_size_bytes: u64) -> Self {
        self.max_size_bytes = max_size_bytes;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

/// Retry and timeout behavior for provider calls made on a cache miss.
///
/// `limit` counts total attempts, not retries after the first. Delays grow
/// exponentially from `base_delay`, with the exponent capped so the
/// multiplier cannot overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts before the failure is reported. Default: 3.
    pub limit: u32,

    /// Delay before the second attempt. Default: 200ms.
    pub base_delay: Duration,

    /// Upper bound on a single provider call. Default: 30 seconds.
    pub call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            limit: DEFAULT_RETRY_LIMIT,
            base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
            call_timeout: Duration::from_secs(DEFAULT_EMBED_TIMEOUT_SECS),
        }
    }
}

impl RetryPolicy {
    pub fn new(limit: u32, base_delay: Duration, call_timeout: Duration) -> Self {
        Self {
            limit: limit.max(1),
            base_delay,
            call_timeout,
        }
    }

    /// Delay to sleep after a failed `attempt` (1-based): doubles each
    /// attempt starting from `base_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay * (1u32 << exponent)
    }
}

fn parse_u64_from_env(var_name: &str, default: u64) -> u64 {
    env::var(var_name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
