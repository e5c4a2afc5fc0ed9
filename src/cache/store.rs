//! In-memory embedding cache with single-flight computation.
//!
//! One lock guards the entry map, the arrival queue, and the byte count, so
//! expiry and eviction stay atomic with the lookups around them. Concurrent
//! requests for the same key share one provider call through a watch
//! channel; the shared outcome includes failures, which are never cached.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, instrument, warn};

use super::config::{CacheConfig, RetryPolicy};
use super::error::{CacheError, CacheResult};
use super::types::{CacheStats, CacheStatus, CachedEmbedding};
use crate::embedding::{EmbeddingProvider, EmbeddingVector, ProviderError};
use crate::hashing::{content_key, key_hex, normalize_text};
use crate::storage::{StorageError, VectorStore};

struct CacheEntry {
    vector: EmbeddingVector,
    created_at: Instant,
    seq: u64,
    size_bytes: u64,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<[u8; 32], CacheEntry>,
    /// Insertion order as `(key, seq)` pairs, oldest first. Slots whose seq
    /// no longer matches the live entry are stale and skipped on pop.
    arrival: VecDeque<([u8; 32], u64)>,
    total_bytes: u64,
    next_seq: u64,
}

#[derive(Debug, Clone)]
enum FlightState {
    Pending,
    Done(CacheResult<CachedEmbedding>),
}

enum FlightRole {
    Leader(watch::Sender<FlightState>),
    Waiter(watch::Receiver<FlightState>),
}

/// Removes the flight entry when the leader finishes or is dropped
/// mid-computation, so waiters can elect a new leader.
struct FlightGuard<'a> {
    store: &'a CacheStore,
    key: [u8; 32],
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.store.flights.lock().remove(&self.key);
    }
}

/// Embedding cache keyed by `blake3(model | normalized text)`.
///
/// Lookups are served from memory when a live entry exists, from a durable
/// [`VectorStore`] row when one is attached, and otherwise by calling the
/// provider with retry and a per-call timeout. The provider receives the
/// normalized text, so any input that normalizes identically maps to one
/// vector.
pub struct CacheStore {
    provider: Arc<dyn EmbeddingProvider>,
    store: Option<Arc<VectorStore>>,
    config: CacheConfig,
    policy: RetryPolicy,
    state: Mutex<CacheState>,
    flights: Mutex<HashMap<[u8; 32], watch::Receiver<FlightState>>>,
    sweeper_running: AtomicBool,
    hits: AtomicU64,
    misses: AtomicU64,
    rehydrations: AtomicU64,
    evictions: AtomicU64,
}

impl CacheStore {
    /// Creates a memory-only cache in front of `provider`.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: CacheConfig) -> Self {
        Self {
            provider,
            store: None,
            config,
            policy: RetryPolicy::default(),
            state: Mutex::new(CacheState::default()),
            flights: Mutex::new(HashMap::new()),
            sweeper_running: AtomicBool::new(false),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            rehydrations: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Attaches a durable store; misses check it before calling the provider.
    pub fn with_store(mut self, store: Arc<VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Overrides the default retry and timeout policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the active cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the embedding for `text`, computing it at most once across
    /// concurrent callers of the same key.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn get_or_compute(&self, text: &str) -> CacheResult<CachedEmbedding> {
        let normalized = normalize_text(text);
        let key = content_key(self.provider.model(), &normalized);

        loop {
            if let Some(vector) = self.lookup(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key_hex(&key), "cache hit");
                return Ok(CachedEmbedding::new(vector, CacheStatus::Hit));
            }

            let role = {
                let mut flights = self.flights.lock();
                match flights.get(&key) {
                    Some(receiver) => FlightRole::Waiter(receiver.clone()),
                    None => {
                        let (sender, receiver) = watch::channel(FlightState::Pending);
                        flights.insert(key, receiver);
                        FlightRole::Leader(sender)
                    }
                }
            };

            match role {
                FlightRole::Leader(sender) => {
                    let _guard = FlightGuard { store: self, key };
                    let result = self.compute_entry(&key, &normalized).await;
                    let _ = sender.send(FlightState::Done(result.clone()));
                    return result;
                }
                FlightRole::Waiter(mut receiver) => {
                    debug!(key = %key_hex(&key), "waiting on in-flight computation");
                    match receiver
                        .wait_for(|state| matches!(state, FlightState::Done(_)))
                        .await
                    {
                        Ok(state) => {
                            if let FlightState::Done(result) = &*state {
                                return result.clone();
                            }
                        }
                        // Leader dropped without publishing; elect a new one.
                        Err(_) => {}
                    }
                }
            }
        }
    }

    /// Returns `true` when a live (unexpired) entry exists for `text`.
    pub fn contains(&self, text: &str) -> bool {
        let key = content_key(self.provider.model(), &normalize_text(text));
        let state = self.state.lock();
        state
            .entries
            .get(&key)
            .is_some_and(|entry| entry.created_at.elapsed() < self.config.ttl)
    }

    /// Number of entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every expired entry. Returns how many were dropped.
    pub fn sweep(&self) -> usize {
        let removed = self.remove_older_than(self.config.ttl);
        if removed > 0 {
            debug!(removed, "swept expired entries");
        }
        removed
    }

    /// Removes entries created more than `max_age` ago, regardless of TTL.
    pub fn clear_older_than(&self, max_age: Duration) -> usize {
        let removed = self.remove_older_than(max_age);
        if removed > 0 {
            info!(removed, max_age_secs = max_age.as_secs(), "cleared aged entries");
        }
        removed
    }

    /// Drops every entry. Lifetime counters are preserved.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        let removed = state.entries.len();
        state.entries.clear();
        state.arrival.clear();
        state.total_bytes = 0;
        info!(removed, "cache cleared");
    }

    /// Returns a snapshot of entry counts and lifetime counters.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            entries: state.entries.len(),
            total_bytes: state.total_bytes,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            rehydrations: self.rehydrations.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Starts a background task that sweeps expired entries on the
    /// configured interval (no-op if one is already running). The task holds
    /// a weak reference and exits once the cache is dropped.
    pub fn start_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        // AcqRel: swap needs both load and store semantics so only one
        // sweeper task starts per store.
        if self.sweeper_running.swap(true, Ordering::AcqRel) {
            return tokio::spawn(async {});
        }

        let cache = Arc::downgrade(self);
        let sweep_interval = self.config.sweep_interval;

        tokio::spawn(async move {
            let mut interval = time::interval(sweep_interval);
            // The first tick completes immediately; skip it.
            interval.tick().await;
            loop {
                interval.tick().await;
                match cache.upgrade() {
                    Some(cache) => {
                        cache.sweep();
                    }
                    None => break,
                }
            }
        })
    }

    async fn compute_entry(&self, key: &[u8; 32], normalized: &str) -> CacheResult<CachedEmbedding> {
        if let Some(store) = &self.store
            && let Some(vector) = self.rehydrate(store, key).await
        {
            self.rehydrations.fetch_add(1, Ordering::Relaxed);
            self.insert(*key, vector.clone());
            info!(key = %key_hex(key), "rehydrated embedding from durable row");
            return Ok(CachedEmbedding::new(vector, CacheStatus::Rehydrated));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let values = self.embed_with_retry(normalized).await?;
        let vector = EmbeddingVector {
            key: *key,
            model: self.provider.model().to_string(),
            values,
        };
        self.insert(*key, vector.clone());
        debug!(key = %key_hex(key), dim = vector.dimension(), "embedding computed and cached");
        Ok(CachedEmbedding::new(vector, CacheStatus::Computed))
    }

    /// Attempts to reload a vector from the durable store. Corrupt rows are
    /// deleted so the next miss recomputes cleanly; any storage failure
    /// degrades to a provider call.
    async fn rehydrate(&self, store: &Arc<VectorStore>, key: &[u8; 32]) -> Option<EmbeddingVector> {
        let load_store = Arc::clone(store);
        let load_key = *key;
        let loaded = tokio::task::spawn_blocking(move || load_store.load(&load_key)).await;

        match loaded {
            Ok(Ok(Some(row))) => Some(row.into_vector()),
            Ok(Ok(None)) => None,
            Ok(Err(StorageError::Serialization(message))) => {
                warn!(key = %key_hex(key), %message, "corrupt embedding row, removing");
                let delete_store = Arc::clone(store);
                let delete_key = *key;
                match tokio::task::spawn_blocking(move || delete_store.delete(&delete_key)).await {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => warn!(key = %key_hex(key), error = %e, "failed to remove corrupt row"),
                    Err(e) => warn!(error = %e, "corrupt row removal task failed"),
                }
                None
            }
            Ok(Err(e)) => {
                warn!(key = %key_hex(key), error = %e, "durable row load failed");
                None
            }
            Err(e) => {
                warn!(error = %e, "durable row load task failed");
                None
            }
        }
    }

    async fn embed_with_retry(&self, normalized: &str) -> CacheResult<Vec<f32>> {
        let batch = [normalized.to_string()];
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let call = self.provider.embed(&batch);
            let outcome = match time::timeout(self.policy.call_timeout, call).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout {
                    timeout_ms: self.policy.call_timeout.as_millis() as u64,
                }),
            };

            let error = match outcome {
                Ok(mut vectors) if vectors.len() == 1 => return Ok(vectors.swap_remove(0)),
                Ok(vectors) => ProviderError::CountMismatch {
                    expected: 1,
                    actual: vectors.len(),
                },
                Err(e) => e,
            };

            if attempt >= self.policy.limit {
                warn!(attempts = attempt, error = %error, "embedding attempts exhausted");
                return Err(CacheError::EmbeddingFailed {
                    attempts: attempt,
                    source: error,
                });
            }

            let delay = self.policy.delay_for(attempt);
            debug!(attempt, delay_ms = delay.as_millis() as u64, error = %error, "embedding call failed, retrying");
            time::sleep(delay).await;
        }
    }

    fn lookup(&self, key: &[u8; 32]) -> Option<EmbeddingVector> {
        let ttl = self.config.ttl;
        let mut state = self.state.lock();

        let expired = match state.entries.get(key) {
            Some(entry) if entry.created_at.elapsed() < ttl => {
                return Some(entry.vector.clone());
            }
            Some(_) => true,
            None => false,
        };

        // Expired entries are dropped on read rather than waiting for the
        // sweeper.
        if expired
            && let Some(old) = state.entries.remove(key)
        {
            state.total_bytes -= old.size_bytes;
            debug!(key = %key_hex(key), "expired entry dropped on read");
        }
        None
    }

    fn insert(&self, key: [u8; 32], vector: EmbeddingVector) {
        let size_bytes = vector.size_bytes() as u64;
        let mut state = self.state.lock();

        if let Some(old) = state.entries.remove(&key) {
            state.total_bytes -= old.size_bytes;
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state.arrival.push_back((key, seq));
        state.total_bytes += size_bytes;
        state.entries.insert(
            key,
            CacheEntry {
                vector,
                created_at: Instant::now(),
                seq,
                size_bytes,
            },
        );

        // Oldest-created entries go first when over budget. The entry just
        // inserted sits at the back of the queue, so it survives as long as
        // any older entry remains.
        let mut evicted = 0u64;
        while state.total_bytes > self.config.max_size_bytes && state.entries.len() > 1 {
            let Some((old_key, old_seq)) = state.arrival.pop_front() else {
                break;
            };
            let live = state
                .entries
                .get(&old_key)
                .is_some_and(|entry| entry.seq == old_seq);
            if !live {
                continue;
            }
            if let Some(old) = state.entries.remove(&old_key) {
                state.total_bytes -= old.size_bytes;
                evicted += 1;
                debug!(key = %key_hex(&old_key), "evicted oldest entry");
            }
        }
        if evicted > 0 {
            self.evictions.fetch_add(evicted, Ordering::Relaxed);
        }

        if state.total_bytes > self.config.max_size_bytes {
            warn!(
                total_bytes = state.total_bytes,
                budget = self.config.max_size_bytes,
                "single entry exceeds the cache budget"
            );
        }
    }

    fn remove_older_than(&self, max_age: Duration) -> usize {
        let mut state = self.state.lock();
        let CacheState {
            entries,
            arrival,
            total_bytes,
            ..
        } = &mut *state;

        let before = entries.len();
        entries.retain(|_, entry| {
            if entry.created_at.elapsed() < max_age {
                true
            } else {
                *total_bytes -= entry.size_bytes;
                false
            }
        });
        arrival.retain(|(key, seq)| entries.get(key).is_some_and(|entry| entry.seq == *seq));

        before - entries.len()
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("CacheStore")
            .field("model", &self.provider.model())
            .field("entries", &state.entries.len())
            .field("total_bytes", &state.total_bytes)
            .finish()
    }
}
