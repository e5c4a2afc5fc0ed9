//! Analysis engine: raw page elements in, a graded coherence report out.
//!
//! [`AnalysisEngine`] wires the pipeline together: hierarchy construction,
//! cached embedding resolution, similarity scoring, checklist evaluation,
//! and best-effort persistence of the run. Structural errors abort the
//! request; an unreachable embedding provider only downgrades the rules
//! that needed the missing vectors.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tokio::task;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::cache::{CacheStatus, CacheStore};
use crate::checklist::{ChecklistEvaluator, ChecklistResult, Priority, RuleCode, RuleStatus};
use crate::config::EngineConfig;
use crate::embedding::EmbeddingProvider;
use crate::hierarchy::{ContentHierarchy, HierarchyBuilder, RawElement};
use crate::similarity::{NodeVectors, SimilarityEdge, SimilarityEngine};
use crate::storage::{AnalysisRecord, EmbeddingRow, VectorStore};

pub mod error;


pub use error::{EngineError, EngineResult};

/// A node whose embedding could not be resolved within the retry budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddingFailure {
    /// Index of the affected node in the analyzed hierarchy.
    pub node: usize,
    /// Provider error, rendered for the report.
    pub reason: String,
}

/// A non-passing verdict paired with the original text it judged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub code: RuleCode,
    pub priority: Priority,
    pub status: RuleStatus,
    pub message: String,
    /// Original text of the offending node, when the rule singled one out.
    pub node_text: Option<String>,
}

/// Complete outcome of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// Unique id of this run, also written to the history log.
    pub run_id: String,
    /// Unix timestamp (seconds) when grading finished.
    pub timestamp: i64,
    /// Validated hierarchy the verdicts refer to by node index.
    pub hierarchy: ContentHierarchy,
    /// Every evaluated relation, including ones without a score.
    pub edges: Vec<SimilarityEdge>,
    /// All verdicts in catalogue order.
    pub checklist: Vec<ChecklistResult>,
    /// Priority-weighted score over critical and high rules, 0..=100.
    pub overall_score: f64,
    /// H2 node indices scoring below the drift threshold.
    pub drifting_h2: Vec<usize>,
    /// Nodes left without vectors after retries.
    pub embedding_failures: Vec<EmbeddingFailure>,
    /// Whether fresh vectors and the history row reached the store.
    pub persisted: bool,
}

impl AnalysisResult {
    /// Failed verdicts, in catalogue order.
    pub fn failures(&self) -> Vec<&ChecklistResult> {
        self.checklist.iter().filter(|r| r.is_fail()).collect()
    }

    /// Warning verdicts, in catalogue order.
    pub fn warnings(&self) -> Vec<&ChecklistResult> {
        self.checklist.iter().filter(|r| r.is_warn()).collect()
    }

    /// Critical rules that did not pass.
    pub fn critical_issues(&self) -> Vec<&ChecklistResult> {
        self.checklist
            .iter()
            .filter(|r| r.priority == Priority::Critical && !r.is_pass())
            .collect()
    }

    /// Number of passing verdicts.
    pub fn passed_count(&self) -> usize {
        self.checklist.iter().filter(|r| r.is_pass()).count()
    }

    /// Returns `true` when a rule left this node without a vector.
    pub fn is_unresolved(&self, node: usize) -> bool {
        self.embedding_failures.iter().any(|f| f.node == node)
    }

    /// Non-passing verdicts paired with the text they judged, ready for a
    /// remediation report.
    pub fn findings(&self) -> Vec<Finding> {
        self.checklist
            .iter()
            .filter(|r| !r.is_pass())
            .map(|r| Finding {
                code: r.code,
                priority: r.priority,
                status: r.status,
                message: r.message.clone(),
                node_text: r
                    .node
                    .and_then(|index| self.hierarchy.node(index))
                    .map(|node| node.text.clone()),
            })
            .collect()
    }
}

/// End-to-end analyzer over a fixed provider, store, and rule configuration.
///
/// Cheap to share behind an [`Arc`]; every method takes `&self`.
pub struct AnalysisEngine {
    config: EngineConfig,
    cache: Arc<CacheStore>,
    store: Arc<VectorStore>,
    evaluator: ChecklistEvaluator,
}

impl std::fmt::Debug for AnalysisEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisEngine")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("store", &self.store)
            .finish()
    }
}

impl AnalysisEngine {
    /// Creates an engine from a validated configuration.
    ///
    /// Opens the vector store under `config.data_dir` and wires the cache to
    /// rehydrate from it.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;

        let store = Arc::new(VectorStore::open(&config.data_dir)?);
        let cache = Arc::new(
            CacheStore::new(provider, config.cache.clone())
                .with_store(Arc::clone(&store))
                .with_policy(config.embedding.retry_policy()),
        );
        let evaluator = ChecklistEvaluator::new(config.rules.clone())?;

        info!(
            model = %config.embedding.model,
            data_dir = %config.data_dir.display(),
            "analysis engine ready"
        );

        Ok(Self {
            config,
            cache,
            store,
            evaluator,
        })
    }

    /// Creates an engine from environment configuration.
    pub fn from_env(provider: Arc<dyn EmbeddingProvider>) -> EngineResult<Self> {
        Self::new(provider, EngineConfig::from_env()?)
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the embedding cache.
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Returns the durable vector store.
    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    /// Starts the periodic cache sweeper for long-running deployments.
    pub fn start_cache_sweeper(&self) -> task::JoinHandle<()> {
        self.cache.start_sweeper()
    }

    /// Analyzes one page worth of elements and grades it.
    ///
    /// Embeddings are resolved once per distinct normalized text, with
    /// lookups bounded by the configured concurrency. Vectors computed fresh
    /// on this run are persisted afterwards; persistence problems are
    /// reported through [`AnalysisResult::persisted`], never as an error.
    #[instrument(skip(self, elements), fields(elements = elements.len()))]
    pub async fn analyze(&self, elements: &[RawElement]) -> EngineResult<AnalysisResult> {
        let hierarchy = HierarchyBuilder::build(elements)?;
        debug!(nodes = hierarchy.len(), "hierarchy built");

        let (vectors, embedding_failures, fresh_rows) = self.resolve_vectors(&hierarchy).await;

        let matrix = SimilarityEngine::compute(&hierarchy, &vectors);
        let checklist = self.evaluator.evaluate(&hierarchy, &matrix);
        let overall_score = ChecklistEvaluator::overall_score(&checklist);
        let drifting_h2 = matrix.drifting_h2(self.config.rules.drift_threshold);

        let run_id = Uuid::new_v4().to_string();
        let timestamp = Utc::now().timestamp();
        let persisted = self
            .persist_run(
                &run_id,
                timestamp,
                &hierarchy,
                &checklist,
                overall_score,
                fresh_rows,
            )
            .await;

        info!(
            run_id = %run_id,
            overall = overall_score,
            failed = checklist.iter().filter(|r| r.is_fail()).count(),
            unresolved = embedding_failures.len(),
            "analysis complete"
        );

        Ok(AnalysisResult {
            run_id,
            timestamp,
            edges: matrix.edges().to_vec(),
            checklist,
            overall_score,
            drifting_h2,
            embedding_failures,
            persisted,
            hierarchy,
        })
    }

    /// Resolves one vector per distinct normalized text and fans the results
    /// back out to node indices. Failures are recorded per node and the run
    /// continues without those vectors.
    async fn resolve_vectors(
        &self,
        hierarchy: &ContentHierarchy,
    ) -> (NodeVectors, Vec<EmbeddingFailure>, Vec<EmbeddingRow>) {
        let mut by_text: HashMap<&str, Vec<usize>> = HashMap::new();
        for (index, node) in hierarchy.nodes().iter().enumerate() {
            if node.normalized.is_empty() {
                continue;
            }
            by_text
                .entry(node.normalized.as_str())
                .or_default()
                .push(index);
        }
        debug!(
            nodes = hierarchy.len(),
            distinct = by_text.len(),
            "resolving embeddings"
        );

        let concurrency = self.config.embedding.concurrency.max(1);
        let outcomes: Vec<_> = stream::iter(by_text)
            .map(|(text, indices)| {
                let cache = Arc::clone(&self.cache);
                async move {
                    let outcome = cache.get_or_compute(text).await;
                    (text, indices, outcome)
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let created_at = Utc::now().timestamp();
        let mut vectors = NodeVectors::new();
        let mut failures = Vec::new();
        let mut fresh_rows = Vec::new();
        for (text, indices, outcome) in outcomes {
            match outcome {
                Ok(cached) => {
                    if cached.status == CacheStatus::Computed {
                        fresh_rows.push(EmbeddingRow::from_vector(&cached.vector, text, created_at));
                    }
                    for index in indices {
                        vectors.insert(index, cached.vector.values.clone());
                    }
                }
                Err(err) => {
                    warn!(text_len = text.len(), error = %err, "embedding unresolved, grading without it");
                    failures.extend(indices.into_iter().map(|node| EmbeddingFailure {
                        node,
                        reason: err.to_string(),
                    }));
                }
            }
        }
        failures.sort_by_key(|failure| failure.node);

        (vectors, failures, fresh_rows)
    }

    /// Writes fresh vectors and the history row. Problems are logged and
    /// folded into the returned flag, never raised.
    async fn persist_run(
        &self,
        run_id: &str,
        timestamp: i64,
        hierarchy: &ContentHierarchy,
        checklist: &[ChecklistResult],
        overall_score: f64,
        fresh_rows: Vec<EmbeddingRow>,
    ) -> bool {
        let mut persisted = true;

        if !fresh_rows.is_empty() {
            let store = Arc::clone(&self.store);
            match task::spawn_blocking(move || store.store_batch(&fresh_rows)).await {
                Ok(Ok(count)) => debug!(rows = count, "fresh vectors persisted"),
                Ok(Err(err)) => {
                    warn!(error = %err, "vector persistence failed");
                    persisted = false;
                }
                Err(err) => {
                    warn!(error = %err, "vector persistence task failed");
                    persisted = false;
                }
            }
        }

        let record = AnalysisRecord {
            run_id: run_id.to_string(),
            timestamp,
            overall_score,
            node_count: hierarchy.len(),
            passed: checklist.iter().filter(|r| r.is_pass()).count(),
            warned: checklist.iter().filter(|r| r.is_warn()).count(),
            failed: checklist.iter().filter(|r| r.is_fail()).count(),
        };
        let store = Arc::clone(&self.store);
        match task::spawn_blocking(move || store.record_analysis(&record)).await {
            Ok(Ok(())) => debug!(run_id = %run_id, "history row appended"),
            Ok(Err(err)) => {
                warn!(error = %err, "history append failed");
                persisted = false;
            }
            Err(err) => {
                warn!(error = %err, "history task failed");
                persisted = false;
            }
        }

        persisted
    }
}
