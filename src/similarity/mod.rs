//! Pairwise semantic similarity between hierarchy elements.
//!
//! Scores are cosine similarity clamped to `[0.0, 1.0]`; `None` means the
//! score is unavailable (a missing element or a failed embedding), which is
//! distinct from a low score. The "core topic" is the centroid of whichever
//! of Title, Meta, and H1 have vectors, and every H2 is scored against it.


use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::hierarchy::{ContentHierarchy, NodeKind};

/// Embedding vectors keyed by node index within one hierarchy.
#[derive(Debug, Clone, Default)]
pub struct NodeVectors {
    vectors: HashMap<usize, Vec<f32>>,
}

impl NodeVectors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node_index: usize, values: Vec<f32>) {
        self.vectors.insert(node_index, values);
    }

    pub fn get(&self, node_index: usize) -> Option<&[f32]> {
        self.vectors.get(&node_index).map(Vec::as_slice)
    }

    /// Number of nodes that have a vector.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// The element pair (or element/centroid pair) a score belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    TitleMeta,
    TitleH1,
    H1Meta,
    H2CoreTopic,
    H3ParentH2,
}

/// One scored relation in the matrix.
///
/// `source` and `target` are node indices; `target` is `None` when the right
/// side is the synthetic core topic or an absent element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityEdge {
    pub relation: RelationKind,
    pub source: Option<usize>,
    pub target: Option<usize>,
    pub score: Option<f32>,
}

/// All relation scores for one hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    edges: Vec<SimilarityEdge>,
    core_topic: Option<Vec<f32>>,
}

impl SimilarityMatrix {
    pub fn edges(&self) -> &[SimilarityEdge] {
        &self.edges
    }

    /// Score of a singleton relation (`TitleMeta`, `TitleH1`, `H1Meta`).
    pub fn score(&self, relation: RelationKind) -> Option<f32> {
        self.edges
            .iter()
            .find(|e| e.relation == relation)
            .and_then(|e| e.score)
    }

    /// `(h2_index, score)` for every H2, in document order.
    pub fn h2_scores(&self) -> Vec<(usize, Option<f32>)> {
        self.edges
            .iter()
            .filter(|e| e.relation == RelationKind::H2CoreTopic)
            .filter_map(|e| e.source.map(|idx| (idx, e.score)))
            .collect()
    }

    /// `(h3_index, h2_index, score)` for every H3 with a parent.
    pub fn h3_scores(&self) -> Vec<(usize, usize, Option<f32>)> {
        self.edges
            .iter()
            .filter(|e| e.relation == RelationKind::H3ParentH2)
            .filter_map(|e| match (e.source, e.target) {
                (Some(h3), Some(h2)) => Some((h3, h2, e.score)),
                _ => None,
            })
            .collect()
    }

    /// H2 indices whose core-topic score is available and below `threshold`.
    /// Unscored H2s are never reported as drifting.
    pub fn drifting_h2(&self, threshold: f32) -> Vec<usize> {
        self.h2_scores()
            .into_iter()
            .filter_map(|(idx, score)| match score {
                Some(s) if s < threshold => Some(idx),
                _ => None,
            })
            .collect()
    }

    /// Mean of every available score, `None` when nothing was scorable.
    pub fn overall(&self) -> Option<f32> {
        let scores: Vec<f32> = self.edges.iter().filter_map(|e| e.score).collect();
        if scores.is_empty() {
            return None;
        }
        Some(scores.iter().sum::<f32>() / scores.len() as f32)
    }

    /// `true` when at least one of Title, Meta, and H1 had a vector.
    pub fn core_topic_available(&self) -> bool {
        self.core_topic.is_some()
    }
}

/// Computes a [`SimilarityMatrix`] from a hierarchy and its vectors.
#[derive(Debug, Default)]
pub struct SimilarityEngine;

impl SimilarityEngine {
    pub fn compute(hierarchy: &ContentHierarchy, vectors: &NodeVectors) -> SimilarityMatrix {
        let title = hierarchy.recognized_index(NodeKind::Title);
        let meta = hierarchy.recognized_index(NodeKind::Meta);
        let h1 = hierarchy.recognized_index(NodeKind::H1);

        let mut edges = vec![
            pair_edge(RelationKind::TitleMeta, title, meta, vectors),
            pair_edge(RelationKind::TitleH1, title, h1, vectors),
            pair_edge(RelationKind::H1Meta, h1, meta, vectors),
        ];

        let core_topic = centroid(
            [title, meta, h1]
                .iter()
                .flatten()
                .filter_map(|&idx| vectors.get(idx)),
        );

        for h2 in hierarchy.h2_indices() {
            let score = match (vectors.get(h2), core_topic.as_deref()) {
                (Some(vector), Some(core)) => Some(cosine_similarity(vector, core)),
                _ => None,
            };
            edges.push(SimilarityEdge {
                relation: RelationKind::H2CoreTopic,
                source: Some(h2),
                target: None,
                score,
            });
        }

        for h3 in hierarchy.h3_indices() {
            let Some(parent) = hierarchy.node(h3).and_then(|n| n.parent) else {
                continue;
            };
            let score = match (vectors.get(h3), vectors.get(parent)) {
                (Some(a), Some(b)) => Some(cosine_similarity(a, b)),
                _ => None,
            };
            edges.push(SimilarityEdge {
                relation: RelationKind::H3ParentH2,
                source: Some(h3),
                target: Some(parent),
                score,
            });
        }

        debug!(
            edges = edges.len(),
            core_topic = core_topic.is_some(),
            "similarity matrix computed"
        );

        SimilarityMatrix { edges, core_topic }
    }
}

fn pair_edge(
    relation: RelationKind,
    a: Option<usize>,
    b: Option<usize>,
    vectors: &NodeVectors,
) -> SimilarityEdge {
    let score = match (
        a.and_then(|idx| vectors.get(idx)),
        b.and_then(|idx| vectors.get(idx)),
    ) {
        (Some(x), Some(y)) => Some(cosine_similarity(x, y)),
        _ => None,
    };
    SimilarityEdge {
        relation,
        source: a,
        target: b,
        score,
    }
}

/// Cosine similarity clamped to `[0.0, 1.0]`.
///
/// Returns `0.0` for zero-norm or mismatched-length inputs; negative cosine
/// values clamp to `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a <= 0.0 || norm_b <= 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0)
}

/// Component-wise mean of the given vectors, `None` when the input is empty.
/// Vectors whose length differs from the first are skipped.
pub fn centroid<'a, I>(vectors: I) -> Option<Vec<f32>>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut iter = vectors.into_iter();
    let first = iter.next()?;

    let mut sum = first.to_vec();
    let mut count = 1usize;
    for vector in iter {
        if vector.len() != sum.len() {
            continue;
        }
        for (acc, value) in sum.iter_mut().zip(vector) {
            *acc += value;
        }
        count += 1;
    }

    for value in &mut sum {
        *value /= count as f32;
    }
    Some(sum)
}
