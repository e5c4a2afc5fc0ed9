//! Storage model types.

use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

use crate::embedding::EmbeddingVector;

/// Durable embedding row, one per content key.
///
/// Stored as `rkyv` bytes (memory-mapped on read). `source_text` keeps the
/// original (pre-normalization) text so rows stay inspectable.
#[derive(Archive, RkyvDeserialize, RkyvSerialize, Debug, PartialEq, Clone)]
pub struct EmbeddingRow {
    /// Content key: blake3(model | normalized text).
    pub key: [u8; 32],
    /// Embedding model identifier the vector came from.
    pub model: String,
    /// Original text the vector was computed for.
    pub source_text: String,
    /// Vector components.
    pub values: Vec<f32>,
    /// Unix timestamp (seconds) when the row was computed.
    pub created_at: i64,
}

impl EmbeddingRow {
    pub fn from_vector(vector: &EmbeddingVector, source_text: &str, created_at: i64) -> Self {
        Self {
            key: vector.key,
            model: vector.model.clone(),
            source_text: source_text.to_string(),
            values: vector.values.clone(),
            created_at,
        }
    }

    pub fn into_vector(self) -> EmbeddingVector {
        EmbeddingVector {
            key: self.key,
            model: self.model,
            values: self.values,
        }
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }
}

/// One line of the append-only analysis history log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub run_id: String,
    /// Unix timestamp (seconds) of the run.
    pub timestamp: i64,
    /// Priority-weighted coherence score, 0..=100.
    pub overall_score: f64,
    pub node_count: usize,
    pub passed: usize,
    pub warned: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rkyv::rancor::Error;
    use rkyv::{from_bytes, to_bytes};

    fn sample_row() -> EmbeddingRow {
        EmbeddingRow {
            key: [7u8; 32],
            model: "mxbai-embed-large".to_string(),
            source_text: "Quiet Dishwashers - Top 12 Models 2025".to_string(),
            values: vec![0.25, -0.5, 0.125, 1.0],
            created_at: 1_766_000_000,
        }
    }

    #[test]
    fn test_row_rkyv_roundtrip() {
        let row = sample_row();

        let bytes = to_bytes::<Error>(&row).expect("serialize row");
        let restored: EmbeddingRow = from_bytes::<EmbeddingRow, Error>(&bytes)
            .expect("deserialize row");

        assert_eq!(restored, row);
    }

    #[test]
    fn test_row_vector_conversion_roundtrip() {
        let vector = EmbeddingVector::for_text("m", "Some Heading", vec![0.5, 0.5]);
        let row = EmbeddingRow::from_vector(&vector, "Some Heading", 123);

        assert_eq!(row.key, vector.key);
        assert_eq!(row.dimension(), 2);
        assert_eq!(row.into_vector(), vector);
    }

    #[test]
    fn test_analysis_record_json_roundtrip() {
        let record = AnalysisRecord {
            run_id: "4be0643f-1d98-4f83-9bba-7c64c3f4db23".to_string(),
            timestamp: 1_766_000_000,
            overall_score: 71.5,
            node_count: 9,
            passed: 20,
            warned: 9,
            failed: 7,
        };

        let line = serde_json::to_string(&record).expect("serialize record");
        let restored: AnalysisRecord = serde_json::from_str(&line).expect("parse record");

        assert_eq!(restored, record);
    }
}
