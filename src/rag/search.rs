//! Exact similarity search over stored embedding records.
//!
//! Every record is scored against the query with cosine similarity and the
//! best `k` are returned. There is no index: the scan is linear in the number
//! of records, which is fine for a single corpus of a few thousand chunks.
//!
//! Thresholding is deliberately not part of [`retrieve`]. Callers run the
//! ranked list through an [`EvidenceGate`], which looks only at the best score
//! and accepts or rejects the whole result set.

use std::cmp::Ordering;

use crate::types::{EmbeddingRecord, ScoredChunk};

/// Score returned for vectors that cannot be compared (length mismatch,
/// zero magnitude, non-finite values).
pub const NOT_COMPARABLE: f32 = -1.0;

/// Cosine similarity between two vectors.
///
/// Returns a value in [-1, 1], or [`NOT_COMPARABLE`] when the vectors differ
/// in length or either has zero magnitude. Symmetric in its arguments.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return NOT_COMPARABLE;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return NOT_COMPARABLE;
    }

    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    if !score.is_finite() {
        return NOT_COMPARABLE;
    }
    score.clamp(-1.0, 1.0) as f32
}

/// Rank `records` by similarity to `query` and keep the best `k`.
///
/// The sort is stable: records with equal scores keep their input order.
/// `k == 0` or an empty record set yields an empty result.
pub fn retrieve(query: &[f32], records: &[EmbeddingRecord], k: usize) -> Vec<ScoredChunk> {
    if k == 0 || records.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(usize, f32)> = records
        .iter()
        .enumerate()
        .map(|(i, record)| (i, cosine_similarity(query, &record.embedding)))
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    scored
        .into_iter()
        .take(k)
        .map(|(i, score)| ScoredChunk {
            chunk: records[i].chunk.clone(),
            score,
        })
        .collect()
}

/// Outcome of gating a ranked result set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evidence {
    /// The best score reached the floor; all retrieved chunks may be used.
    Sufficient { top_score: f32 },
    /// Nothing was retrieved, or the best score fell below the floor.
    Insufficient { top_score: Option<f32> },
}

impl Evidence {
    pub fn is_sufficient(&self) -> bool {
        matches!(self, Evidence::Sufficient { .. })
    }

    pub fn top_score(&self) -> Option<f32> {
        match self {
            Evidence::Sufficient { top_score } => Some(*top_score),
            Evidence::Insufficient { top_score } => *top_score,
        }
    }
}

/// Single global similarity floor applied to the best-ranked result.
///
/// Lower-ranked results are never filtered individually: if the top result
/// passes, the whole ranked list is treated as evidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvidenceGate {
    pub min_similarity: f32,
}

impl EvidenceGate {
    pub fn new(min_similarity: f32) -> Self {
        Self { min_similarity }
    }

    /// Judge a ranked result list (best first).
    pub fn assess(&self, ranked: &[ScoredChunk]) -> Evidence {
        match ranked.first() {
            None => Evidence::Insufficient { top_score: None },
            Some(best) if best.score >= self.min_similarity => Evidence::Sufficient {
                top_score: best.score,
            },
            Some(best) => Evidence::Insufficient {
                top_score: Some(best.score),
            },
        }
    }
}
