//! Cosine-similarity ranking of stored chunks against a query vector.
//!
//! Brute force over every stored vector; topics hold tens to a few
//! thousand chunks, so a linear scan is fast enough.

use trogiang_core::error::{Result, TroGiangError};
use trogiang_core::traits::Embedding;

/// Added to the norm product so all-zero vectors score 0 instead of NaN.
pub const EPSILON: f64 = 1e-8;

/// A scored chunk position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    /// Index into the topic's chunk list.
    pub index: usize,
    pub score: f64,
}

/// Cosine similarity of two equal-length vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt() + EPSILON)
}

/// Score every vector against `query`, best first.
///
/// Equal scores keep the lower index first, so identical inputs always
/// produce the same order.
pub fn rank_scored(query: &[f32], vectors: &[Embedding]) -> Result<Vec<SearchResult>> {
    if let Some(bad) = vectors.iter().find(|v| v.len() != query.len()) {
        return Err(TroGiangError::DimensionMismatch {
            expected: bad.len(),
            actual: query.len(),
        });
    }

    let mut results: Vec<SearchResult> = vectors
        .iter()
        .enumerate()
        .map(|(index, v)| SearchResult {
            index,
            score: cosine_similarity(query, v),
        })
        .collect();

    results.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.index.cmp(&b.index)));
    Ok(results)
}

/// Return the texts of the `top_k` chunks most similar to `query`.
///
/// `top_k` is clamped to the number of chunks; an empty base yields an
/// empty result.
pub fn rank(
    query: &[f32],
    vectors: &[Embedding],
    chunks: &[String],
    top_k: usize,
) -> Result<Vec<String>> {
    if vectors.len() != chunks.len() {
        return Err(TroGiangError::LengthMismatch {
            chunks: chunks.len(),
            vectors: vectors.len(),
        });
    }
    if chunks.is_empty() {
        return Ok(Vec::new());
    }

    Ok(rank_scored(query, vectors)?
        .into_iter()
        .take(top_k)
        .map(|r| chunks[r.index].clone())
        .collect())
}
