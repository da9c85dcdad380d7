//! Cosine-similarity ranking of candidate chunks against a query vector.

use crate::chunker::Chunk;

/// A chunk paired with its relevance score, in [-1, 1].
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Cosine of the angle between two vectors. Defined as 0.0 when either
/// vector has zero norm, which is not an error condition. Every ranking
/// path must go through this one definition so results stay reproducible.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Score each candidate against the query vector and keep the best
/// `top_k`, optionally dropping scores below `min_score`. Ties keep the
/// original corpus order (stable sort).
pub fn rank(
    query: &[f32],
    candidates: Vec<(Chunk, Vec<f32>)>,
    top_k: usize,
    min_score: Option<f32>,
) -> Vec<ScoredChunk> {
    let scored = candidates
        .into_iter()
        .map(|(chunk, vector)| ScoredChunk { score: cosine_similarity(query, &vector), chunk })
        .collect();
    select_top(scored, top_k, min_score)
}

/// Shared tail of both scoring strategies: stable descending sort, optional
/// floor, truncation.
pub fn select_top(
    mut scored: Vec<ScoredChunk>,
    top_k: usize,
    min_score: Option<f32>,
) -> Vec<ScoredChunk> {
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    if let Some(floor) = min_score {
        scored.retain(|s| s.score >= floor);
    }
    scored.truncate(top_k);
    scored
}
