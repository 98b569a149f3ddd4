use std::cmp::Ordering;
use std::collections::HashSet;

use crate::config::RankingConfig;
use crate::error::{Result, RetrievalError};
use crate::models::ScoredChunk;
use crate::retrieval::Index;
use crate::tokenize::tokenize;

/// Rank the chunks of `index` against `query` and return at most `k`.
///
/// Pipeline:
/// 1. Tokenize the query once for BM25; hand the raw query to the TF-IDF model.
/// 2. `combined[i] = lexical_weight * bm25[i] + vector_weight * cosine[i]`.
///    With the default weights (0.5 / 0.5) the two signals are summed as-is,
///    even though BM25 is unbounded and cosine lives in [0, 1].
///    `normalize` min-max scales each signal first.
/// 3. Stable sort by combined score (ties keep chunk order), drop repeated
///    rows, keep the top `k`.
pub fn rank(
    query: &str,
    index: &Index,
    k: usize,
    config: &RankingConfig,
) -> Result<Vec<ScoredChunk>> {
    let chunks = index.chunks();
    if chunks.is_empty() || k == 0 {
        return Ok(Vec::new());
    }

    let query_tokens = tokenize(query);
    let lexical = index.lexical().score(&query_tokens)?;
    let vector = index.vector().score(query);

    if lexical.len() != chunks.len() || vector.len() != chunks.len() {
        return Err(RetrievalError::ScoreAlignment {
            chunks: chunks.len(),
            lexical: lexical.len(),
            vector: vector.len(),
        });
    }

    let combined = fuse(&lexical, &vector, config);
    let top = top_k(&combined, k);

    tracing::debug!(
        "Ranked {} chunks for {:?}: kept {}",
        chunks.len(),
        query,
        top.len()
    );

    Ok(top
        .into_iter()
        .map(|i| ScoredChunk {
            chunk: chunks[i].clone(),
            position: i,
            lexical_score: lexical[i],
            vector_score: vector[i],
            combined_score: combined[i],
        })
        .collect())
}

/// Weighted sum of two aligned score vectors.
pub fn fuse(lexical: &[f32], vector: &[f32], config: &RankingConfig) -> Vec<f32> {
    let (lexical, vector) = if config.normalize {
        (min_max(lexical), min_max(vector))
    } else {
        (lexical.to_vec(), vector.to_vec())
    };

    lexical
        .iter()
        .zip(vector.iter())
        .map(|(l, v)| config.lexical_weight * l + config.vector_weight * v)
        .collect()
}

/// Indices of the `k` highest scores, best first, ties broken by index.
/// Each index appears at most once.
pub fn top_k(scores: &[f32], k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    // sort_by is stable: equal scores keep ascending index order
    order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));

    let mut seen = HashSet::with_capacity(k.min(scores.len()));
    order
        .into_iter()
        .filter(|i| seen.insert(*i))
        .take(k)
        .collect()
}

/// Scale to [0, 1]. A constant vector maps to all zeros.
fn min_max(scores: &[f32]) -> Vec<f32> {
    let min = scores.iter().copied().fold(f32::INFINITY, f32::min);
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;
    if !range.is_finite() || range <= 0.0 {
        return vec![0.0; scores.len()];
    }
    scores.iter().map(|s| (s - min) / range).collect()
}
