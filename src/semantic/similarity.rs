//! Cosine similarity scoring and ranking.
//!
//! Ranking keeps candidates whose score is strictly above the threshold,
//! orders them by score descending and truncates to the limit. Equal scores
//! keep their catalog order.

use std::cmp::Ordering;

/// A scored catalog position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked {
    /// Position of the item in catalog order
    pub position: usize,
    /// Cosine similarity score (-1.0 to 1.0)
    pub score: f32,
}

/// Compute L2 norm of a vector.
fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity between two vectors.
///
/// Returns 0.0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let a_norm = l2_norm(a);
    let b_norm = l2_norm(b);
    if a_norm < f32::EPSILON || b_norm < f32::EPSILON {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    (dot_product / (a_norm * b_norm)).clamp(-1.0, 1.0)
}

/// Score `query` against each candidate vector and rank the survivors.
///
/// # Arguments
/// * `query` - The query embedding vector
/// * `candidates` - Candidate vectors in catalog order
/// * `threshold` - Scores must be strictly greater than this to be kept
/// * `limit` - Maximum number of results to return
///
/// # Returns
/// Results sorted by similarity score (highest first), ties in catalog order.
pub fn rank<'a, I>(query: &[f32], candidates: I, threshold: f32, limit: usize) -> Vec<Ranked>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut results: Vec<Ranked> = candidates
        .into_iter()
        .enumerate()
        .filter_map(|(position, target)| {
            let score = cosine_similarity(query, target);
            (score > threshold).then_some(Ranked { position, score })
        })
        .collect();

    // sort_by is stable, so equal scores stay in catalog order
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    results.truncate(limit);

    results
}
