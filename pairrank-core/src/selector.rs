/// Top-K selection over a converged score vector.
use crate::error::RankError;
use crate::types::{Candidate, RankedCandidate};

/// Candidate indices ordered by descending score. Ties keep the lower index first.
pub fn ranked_order(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
    order
}

/// The `k` highest-scoring candidates, strongest first, with their scores attached.
///
/// Returns exactly `min(k, N)` entries. Deterministic for a fixed score vector.
pub fn select_top_k(
    candidates: &[Candidate],
    scores: &[f64],
    k: usize,
) -> Result<Vec<RankedCandidate>, RankError> {
    if candidates.len() != scores.len() {
        return Err(RankError::LengthMismatch {
            candidates: candidates.len(),
            scores: scores.len(),
        });
    }

    Ok(ranked_order(scores)
        .into_iter()
        .take(k)
        .enumerate()
        .map(|(pos, idx)| RankedCandidate {
            rank: pos + 1,
            candidate: candidates[idx].clone(),
            score: Some(scores[idx]),
        })
        .collect())
}
