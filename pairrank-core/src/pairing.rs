/// Round-robin pair schedule for a single-comparison tournament.
///
/// Every unordered pair of candidate indices is compared exactly once.
use crate::types::Pair;

/// Number of unordered pairs among `num_items` candidates: N·(N-1)/2.
pub fn pair_count(num_items: usize) -> usize {
    num_items * num_items.saturating_sub(1) / 2
}

/// Enumerate all unordered pairs `(i, j)`, `i < j`, in index order
/// `i = 0..N-2, j = i+1..N-1`.
pub fn all_pairs(num_items: usize) -> Vec<Pair> {
    let mut pairs = Vec::with_capacity(pair_count(num_items));
    for i in 0..num_items {
        for j in (i + 1)..num_items {
            pairs.push((i, j));
        }
    }
    pairs
}
