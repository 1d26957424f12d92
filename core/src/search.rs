//! Nearest-neighbour search over the listing vectors of an [`Index`].

use crate::index::{Index, SparseVector};
use std::cmp::Ordering;

/// A candidate listing and its cosine similarity to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Storage position in the index.
    pub position: usize,
    pub similarity: f64,
}

/// Similarity search seam. Implementations return up to `k` neighbours ordered by
/// descending similarity, ties broken by ascending storage position.
pub trait NeighborSearch: Send + Sync {
    fn nearest(&self, index: &Index, query: &SparseVector, k: usize) -> Vec<Neighbor>;
}

/// Exhaustive scan over every listing vector.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceSearch;

impl NeighborSearch for BruteForceSearch {
    fn nearest(&self, index: &Index, query: &SparseVector, k: usize) -> Vec<Neighbor> {
        let k = k.min(index.len());
        if k == 0 {
            return Vec::new();
        }
        let mut scored: Vec<Neighbor> = index
            .vectors()
            .iter()
            .enumerate()
            .map(|(position, v)| Neighbor { position, similarity: cosine_similarity(query, v) })
            .collect();
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, rank_order);
            scored.truncate(k);
        }
        scored.sort_unstable_by(rank_order);
        scored
    }
}

/// Cosine similarity of two unit (or zero) vectors, clamped to [0, 1].
///
/// Equals `1 - cosine_distance`; a zero vector is orthogonal to everything.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    a.dot(b).clamp(0.0, 1.0)
}

fn rank_order(a: &Neighbor, b: &Neighbor) -> Ordering {
    b.similarity.total_cmp(&a.similarity).then(a.position.cmp(&b.position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::ListingRecord;

    #[test]
    fn ties_break_by_storage_position() {
        let index = Index::build(vec![
            ListingRecord::new("A", "", "", "red chair"),
            ListingRecord::new("B", "", "", "blue table"),
            ListingRecord::new("C", "", "", "red chair"),
            ListingRecord::new("D", "", "", "green lamp"),
        ]);
        let q = index.space().vectorize("red chair");
        let hits = BruteForceSearch.nearest(&index, &q, 4);
        let order: Vec<usize> = hits.iter().map(|n| n.position).collect();
        assert_eq!(order, vec![0, 2, 1, 3]);
        assert!((hits[0].similarity - 1.0).abs() < 1e-9);
        assert_eq!(hits[2].similarity, 0.0);
    }

    #[test]
    fn k_is_capped_at_corpus_size() {
        let index = Index::build(vec![ListingRecord::new("A", "", "", "desk")]);
        let q = index.space().vectorize("desk");
        assert_eq!(BruteForceSearch.nearest(&index, &q, 10).len(), 1);
        assert!(BruteForceSearch.nearest(&index, &q, 0).is_empty());
    }

    #[test]
    fn partial_selection_matches_full_sort() {
        let blobs = ["oak desk", "oak chair", "steel desk", "oak desk lamp", "rug", "oak"];
        let index = Index::build(blobs.iter().enumerate().map(|(i, b)| ListingRecord::new(i.to_string(), "", "", *b)).collect());
        let q = index.space().vectorize("oak desk");
        let full = BruteForceSearch.nearest(&index, &q, blobs.len());
        let top = BruteForceSearch.nearest(&index, &q, 3);
        assert_eq!(&full[..3], &top[..]);
    }
}
