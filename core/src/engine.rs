use crate::error::Result;
use crate::index::Index;
use crate::listing::{load_listings, ListingRecord};
use crate::persist::load_artifact;
use crate::search::{BruteForceSearch, NeighborSearch};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub id: String,
    /// In [0, 1], rounded to 4 decimal places.
    pub score: f64,
    pub title: String,
    pub category: String,
}

impl RecommendationResult {
    fn from_listing(listing: &ListingRecord, score: f64) -> Self {
        Self {
            id: listing.listing_id.clone(),
            score: round4(score),
            title: listing.title.clone(),
            category: listing.category.clone(),
        }
    }
}

/// Content-based recommender over an immutable [`Index`].
///
/// `recommend` takes `&self` and touches no shared mutable state, so one engine
/// can be shared by reference (or behind an `Arc`) across any number of threads.
pub struct RecommendationEngine<S = BruteForceSearch> {
    index: Index,
    search: S,
}

impl RecommendationEngine<BruteForceSearch> {
    pub fn new(index: Index) -> Self {
        Self { index, search: BruteForceSearch }
    }

    /// Load the persisted artifact when it exists, otherwise build from the raw
    /// data source. A corrupt artifact is an error, not a trigger for rebuilding.
    pub fn from_paths(artifact: &Path, data: &Path) -> Result<Self> {
        let index = if artifact.exists() {
            tracing::info!(artifact = %artifact.display(), "loading recommender artifact");
            load_artifact(artifact)?
        } else {
            tracing::info!(data = %data.display(), "artifact missing; building index from data source");
            Index::build(load_listings(data)?)
        };
        if index.is_empty_corpus() {
            tracing::warn!("recommender index holds no listings");
        }
        Ok(Self::new(index))
    }
}

impl<S: NeighborSearch> RecommendationEngine<S> {
    pub fn with_search(index: Index, search: S) -> Self {
        Self { index, search }
    }

    pub fn index(&self) -> &Index { &self.index }

    /// Recommend up to `limit` listings related to `recent_item_ids`.
    ///
    /// With no resolvable history this is the first `limit` listings in storage
    /// order scored by popularity. Otherwise the blobs of the resolved listings
    /// form one query document; listings are ranked by cosine similarity to it and
    /// any listing whose id is in `recent_item_ids` is excluded.
    pub fn recommend<T: AsRef<str>>(&self, recent_item_ids: &[T], limit: usize) -> Vec<RecommendationResult> {
        if limit == 0 || self.index.is_empty_corpus() {
            return Vec::new();
        }
        let recent: HashSet<&str> = recent_item_ids.iter().map(|id| id.as_ref()).collect();

        let listings = self.index.listings();
        let mut resolved: Vec<usize> = recent.iter().filter_map(|id| self.index.position_of(id)).collect();
        // Blobs join in storage order, not request order.
        resolved.sort_unstable();
        let history: Vec<&str> = resolved.iter().map(|&pos| listings[pos].text_blob.as_str()).collect();
        if history.is_empty() {
            tracing::debug!(requested = recent_item_ids.len(), "no resolvable history; popularity fallback");
            return self.popular(limit);
        }

        let query = self.index.space().vectorize(&history.join(" "));
        if query.is_zero() {
            tracing::debug!("history has no in-vocabulary terms; all similarities are zero");
        }

        // Search wide enough that excluding the history still leaves `limit` items.
        let breadth = limit.saturating_add(recent_item_ids.len());
        self.search
            .nearest(&self.index, &query, breadth)
            .into_iter()
            .filter_map(|n| {
                let listing = &listings[n.position];
                if recent.contains(listing.listing_id.as_str()) {
                    None
                } else {
                    Some(RecommendationResult::from_listing(listing, n.similarity))
                }
            })
            .take(limit)
            .collect()
    }

    /// Head of the corpus in storage order, scored by popularity. Not a sort.
    fn popular(&self, limit: usize) -> Vec<RecommendationResult> {
        self.index
            .listings()
            .iter()
            .take(limit)
            .map(|l| RecommendationResult::from_listing(l, l.popularity_or_default()))
            .collect()
    }
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}
