use crate::error::{ConstructionError, Result};
use crate::listing::{popularity_in_range, ListingRecord};
use crate::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub type TermId = u32;

/// A sparse term-weighted vector. Entries are sorted by strictly ascending term id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub entries: Vec<(TermId, f64)>,
}

impl SparseVector {
    pub fn is_zero(&self) -> bool { self.entries.is_empty() }

    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt()
    }

    /// Dot product by merging the two sorted entry lists.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let (a, b) = (&self.entries, &other.entries);
        let mut sum = 0.0;
        while i < a.len() && j < b.len() {
            match a[i].0.cmp(&b[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a[i].1 * b[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for (_, w) in self.entries.iter_mut() { *w /= norm; }
        }
    }
}

/// Vocabulary and idf weights learned from the corpus at build time.
#[derive(Debug, Clone, PartialEq)]
pub struct TermVectorSpace {
    terms: Vec<String>,
    vocabulary: HashMap<String, TermId>,
    idf: Vec<f64>,
}

impl TermVectorSpace {
    /// Reassemble a space from its ordered term list and per-dimension idf weights.
    pub fn from_parts(terms: Vec<String>, idf: Vec<f64>) -> Result<Self> {
        if terms.len() != idf.len() {
            return Err(ConstructionError::CorruptArtifact(format!(
                "{} terms but {} idf weights", terms.len(), idf.len()
            )));
        }
        let vocabulary: HashMap<String, TermId> = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i as TermId))
            .collect();
        if vocabulary.len() != terms.len() {
            return Err(ConstructionError::CorruptArtifact("duplicate terms in vocabulary".into()));
        }
        Ok(Self { terms, vocabulary, idf })
    }

    pub fn dimensions(&self) -> usize { self.terms.len() }
    pub fn terms(&self) -> &[String] { &self.terms }
    pub fn idf_weights(&self) -> &[f64] { &self.idf }
    pub fn term_id(&self, term: &str) -> Option<TermId> { self.vocabulary.get(term).copied() }

    /// Vectorize text against this space. Out-of-vocabulary terms are dropped; the
    /// result is L2-normalized unless it is the zero vector.
    pub fn vectorize(&self, text: &str) -> SparseVector {
        let mut tf: BTreeMap<TermId, u32> = BTreeMap::new();
        for term in tokenize(text) {
            if let Some(tid) = self.term_id(&term) {
                *tf.entry(tid).or_insert(0) += 1;
            }
        }
        let mut v = SparseVector {
            entries: tf.into_iter().map(|(tid, count)| (tid, count as f64 * self.idf[tid as usize])).collect(),
        };
        v.normalize();
        v
    }
}

/// Immutable bundle of the vector space, one vector per listing and the listings
/// themselves, aligned by position.
#[derive(Debug, Clone)]
pub struct Index {
    space: TermVectorSpace,
    vectors: Vec<SparseVector>,
    listings: Vec<ListingRecord>,
    positions: HashMap<String, usize>,
}

impl Index {
    /// Build the index over `listings`, keeping their order as storage order.
    ///
    /// Term weight is raw term frequency times `ln((1 + N) / (1 + df)) + 1`, and
    /// every listing vector is L2-normalized. An empty corpus still builds; check
    /// [`Index::is_empty_corpus`] before serving it.
    pub fn build(listings: Vec<ListingRecord>) -> Index {
        let tokenized: Vec<Vec<String>> = listings.iter().map(|l| tokenize(&l.text_blob)).collect();

        // Sorted vocabulary gives term ids independent of input hashing.
        let terms: Vec<String> = tokenized
            .iter()
            .flatten()
            .map(String::as_str)
            .collect::<BTreeSet<&str>>()
            .into_iter()
            .map(str::to_string)
            .collect();
        let vocabulary: HashMap<&str, TermId> = terms.iter().enumerate().map(|(i, t)| (t.as_str(), i as TermId)).collect();

        let mut df: Vec<u32> = vec![0; terms.len()];
        let mut counts: Vec<BTreeMap<TermId, u32>> = Vec::with_capacity(listings.len());
        for tokens in &tokenized {
            let mut tf: BTreeMap<TermId, u32> = BTreeMap::new();
            for term in tokens {
                *tf.entry(vocabulary[term.as_str()]).or_insert(0) += 1;
            }
            for tid in tf.keys() {
                df[*tid as usize] += 1;
            }
            counts.push(tf);
        }

        let n = listings.len() as f64;
        let idf: Vec<f64> = df.iter().map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0).collect();

        let vectors: Vec<SparseVector> = counts
            .into_iter()
            .map(|tf| {
                let mut v = SparseVector {
                    entries: tf.into_iter().map(|(tid, c)| (tid, c as f64 * idf[tid as usize])).collect(),
                };
                v.normalize();
                v
            })
            .collect();

        let zero_vectors = vectors.iter().filter(|v| v.is_zero()).count();
        tracing::info!(num_listings = listings.len(), num_terms = terms.len(), zero_vectors, "built index");

        let space = TermVectorSpace { vocabulary: vocabulary.into_iter().map(|(t, id)| (t.to_string(), id)).collect(), terms, idf };
        let positions = position_map(&listings);
        Index { space, vectors, listings, positions }
    }

    /// Reassemble an index from persisted parts, enforcing the positional alignment
    /// between vectors and listings.
    pub fn from_parts(space: TermVectorSpace, vectors: Vec<SparseVector>, listings: Vec<ListingRecord>) -> Result<Index> {
        if vectors.len() != listings.len() {
            return Err(ConstructionError::CorruptArtifact(format!(
                "{} vectors but {} listings", vectors.len(), listings.len()
            )));
        }
        let dims = space.dimensions();
        for (pos, v) in vectors.iter().enumerate() {
            let mut prev: Option<TermId> = None;
            for &(tid, w) in &v.entries {
                if tid as usize >= dims {
                    return Err(ConstructionError::CorruptArtifact(format!("vector {pos}: term id {tid} out of range")));
                }
                if prev.is_some_and(|p| p >= tid) {
                    return Err(ConstructionError::CorruptArtifact(format!("vector {pos}: term ids not ascending")));
                }
                if !w.is_finite() {
                    return Err(ConstructionError::CorruptArtifact(format!("vector {pos}: non-finite weight")));
                }
                prev = Some(tid);
            }
        }
        if let Some(l) = listings.iter().find(|l| l.popularity.is_some_and(|p| !popularity_in_range(p))) {
            return Err(ConstructionError::CorruptArtifact(format!("listing {}: popularity outside [0, 1]", l.listing_id)));
        }
        let positions = position_map(&listings);
        Ok(Index { space, vectors, listings, positions })
    }

    pub fn space(&self) -> &TermVectorSpace { &self.space }
    pub fn vectors(&self) -> &[SparseVector] { &self.vectors }
    pub fn listings(&self) -> &[ListingRecord] { &self.listings }
    pub fn len(&self) -> usize { self.listings.len() }

    /// True when the index holds zero listings.
    pub fn is_empty_corpus(&self) -> bool { self.listings.is_empty() }

    pub fn is_empty(&self) -> bool { self.is_empty_corpus() }

    /// Refuse a degenerate index for callers that will not serve one.
    pub fn ensure_servable(&self) -> Result<()> {
        if self.is_empty_corpus() {
            return Err(ConstructionError::EmptyCorpus);
        }
        Ok(())
    }

    /// Storage position of the first listing carrying `listing_id`.
    pub fn position_of(&self, listing_id: &str) -> Option<usize> {
        self.positions.get(listing_id).copied()
    }
}

fn position_map(listings: &[ListingRecord]) -> HashMap<String, usize> {
    let mut positions = HashMap::with_capacity(listings.len());
    for (pos, l) in listings.iter().enumerate() {
        if positions.contains_key(&l.listing_id) {
            tracing::warn!(listing_id = %l.listing_id, pos, "duplicate listing id; first occurrence wins");
            continue;
        }
        positions.insert(l.listing_id.clone(), pos);
    }
    positions
}
