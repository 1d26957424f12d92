//! Content-based listing recommendations over a TF-IDF vector index.

pub mod engine;
pub mod error;
pub mod index;
pub mod listing;
pub mod moderation;
pub mod persist;
pub mod search;
pub mod tokenizer;

pub use engine::{RecommendationEngine, RecommendationResult};
pub use error::ConstructionError;
pub use index::{Index, SparseVector, TermId, TermVectorSpace};
pub use listing::{ListingRecord, RawListing};
pub use search::{BruteForceSearch, Neighbor, NeighborSearch};
