//! Search engine for candidates
//!
//! Implements hybrid search: fuzzy structured matching + hash embeddings,
//! fused by a weighted sum of per-axis scores.

pub mod control;
pub mod embeddings;
pub mod fuzzy;
pub mod hybrid;
pub mod query;

pub use control::{CancellationToken, SearchControl};
pub use embeddings::{Embedder, HashEmbedder};
pub use hybrid::HybridSearch;
pub use query::{FieldHit, MatchExplanation, SearchQuery, SearchResult, Weights};
