//! Storage layer for hri
//!
//! Dual persistence: SQLite is the source of truth for candidate records, the
//! vector collection is a secondary index rebuilt from it on demand.

pub mod locks;
pub mod migrations;
pub mod sqlite;
pub mod vector;

pub use locks::CandidateLocks;
pub use sqlite::{Database, FieldMatch, StructuredField};
pub use vector::{
    Metadata, MetadataFilter, MetadataValue, UnavailableIndex, VectorHit, VectorIndex,
    VectorStore,
};
