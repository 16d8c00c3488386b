//! Candidate data model
//!
//! The canonical in-memory representation of a candidate. Every record that
//! reaches a store passes through [`Candidate::validate`], which is also the
//! only place nested identifiers are assigned.

pub mod candidate;
pub mod dates;
pub mod intake;
pub mod normalize;

pub use candidate::{
    CANDIDATE_SCHEMA_VERSION, Candidate, ContactInfo, Education, WorkExperience, new_id,
};
pub use intake::{PartialDataWarning, RawCandidate, Validated};
