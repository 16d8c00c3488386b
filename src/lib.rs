//! hri - hybrid resume intelligence
//!
//! Stores extracted candidate profiles in a structured SQLite store and a
//! vector index, and answers recruiter queries by fusing semantic, fuzzy and
//! exact matching.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod ingest;
pub mod model;
pub mod search;
pub mod storage;
pub mod tools;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{HriError, Result};
