//! Hash embeddings
//!
//! Implements FNV-1a based hash embeddings for semantic similarity.
//! No ML model dependencies - fully deterministic. Any real embedding model
//! plugs in behind the [`Embedder`] trait.

use crate::model::normalize::tokens;

/// Text to fixed-length vector.
pub trait Embedder: Send + Sync {
    /// Embed text into a vector of length [`Embedder::dims`].
    fn embed(&self, text: &str) -> Vec<f32>;

    /// Output dimension.
    fn dims(&self) -> usize;

    /// Identifier persisted with a collection so a snapshot built by one
    /// embedder is never queried with another.
    fn model_id(&self) -> String;
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Weight of a word bigram relative to a unigram.
const BIGRAM_WEIGHT: f32 = 0.5;

/// Hash embedder using FNV-1a
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    /// Embedding dimension (default: 384)
    dim: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self { dim: 384 }
    }
}

impl HashEmbedder {
    /// Create embedder with specified dimension
    #[must_use]
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn bucket(&self, feature: &str) -> usize {
        let hash = fnv1a(feature.as_bytes());
        #[allow(clippy::cast_possible_truncation)]
        let idx = (hash % self.dim as u64) as usize;
        idx
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dim];
        let words = tokens(text);
        for word in &words {
            vector[self.bucket(word)] += 1.0;
        }
        for pair in words.windows(2) {
            let feature = format!("{} {}", pair[0], pair[1]);
            vector[self.bucket(&feature)] += BIGRAM_WEIGHT;
        }
        l2_normalize(&mut vector);
        vector
    }

    fn dims(&self) -> usize {
        self.dim
    }

    fn model_id(&self) -> String {
        format!("fnv1a-hash-{}", self.dim)
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// Compute cosine similarity between two vectors
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
