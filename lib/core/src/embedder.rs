//! Text embedding providers
//!
//! The ranking pipeline only needs `encode(text) -> Vector` with a fixed
//! dimension and deterministic output. [`HashingEmbedder`] is the bundled
//! provider: signed feature hashing of words and character trigrams.

use crate::{Error, Result, Vector};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Default embedding dimension
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

const WORD_WEIGHT: f32 = 2.0;
const TRIGRAM_WEIGHT: f32 = 1.0;

/// Turns text into fixed-size vectors
pub trait Embedder: Send + Sync {
    /// Identifier stamped into index artifacts so a mismatched model is caught at load
    fn name(&self) -> &str;

    fn dim(&self) -> usize;

    fn encode(&self, text: &str) -> Result<Vector>;

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        texts.iter().map(|t| self.encode(t)).collect()
    }
}

/// Deterministic feature-hashing embedder
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
    name: String,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidConfig("embedding dimension must be > 0".to_string()));
        }
        Ok(Self {
            dim,
            name: format!("hashing-v1-{}", dim),
        })
    }

    fn bucket(&self, feature: &str) -> (usize, f32) {
        let mut hasher = DefaultHasher::new();
        feature.hash(&mut hasher);
        let hash = hasher.finish();

        let pos = (hash as usize) % self.dim;
        // Top bit picks the sign so collisions cancel instead of piling up
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        (pos, sign)
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            dim: DEFAULT_EMBEDDING_DIM,
            name: format!("hashing-v1-{}", DEFAULT_EMBEDDING_DIM),
        }
    }
}

impl Embedder for HashingEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn encode(&self, text: &str) -> Result<Vector> {
        let mut data = vec![0.0f32; self.dim];
        let normalized = text.to_lowercase();

        for word in normalized
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let (pos, sign) = self.bucket(word);
            data[pos] += sign * WORD_WEIGHT;

            let padded: Vec<char> = format!(" {} ", word).chars().collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                let (pos, sign) = self.bucket(&trigram);
                data[pos] += sign * TRIGRAM_WEIGHT;
            }
        }

        let mut vector = Vector::new(data);
        vector.normalize();
        Ok(vector)
    }
}
