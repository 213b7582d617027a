//! Exact inner-product index
//!
//! Vectors are L2-normalized on insertion and queries are normalized before
//! scoring, so the inner product returned by [`FlatIndex::search`] is the
//! cosine similarity in `[-1, 1]`.

use crate::{Error, Result, Vector};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Id reported for result slots that have no matching vector
pub const NO_MATCH: i64 = -1;

/// Most result slots a single search returns
pub const MAX_SEARCH_K: usize = 65_536;

/// Raw search output: `k` slots, best first.
///
/// Slots beyond the number of indexed vectors carry [`NO_MATCH`]. Padding
/// stops at [`MAX_SEARCH_K`] slots or the index size, whichever is larger.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHits {
    pub similarities: Vec<f32>,
    pub ids: Vec<i64>,
}

impl SearchHits {
    pub fn empty() -> Self {
        Self {
            similarities: Vec::new(),
            ids: Vec::new(),
        }
    }

    /// Iterate over real hits as `(id, similarity)`, skipping sentinel slots
    pub fn matches(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.ids
            .iter()
            .zip(self.similarities.iter())
            .filter(|(id, _)| **id != NO_MATCH && **id >= 0)
            .map(|(id, sim)| (*id as usize, *sim))
    }
}

/// Nearest-neighbor search primitive over embedded units
pub trait VectorIndex: Send + Sync {
    fn dim(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append vectors; ids are assigned sequentially from `len()`
    fn add(&mut self, vectors: &[Vector]) -> Result<()>;

    fn search(&self, query: &Vector, k: usize) -> Result<SearchHits>;
}

/// Brute-force index storing normalized vectors contiguously
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlatIndex {
    dim: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            data: Vec::new(),
        }
    }

    pub fn with_capacity(dim: usize, capacity: usize) -> Self {
        Self {
            dim,
            data: Vec::with_capacity(dim * capacity),
        }
    }
}

impl VectorIndex for FlatIndex {
    fn dim(&self) -> usize {
        self.dim
    }

    fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    fn add(&mut self, vectors: &[Vector]) -> Result<()> {
        if let Some(bad) = vectors.iter().find(|v| v.dim() != self.dim) {
            return Err(Error::InvalidDimension {
                expected: self.dim,
                actual: bad.dim(),
            });
        }

        self.data.reserve(vectors.len() * self.dim);
        for vector in vectors {
            self.data.extend_from_slice(vector.normalized().as_slice());
        }
        Ok(())
    }

    fn search(&self, query: &Vector, k: usize) -> Result<SearchHits> {
        if query.dim() != self.dim {
            return Err(Error::InvalidDimension {
                expected: self.dim,
                actual: query.dim(),
            });
        }
        if k == 0 {
            return Ok(SearchHits::empty());
        }

        let query = query.normalized();
        let keep = k.min(self.len());
        let slots = k.min(MAX_SEARCH_K.max(keep));

        // Min-heap of the best `keep`; equal scores keep the lower id
        let mut heap: BinaryHeap<Reverse<(OrderedFloat<f32>, Reverse<usize>)>> =
            BinaryHeap::with_capacity(keep + 1);
        for (id, row) in self.data.chunks_exact(self.dim).enumerate() {
            let score = crate::vector::dot_product(query.as_slice(), row);
            heap.push(Reverse((OrderedFloat(score), Reverse(id))));
            if heap.len() > keep {
                heap.pop();
            }
        }

        let mut similarities = Vec::with_capacity(slots);
        let mut ids = Vec::with_capacity(slots);
        for Reverse((score, Reverse(id))) in heap.into_sorted_vec() {
            similarities.push(score.into_inner());
            ids.push(id as i64);
        }
        while ids.len() < slots {
            similarities.push(f32::NEG_INFINITY);
            ids.push(NO_MATCH);
        }

        Ok(SearchHits { similarities, ids })
    }
}
