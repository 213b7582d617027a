//! Deterministic ordering of ranked programs
//!
//! Results are ordered by score descending with ties broken by program key
//! ascending. Truncation happens after sorting.

use crate::explain::RankedResult;
use ordered_float::OrderedFloat;
use std::cmp::Ordering;

/// Total order used for ranked output
#[inline]
pub fn compare(a: &RankedResult, b: &RankedResult) -> Ordering {
    OrderedFloat(b.score)
        .cmp(&OrderedFloat(a.score))
        .then_with(|| a.key.cmp(&b.key))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Ranker {
    limit: Option<usize>,
}

impl Ranker {
    pub fn new(limit: Option<usize>) -> Self {
        Self { limit }
    }

    pub fn rank(&self, mut results: Vec<RankedResult>) -> Vec<RankedResult> {
        results.sort_by(compare);
        if let Some(limit) = self.limit {
            results.truncate(limit);
        }
        results
    }
}
