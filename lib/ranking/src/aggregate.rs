//! Per-program aggregation of retrieval hits
//!
//! Hits are grouped by [`ProgramKey`], similarities below the floor are
//! dropped, and the strongest `top_n` survivors are blended:
//!
//! ```text
//! weighted = Σ s² / Σ s
//! peak     = max s
//! raw      = weighted_blend * weighted + peak_blend * peak
//! ```
//!
//! A program with no surviving similarity produces no score at all.

use crate::explain::TopUnit;
use crate::policy::{ScoringPolicy, SimilarityScale};
use std::collections::BTreeMap;
use syllabx_core::{MatchItem, ProgramKey};
use tracing::trace;

/// Accumulator for one program within one ranking call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramAggregate {
    /// Scaled similarities in arrival order
    pub similarities: Vec<f64>,
    /// `(unit, scaled similarity)` in arrival order
    pub units: Vec<(String, f64)>,
    /// Last non-empty source path seen
    pub file_path: Option<String>,
}

impl ProgramAggregate {
    pub fn push(&mut self, item: MatchItem, scale: SimilarityScale) {
        let similarity = scale.apply(item.similarity);
        self.similarities.push(similarity);
        self.units.push((item.unit, similarity));
        if item.file_path.is_some() {
            self.file_path = item.file_path;
        }
    }

    /// Units at or above `floor`, strongest first (arrival order on ties), at most `top_n`
    pub fn top_units(&self, floor: f64, top_n: usize) -> Vec<TopUnit> {
        let mut surviving: Vec<&(String, f64)> =
            self.units.iter().filter(|(_, s)| *s >= floor).collect();
        surviving.sort_by(|a, b| b.1.total_cmp(&a.1));
        surviving
            .into_iter()
            .take(top_n)
            .map(|(unit, similarity)| TopUnit {
                unit: unit.clone(),
                similarity: *similarity,
            })
            .collect()
    }
}

/// Blend components for one program
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendedScore {
    pub average: f64,
    pub weighted: f64,
    pub peak: f64,
    pub raw: f64,
}

/// Weighted-quadratic mean blended with the peak. `None` for an empty slice.
pub fn blend(similarities: &[f64], weighted_blend: f64, peak_blend: f64) -> Option<BlendedScore> {
    if similarities.is_empty() {
        return None;
    }

    let sum: f64 = similarities.iter().sum();
    let sum_sq: f64 = similarities.iter().map(|s| s * s).sum();
    let peak = similarities.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let weighted = if sum > 0.0 { sum_sq / sum } else { 0.0 };

    Some(BlendedScore {
        average: sum / similarities.len() as f64,
        weighted,
        peak,
        raw: weighted_blend * weighted + peak_blend * peak,
    })
}

/// Aggregated score for one surviving program
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramScore {
    pub key: ProgramKey,
    pub blend: BlendedScore,
    pub matched_unit_count: usize,
    pub top_units: Vec<TopUnit>,
    pub file_path: Option<String>,
}

/// Group hits by program, ordered by key
pub fn group_matches<I>(matches: I, scale: SimilarityScale) -> BTreeMap<ProgramKey, ProgramAggregate>
where
    I: IntoIterator<Item = MatchItem>,
{
    let mut groups: BTreeMap<ProgramKey, ProgramAggregate> = BTreeMap::new();
    for item in matches {
        groups.entry(item.key.clone()).or_default().push(item, scale);
    }
    groups
}

/// Applies a [`ScoringPolicy`] to grouped hits
#[derive(Debug, Clone, Copy)]
pub struct Aggregator<'a> {
    policy: &'a ScoringPolicy,
}

impl<'a> Aggregator<'a> {
    pub fn new(policy: &'a ScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn score(&self, key: &ProgramKey, aggregate: &ProgramAggregate) -> Option<ProgramScore> {
        let top_units = aggregate.top_units(self.policy.similarity_floor, self.policy.top_n);
        let top: Vec<f64> = top_units.iter().map(|u| u.similarity).collect();

        let Some(blend) = blend(&top, self.policy.weighted_blend, self.policy.peak_blend) else {
            trace!(program = %key, hits = aggregate.units.len(), "no hit above floor");
            return None;
        };

        Some(ProgramScore {
            key: key.clone(),
            blend,
            matched_unit_count: top.len(),
            top_units,
            file_path: aggregate.file_path.clone(),
        })
    }

    /// Score every program with at least one hit above the floor, ordered by key
    pub fn aggregate(&self, groups: &BTreeMap<ProgramKey, ProgramAggregate>) -> Vec<ProgramScore> {
        groups
            .iter()
            .filter_map(|(key, aggregate)| self.score(key, aggregate))
            .collect()
    }
}
