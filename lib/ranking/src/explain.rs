//! Explainability for ranked programs
//!
//! Output structures describing how each program's score was formed: the
//! blend components, how many units contributed and which units matched best.

use crate::classify::AlignmentStrength;
use serde::{Deserialize, Serialize};
use syllabx_core::ProgramKey;

/// Round to 4 decimals for presentation
#[inline]
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// A matched syllabus unit shown as evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopUnit {
    pub unit: String,
    pub similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Explainability {
    /// Mean of the top-N surviving similarities
    pub average_similarity: f64,
    /// Σs² / Σs over the top-N
    pub weighted_similarity: f64,
    pub peak_similarity: f64,
    /// Blended score before any normalization
    pub raw_score: f64,
    pub matched_unit_count: usize,
    pub alignment_strength: AlignmentStrength,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResult {
    #[serde(flatten)]
    pub key: ProgramKey,
    pub score: f64,
    pub explainability: Explainability,
    pub syllabus_pdf: Option<String>,
    /// Sorted by similarity descending
    pub top_units: Vec<TopUnit>,
}

impl RankedResult {
    pub fn alignment_strength(&self) -> AlignmentStrength {
        self.explainability.alignment_strength
    }
}

/// Trimmed per-program view returned by the query API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub college: String,
    pub program: String,
    pub score: f64,
    pub alignment_strength: AlignmentStrength,
    pub top_units: Vec<TopUnit>,
}

impl From<&RankedResult> for ResultSummary {
    fn from(result: &RankedResult) -> Self {
        Self {
            college: result.key.college.clone(),
            program: result.key.program.clone(),
            score: result.score,
            alignment_strength: result.alignment_strength(),
            top_units: result.top_units.clone(),
        }
    }
}

/// Response body for the rank endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankResponse {
    pub results: Vec<ResultSummary>,
}

impl RankResponse {
    pub fn from_ranked(results: &[RankedResult]) -> Self {
        Self {
            results: results.iter().map(ResultSummary::from).collect(),
        }
    }
}

/// Summary statistics for one ranking call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingStats {
    /// Hits returned by the similarity source
    pub candidates_count: usize,
    /// Distinct programs among the hits
    pub programs_matched: usize,
    /// Programs surviving the noise floor (before truncation)
    pub programs_scored: usize,
    pub results_count: usize,
    pub best_score: Option<f64>,
}
