//! Scoring policy
//!
//! Floor, top-N, blend weights, score representation, normalization and the
//! classifier bands are one configuration unit. Bands are calibrated against
//! the score range the rest of the policy produces, so when a policy file
//! switches normalization without giving bands, the matching preset is used.

use serde::{Deserialize, Serialize};
use syllabx_core::{Error, Result, MAX_SEARCH_K};

/// Upper bound on units kept per program
pub const MAX_TOP_UNITS: usize = 5;

/// Default number of nearest units requested from the index
pub const DEFAULT_TOP_K: usize = 50;

/// How raw cosine similarity in [-1, 1] is mapped before thresholding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityScale {
    /// Negative similarities become 0, positives are unchanged
    #[default]
    Clamp,
    /// `(s + 1) / 2`
    Rescale,
}

impl SimilarityScale {
    #[inline]
    pub fn apply(self, similarity: f32) -> f64 {
        let s = f64::from(similarity);
        match self {
            SimilarityScale::Clamp => s.clamp(0.0, 1.0),
            SimilarityScale::Rescale => ((s + 1.0) / 2.0).clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    #[default]
    None,
    /// Per-query min-max rescaling; scores only compare within one result set
    MinMax,
}

/// Classifier thresholds: `score >= strong` is Strong, `score >= moderate` is Moderate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignmentBands {
    pub strong: f64,
    pub moderate: f64,
}

impl AlignmentBands {
    /// Calibrated for blended raw similarity
    pub const RAW: AlignmentBands = AlignmentBands {
        strong: 0.55,
        moderate: 0.40,
    };

    /// Calibrated for min-max normalized scores
    pub const MIN_MAX: AlignmentBands = AlignmentBands {
        strong: 0.66,
        moderate: 0.33,
    };

    pub fn preset_for(normalization: Normalization) -> Self {
        match normalization {
            Normalization::None => Self::RAW,
            Normalization::MinMax => Self::MIN_MAX,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let in_range = |v: f64| (0.0..=1.0).contains(&v);
        if !in_range(self.strong) || !in_range(self.moderate) {
            return Err(Error::InvalidConfig(format!(
                "alignment bands must lie in [0, 1], got strong={} moderate={}",
                self.strong, self.moderate
            )));
        }
        if self.strong <= self.moderate {
            return Err(Error::InvalidConfig(format!(
                "strong band ({}) must be above moderate band ({})",
                self.strong, self.moderate
            )));
        }
        Ok(())
    }
}

impl Default for AlignmentBands {
    fn default() -> Self {
        Self::RAW
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PolicyFile")]
pub struct ScoringPolicy {
    pub scale: SimilarityScale,
    /// Similarities below this (after scaling) are noise
    pub similarity_floor: f64,
    /// Surviving similarities used per program
    pub top_n: usize,
    pub weighted_blend: f64,
    pub peak_blend: f64,
    pub normalization: Normalization,
    pub bands: AlignmentBands,
    /// Nearest units requested per query
    pub top_k: usize,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            scale: SimilarityScale::Clamp,
            similarity_floor: 0.28,
            top_n: 3,
            weighted_blend: 0.7,
            peak_blend: 0.3,
            normalization: Normalization::None,
            bands: AlignmentBands::RAW,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl ScoringPolicy {
    /// Default policy with per-query min-max normalization and its bands
    pub fn min_max() -> Self {
        Self {
            normalization: Normalization::MinMax,
            bands: AlignmentBands::MIN_MAX,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.similarity_floor) {
            return Err(Error::InvalidConfig(format!(
                "similarity_floor must lie in [0, 1], got {}",
                self.similarity_floor
            )));
        }
        if self.top_n == 0 || self.top_n > MAX_TOP_UNITS {
            return Err(Error::InvalidConfig(format!(
                "top_n must be between 1 and {}, got {}",
                MAX_TOP_UNITS, self.top_n
            )));
        }
        if self.top_k == 0 || self.top_k > MAX_SEARCH_K {
            return Err(Error::InvalidConfig(format!(
                "top_k must be between 1 and {}, got {}",
                MAX_SEARCH_K, self.top_k
            )));
        }
        if self.weighted_blend < 0.0
            || self.peak_blend < 0.0
            || (self.weighted_blend + self.peak_blend - 1.0).abs() > 1e-9
        {
            return Err(Error::InvalidConfig(format!(
                "blend weights must be non-negative and sum to 1, got {} + {}",
                self.weighted_blend, self.peak_blend
            )));
        }
        self.bands.validate()
    }

    /// Parse and validate a JSON policy document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// On-disk shape: every field optional, bands follow normalization unless given
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PolicyFile {
    scale: Option<SimilarityScale>,
    similarity_floor: Option<f64>,
    top_n: Option<usize>,
    weighted_blend: Option<f64>,
    peak_blend: Option<f64>,
    normalization: Option<Normalization>,
    bands: Option<AlignmentBands>,
    top_k: Option<usize>,
}

impl TryFrom<PolicyFile> for ScoringPolicy {
    type Error = Error;

    fn try_from(file: PolicyFile) -> Result<Self> {
        let defaults = ScoringPolicy::default();
        let normalization = file.normalization.unwrap_or(defaults.normalization);
        let policy = ScoringPolicy {
            scale: file.scale.unwrap_or(defaults.scale),
            similarity_floor: file.similarity_floor.unwrap_or(defaults.similarity_floor),
            top_n: file.top_n.unwrap_or(defaults.top_n),
            weighted_blend: file.weighted_blend.unwrap_or(defaults.weighted_blend),
            peak_blend: file.peak_blend.unwrap_or(defaults.peak_blend),
            normalization,
            bands: file
                .bands
                .unwrap_or_else(|| AlignmentBands::preset_for(normalization)),
            top_k: file.top_k.unwrap_or(defaults.top_k),
        };
        policy.validate()?;
        Ok(policy)
    }
}
