//! Query-relative min-max normalization
//!
//! Normalized scores are only comparable within the result set they were
//! computed over. Two different queries may both have a top result at 1.0.

/// Score assigned to every entry when the set has no spread
pub const DEGENERATE_SCORE: f64 = 0.5;

/// Rescale `values` into [0, 1]. Equal values (or a single value) all map to 0.5.
pub fn min_max(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if range <= f64::EPSILON {
        return vec![DEGENERATE_SCORE; values.len()];
    }

    values.iter().map(|v| (v - min) / range).collect()
}
