use crate::policy::AlignmentBands;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse, human-facing strength of a program's match. Ordered weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlignmentStrength {
    Weak,
    Moderate,
    Strong,
}

impl fmt::Display for AlignmentStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AlignmentStrength::Weak => "Weak",
            AlignmentStrength::Moderate => "Moderate",
            AlignmentStrength::Strong => "Strong",
        };
        f.write_str(label)
    }
}

impl AlignmentBands {
    #[inline]
    pub fn classify(&self, score: f64) -> AlignmentStrength {
        if score >= self.strong {
            AlignmentStrength::Strong
        } else if score >= self.moderate {
            AlignmentStrength::Moderate
        } else {
            AlignmentStrength::Weak
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_band_edges() {
        let bands = AlignmentBands::RAW;
        assert_eq!(bands.classify(0.55), AlignmentStrength::Strong);
        assert_eq!(bands.classify(0.5499), AlignmentStrength::Moderate);
        assert_eq!(bands.classify(0.40), AlignmentStrength::Moderate);
        assert_eq!(bands.classify(0.3999), AlignmentStrength::Weak);
        assert_eq!(bands.classify(0.0), AlignmentStrength::Weak);
        assert_eq!(bands.classify(1.0), AlignmentStrength::Strong);
    }

    #[test]
    fn test_serialized_label() {
        let json = serde_json::to_string(&AlignmentStrength::Moderate).unwrap();
        assert_eq!(json, "\"Moderate\"");
        assert_eq!(AlignmentStrength::Strong.to_string(), "Strong");
    }

    proptest! {
        #[test]
        fn prop_classification_is_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            for bands in [AlignmentBands::RAW, AlignmentBands::MIN_MAX] {
                prop_assert!(bands.classify(lo) <= bands.classify(hi));
            }
        }
    }
}
