use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity under which retrieval hits are aggregated.
///
/// Ordering is lexicographic on `college`, then `program`; the ranker relies on
/// it to break score ties deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProgramKey {
    pub college: String,
    pub program: String,
}

impl ProgramKey {
    #[inline]
    #[must_use]
    pub fn new(college: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            college: college.into(),
            program: program.into(),
        }
    }
}

impl fmt::Display for ProgramKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.college, self.program)
    }
}
