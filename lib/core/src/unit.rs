use crate::key::ProgramKey;
use serde::{Deserialize, Serialize};

/// One row of the index side-table. The i-th record describes the i-th indexed vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub college: String,
    pub program: String,
    /// Chunk of syllabus text that was embedded
    pub unit: String,
    #[serde(default)]
    pub file_path: Option<String>,
}

impl UnitRecord {
    pub fn new(
        key: &ProgramKey,
        unit: impl Into<String>,
        file_path: Option<String>,
    ) -> Self {
        Self {
            college: key.college.clone(),
            program: key.program.clone(),
            unit: unit.into(),
            file_path,
        }
    }

    pub fn key(&self) -> ProgramKey {
        ProgramKey::new(self.college.clone(), self.program.clone())
    }
}

/// One retrieval hit, resolved against the side-table
#[derive(Debug, Clone, PartialEq)]
pub struct MatchItem {
    pub key: ProgramKey,
    pub unit: String,
    pub file_path: Option<String>,
    /// Raw cosine similarity in [-1, 1]
    pub similarity: f32,
}

impl MatchItem {
    pub fn new(
        key: ProgramKey,
        unit: impl Into<String>,
        file_path: Option<String>,
        similarity: f32,
    ) -> Self {
        Self {
            key,
            unit: unit.into(),
            file_path,
            similarity,
        }
    }

    pub fn from_record(record: &UnitRecord, similarity: f32) -> Self {
        Self {
            key: record.key(),
            unit: record.unit.clone(),
            file_path: record.file_path.clone(),
            similarity,
        }
    }
}
