//! Program metadata lookups
//!
//! `university_metadata.json` comes in two shapes, both accepted:
//!
//! ```json
//! [{"college": "IIT Delhi", "program": "M.Tech AI", "syllabusPdf": "..."}]
//! {"M.Tech AI": {"college": "IIT Delhi", "syllabus_pdf": "...", "entrances": ["GATE"]}}
//! ```
//!
//! The file is read on every lookup so edits show up without a reload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use syllabx_core::{Error, ProgramKey, Result};
use tracing::warn;

pub const PROGRAM_METADATA_FILE: &str = "university_metadata.json";

/// Descriptive details for one program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramRecord {
    #[serde(default, alias = "university", skip_serializing_if = "Option::is_none")]
    pub college: Option<String>,
    #[serde(default)]
    pub program: String,
    #[serde(default, alias = "official_website", skip_serializing_if = "Option::is_none")]
    pub official_website: Option<String>,
    #[serde(default, alias = "entrance_exams", alias = "entrances")]
    pub entrance_exams: Vec<Value>,
    #[serde(default, alias = "pyq_links")]
    pub pyq_links: Vec<Value>,
    #[serde(default, alias = "syllabus_pdf", skip_serializing_if = "Option::is_none")]
    pub syllabus_pdf: Option<String>,
    /// Any other fields, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProgramRecord {
    fn matches(&self, college: Option<&str>, program: &str) -> bool {
        self.program == program && college.map_or(true, |c| self.college.as_deref() == Some(c))
    }

    fn matches_ignore_case(&self, college: Option<&str>, program: &str) -> bool {
        let program_ok = self.program.to_lowercase() == program.to_lowercase();
        let college_ok = match (college, self.college.as_deref()) {
            (None, _) => true,
            (Some(wanted), Some(have)) => wanted.to_lowercase() == have.to_lowercase(),
            (Some(_), None) => false,
        };
        program_ok && college_ok
    }
}

/// Parsed metadata file
#[derive(Debug, Clone, Default)]
pub struct ProgramMetadata {
    records: Vec<ProgramRecord>,
}

impl ProgramMetadata {
    pub fn from_json(json: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(json)?;
        let raw: Vec<(Option<String>, Value)> = match root {
            Value::Array(items) => items.into_iter().map(|v| (None, v)).collect(),
            Value::Object(map) => map.into_iter().map(|(k, v)| (Some(k), v)).collect(),
            other => {
                return Err(Error::Serialization(format!(
                    "program metadata must be a list or an object, found {}",
                    json_kind(&other)
                )))
            }
        };

        let mut records = Vec::with_capacity(raw.len());
        for (name, value) in raw {
            match serde_json::from_value::<ProgramRecord>(value) {
                Ok(mut record) => {
                    if record.program.is_empty() {
                        match name {
                            Some(name) => record.program = name,
                            None => {
                                warn!("skipping program metadata record without a program name");
                                continue;
                            }
                        }
                    }
                    records.push(record);
                }
                Err(e) => warn!(program = ?name, error = %e, "skipping malformed program metadata record"),
            }
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[ProgramRecord] {
        &self.records
    }

    /// Exact match first, then case-insensitive
    pub fn lookup(&self, college: Option<&str>, program: &str) -> Option<&ProgramRecord> {
        self.records
            .iter()
            .find(|r| r.matches(college, program))
            .or_else(|| self.records.iter().find(|r| r.matches_ignore_case(college, program)))
    }

    pub fn lookup_key(&self, key: &ProgramKey) -> Option<&ProgramRecord> {
        self.lookup(Some(&key.college), &key.program)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Handle on the metadata file
#[derive(Debug, Clone)]
pub struct ProgramMetadataStore {
    path: PathBuf,
}

impl ProgramMetadataStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is [`Error::NotFound`]; unparseable JSON is [`Error::Serialization`]
    pub fn load(&self) -> Result<ProgramMetadata> {
        if !self.path.exists() {
            return Err(Error::NotFound("Metadata not found.".to_string()));
        }
        ProgramMetadata::from_json(&fs::read_to_string(&self.path)?)
    }

    pub fn lookup(&self, college: Option<&str>, program: &str) -> Result<ProgramRecord> {
        self.load()?
            .lookup(college, program)
            .cloned()
            .ok_or_else(|| Error::NotFound("Program not found.".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = r#"[
        {"college": "IIT Delhi", "program": "M.Tech AI", "syllabusPdf": "raw_pdfs/iitd_ai.pdf",
         "officialWebsite": "https://iitd.ac.in", "entranceExams": ["GATE"]},
        {"college": "IIT Bombay", "program": "M.Tech AI", "syllabus_pdf": "raw_pdfs/iitb_ai.pdf"},
        {"college": "NIT", "program": 42}
    ]"#;

    const KEYED: &str = r#"{
        "B.Tech CSE": {"syllabus_pdf": "raw_pdfs/cse.pdf", "entrances": ["JEE Main", "JEE Advanced"], "seats": 120},
        "B.Sc Physics": {"college": "St. Xavier's", "pyq_links": ["https://example.org/pyq"]}
    }"#;

    #[test]
    fn test_list_shape() {
        let metadata = ProgramMetadata::from_json(LIST).unwrap();
        assert_eq!(metadata.records().len(), 2);

        let record = metadata.lookup(Some("IIT Bombay"), "M.Tech AI").unwrap();
        assert_eq!(record.syllabus_pdf.as_deref(), Some("raw_pdfs/iitb_ai.pdf"));

        let record = metadata.lookup(None, "M.Tech AI").unwrap();
        assert_eq!(record.college.as_deref(), Some("IIT Delhi"));
        assert_eq!(record.entrance_exams, vec![Value::from("GATE")]);
    }

    #[test]
    fn test_keyed_shape() {
        let metadata = ProgramMetadata::from_json(KEYED).unwrap();
        let record = metadata.lookup(None, "B.Tech CSE").unwrap();
        assert_eq!(record.program, "B.Tech CSE");
        assert_eq!(record.entrance_exams.len(), 2);
        assert_eq!(record.extra.get("seats"), Some(&Value::from(120)));

        let record = metadata.lookup_key(&ProgramKey::new("St. Xavier's", "B.Sc Physics")).unwrap();
        assert_eq!(record.pyq_links.len(), 1);
    }

    #[test]
    fn test_case_insensitive_fallback() {
        let metadata = ProgramMetadata::from_json(LIST).unwrap();
        let record = metadata.lookup(Some("iit delhi"), "m.tech ai").unwrap();
        assert_eq!(record.college.as_deref(), Some("IIT Delhi"));
        assert!(metadata.lookup(Some("IIT Madras"), "M.Tech AI").is_none());
    }

    #[test]
    fn test_serializes_camel_case() {
        let metadata = ProgramMetadata::from_json(LIST).unwrap();
        let json = serde_json::to_value(&metadata.records()[0]).unwrap();
        assert_eq!(json["syllabusPdf"], "raw_pdfs/iitd_ai.pdf");
        assert_eq!(json["officialWebsite"], "https://iitd.ac.in");
        assert_eq!(json["entranceExams"][0], "GATE");
    }

    #[test]
    fn test_malformed_top_level() {
        assert!(matches!(ProgramMetadata::from_json("\"nope\""), Err(Error::Serialization(_))));
        assert!(matches!(ProgramMetadata::from_json("{not json"), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_store_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgramMetadataStore::new(dir.path().join(PROGRAM_METADATA_FILE));
        assert!(matches!(store.lookup(None, "M.Tech AI"), Err(Error::NotFound(_))));

        fs::write(store.path(), LIST).unwrap();
        assert!(store.lookup(None, "M.Tech AI").is_ok());
        assert!(matches!(store.lookup(None, "MBA"), Err(Error::NotFound(_))));
    }
}
