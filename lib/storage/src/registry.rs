//! Versioned syllabus registry
//!
//! `registry.json` is a list of entries, one per ingested document version.
//! At most one entry per program key should be active. When the file breaks
//! that rule, the entry checked most recently wins (the later one in file
//! order on equal dates) and the violation is logged.
//!
//! Entries that fail to parse are kept verbatim and written back on save, so
//! a single bad record never blocks the rest of the registry.

use crate::index_store::write_atomic;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use syllabx_core::{Error, ProgramKey, Result};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    #[serde(alias = "university")]
    pub college: String,
    pub program: String,
    /// Relative to the data directory
    #[serde(alias = "filePath")]
    pub file_path: String,
    /// SHA-256 of the document, lowercase hex
    pub hash: String,
    #[serde(default, alias = "academicYear")]
    pub academic_year: Option<String>,
    #[serde(default, alias = "isActive")]
    pub is_active: bool,
    #[serde(default, alias = "lastChecked")]
    pub last_checked: Option<NaiveDate>,
    #[serde(default, alias = "sourceUrl", skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl RegistryEntry {
    pub fn key(&self) -> ProgramKey {
        ProgramKey::new(self.college.clone(), self.program.clone())
    }

    fn matches(&self, key: &ProgramKey) -> bool {
        self.college == key.college && self.program == key.program
    }
}

/// More than one active entry for a program
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveConflict {
    pub key: ProgramKey,
    /// Positions of the active entries in file order
    pub positions: Vec<usize>,
    /// Position of the entry that wins resolution
    pub chosen: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// Same document hash already registered for this program
    Unchanged,
    /// New version appended and activated; older versions deactivated
    Added,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
    /// Records that failed to parse, with their position in the source file
    unparsed: Vec<(usize, Value)>,
}

impl Registry {
    pub fn new(entries: Vec<RegistryEntry>) -> Self {
        Self {
            entries,
            unparsed: Vec::new(),
        }
    }

    /// Load an existing registry. A missing file is [`Error::NotFound`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(format!("registry {} not found", path.display())));
        }
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Load, or start empty when the file does not exist yet
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        match Self::load(path) {
            Err(Error::NotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let values: Vec<Value> = serde_json::from_str(json)?;
        let mut registry = Self::default();

        for (position, value) in values.into_iter().enumerate() {
            match serde_json::from_value::<RegistryEntry>(value.clone()) {
                Ok(entry) => registry.entries.push(entry),
                Err(e) => {
                    warn!(position, error = %e, "skipping malformed registry entry");
                    registry.unparsed.push((position, value));
                }
            }
        }
        Ok(registry)
    }

    pub fn to_json(&self) -> Result<String> {
        let total = self.entries.len() + self.unparsed.len();
        let mut values = Vec::with_capacity(total);
        let mut entries = self.entries.iter();
        let mut unparsed = self.unparsed.iter().peekable();

        // Unparsed records go back where they were read; parsed entries fill the gaps
        for position in 0..total {
            if let Some((_, value)) = unparsed.next_if(|(at, _)| *at == position) {
                values.push(value.clone());
            } else if let Some(entry) = entries.next() {
                values.push(serde_json::to_value(entry)?);
            } else if let Some((_, value)) = unparsed.next() {
                values.push(value.clone());
            }
        }
        Ok(serde_json::to_string_pretty(&values)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_atomic(path, self.to_json()?.as_bytes())
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn unparsed_count(&self) -> usize {
        self.unparsed.len()
    }

    /// Every program key with more than one active entry
    pub fn integrity_violations(&self) -> Vec<ActiveConflict> {
        self.active_positions()
            .into_iter()
            .filter(|(_, positions)| positions.len() > 1)
            .map(|(key, positions)| {
                let chosen = self.pick_latest(&positions);
                ActiveConflict {
                    key,
                    positions,
                    chosen,
                }
            })
            .collect()
    }

    /// Exactly one active entry per program, ordered by key
    pub fn active_entries(&self) -> Vec<&RegistryEntry> {
        self.active_positions()
            .into_iter()
            .map(|(key, positions)| {
                let chosen = self.pick_latest(&positions);
                if positions.len() > 1 {
                    warn!(
                        program = %key,
                        active = positions.len(),
                        chosen = %self.entries[chosen].file_path,
                        "multiple active registry entries; using most recently checked"
                    );
                }
                &self.entries[chosen]
            })
            .collect()
    }

    fn active_positions(&self) -> BTreeMap<ProgramKey, Vec<usize>> {
        let mut by_key: BTreeMap<ProgramKey, Vec<usize>> = BTreeMap::new();
        for (position, entry) in self.entries.iter().enumerate() {
            if entry.is_active {
                by_key.entry(entry.key()).or_default().push(position);
            }
        }
        by_key
    }

    /// Latest `last_checked`, later file position on ties; undated entries sort first
    fn pick_latest(&self, positions: &[usize]) -> usize {
        positions
            .iter()
            .copied()
            .max_by_key(|&p| (self.entries[p].last_checked, p))
            .unwrap_or(positions[0])
    }

    pub fn find_by_hash(&self, key: &ProgramKey, hash: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.matches(key) && e.hash == hash)
    }

    /// Record a document version for `key`.
    ///
    /// An already-known hash only refreshes `last_checked` on the active entry.
    /// A new hash deactivates every older entry for the key and appends the new
    /// one as the single active version.
    pub fn register_version(&mut self, mut entry: RegistryEntry, today: NaiveDate) -> RegisterOutcome {
        let key = entry.key();

        if self.find_by_hash(&key, &entry.hash).is_some() {
            for existing in self.entries.iter_mut().filter(|e| e.matches(&key) && e.is_active) {
                existing.last_checked = Some(today);
            }
            return RegisterOutcome::Unchanged;
        }

        for existing in self.entries.iter_mut().filter(|e| e.matches(&key)) {
            existing.is_active = false;
        }

        entry.is_active = true;
        entry.last_checked = Some(today);
        self.entries.push(entry);
        RegisterOutcome::Added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn entry(college: &str, program: &str, file: &str, hash: &str, active: bool, checked: Option<&str>) -> RegistryEntry {
        RegistryEntry {
            college: college.to_string(),
            program: program.to_string(),
            file_path: file.to_string(),
            hash: hash.to_string(),
            academic_year: Some("2025-2026".to_string()),
            is_active: active,
            last_checked: checked.map(date),
            source_url: None,
        }
    }

    #[test]
    fn test_duplicate_active_prefers_most_recently_checked() {
        let registry = Registry::new(vec![
            entry("IIT Delhi", "M.Tech", "newer.pdf", "h2", true, Some("2025-06-01")),
            entry("IIT Delhi", "M.Tech", "older.pdf", "h1", true, Some("2025-01-01")),
            entry("NIT", "B.Tech", "nit.pdf", "h3", true, None),
        ]);

        let active = registry.active_entries();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].file_path, "newer.pdf");
        assert_eq!(active[1].file_path, "nit.pdf");

        let conflicts = registry.integrity_violations();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].key, ProgramKey::new("IIT Delhi", "M.Tech"));
        assert_eq!(conflicts[0].positions, vec![0, 1]);
        assert_eq!(conflicts[0].chosen, 0);
    }

    #[test]
    fn test_duplicate_active_same_date_prefers_later_entry() {
        let registry = Registry::new(vec![
            entry("C", "P", "first.pdf", "h1", true, Some("2025-03-03")),
            entry("C", "P", "second.pdf", "h2", true, Some("2025-03-03")),
        ]);
        assert_eq!(registry.active_entries()[0].file_path, "second.pdf");

        let undated = Registry::new(vec![
            entry("C", "P", "first.pdf", "h1", true, None),
            entry("C", "P", "second.pdf", "h2", true, None),
        ]);
        assert_eq!(undated.active_entries()[0].file_path, "second.pdf");
    }

    #[test]
    fn test_inactive_entries_are_ignored() {
        let registry = Registry::new(vec![
            entry("C", "P", "old.pdf", "h1", false, Some("2026-01-01")),
            entry("C", "P", "current.pdf", "h2", true, Some("2025-01-01")),
        ]);
        assert_eq!(registry.active_entries()[0].file_path, "current.pdf");
        assert!(registry.integrity_violations().is_empty());
    }

    #[test]
    fn test_register_new_version_deactivates_old() {
        let mut registry = Registry::new(vec![entry("C", "P", "v1.pdf", "h1", true, Some("2025-01-01"))]);

        let outcome = registry.register_version(entry("C", "P", "v2.pdf", "h2", false, None), date("2025-09-01"));
        assert_eq!(outcome, RegisterOutcome::Added);
        assert_eq!(registry.entries().len(), 2);
        assert!(!registry.entries()[0].is_active);
        assert!(registry.entries()[1].is_active);
        assert_eq!(registry.entries()[1].last_checked, Some(date("2025-09-01")));
        assert!(registry.integrity_violations().is_empty());
    }

    #[test]
    fn test_register_known_hash_only_touches() {
        let mut registry = Registry::new(vec![entry("C", "P", "v1.pdf", "h1", true, Some("2025-01-01"))]);

        let outcome = registry.register_version(entry("C", "P", "dup.pdf", "h1", false, None), date("2025-09-01"));
        assert_eq!(outcome, RegisterOutcome::Unchanged);
        assert_eq!(registry.entries().len(), 1);
        assert_eq!(registry.entries()[0].last_checked, Some(date("2025-09-01")));
    }

    #[test]
    fn test_malformed_entries_survive_round_trip() {
        let json = r#"[
            {"college": "C", "program": "P", "file_path": "a.pdf", "hash": "h", "is_active": true, "last_checked": "2025-02-03"},
            {"university": "legacy record without program"},
            {"college": "D", "program": "Q", "filePath": "b.pdf", "hash": "k", "isActive": true, "academicYear": "2024"}
        ]"#;
        let registry = Registry::from_json(json).unwrap();
        assert_eq!(registry.entries().len(), 2);
        assert_eq!(registry.unparsed_count(), 1);
        assert_eq!(registry.entries()[1].file_path, "b.pdf");
        assert_eq!(registry.entries()[0].last_checked, Some(date("2025-02-03")));

        let reparsed = Registry::from_json(&registry.to_json().unwrap()).unwrap();
        assert_eq!(reparsed, registry);
    }

    #[test]
    fn test_malformed_entries_keep_their_position() {
        let json = r#"[
            {"college": "C", "program": "P", "file_path": "a.pdf", "hash": "h", "is_active": true},
            {"note": "hand edited"},
            {"college": "D", "program": "Q", "file_path": "b.pdf", "hash": "k", "is_active": true}
        ]"#;
        let mut registry = Registry::from_json(json).unwrap();
        registry.register_version(entry("E", "R", "c.pdf", "m", false, None), date("2025-09-01"));

        let values: Vec<Value> = serde_json::from_str(&registry.to_json().unwrap()).unwrap();
        assert_eq!(values.len(), 4);
        assert_eq!(values[0]["file_path"], "a.pdf");
        assert_eq!(values[1], serde_json::json!({"note": "hand edited"}));
        assert_eq!(values[2]["file_path"], "b.pdf");
        assert_eq!(values[3]["file_path"], "c.pdf");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        assert!(matches!(Registry::load(&path), Err(Error::NotFound(_))));
        assert!(Registry::load_or_default(&path).unwrap().entries().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("registry.json");
        let registry = Registry::new(vec![entry("C", "P", "v1.pdf", "h1", true, Some("2025-01-01"))]);
        registry.save(&path).unwrap();
        assert_eq!(Registry::load(&path).unwrap(), registry);
    }
}
