//! Paired index artifacts
//!
//! An index is persisted as two files that must always travel together:
//!
//! - `syllabus.index`: bincode header + normalized vectors
//! - `syllabus_meta.json`: the [`UnitRecord`] side-table
//!
//! The header records the vector count, the embedder that produced the
//! vectors and the SHA-256 of the side-table. Any disagreement at load time is
//! an [`Error::Integrity`]; serving from a mismatched pair would silently
//! attach the wrong syllabus text to every hit.

use atomicwrites::{AtomicFile, OverwriteBehavior};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::Path;
use syllabx_core::{Embedder, Error, FlatIndex, MatchItem, Result, UnitRecord, Vector, VectorIndex};
use syllabx_ranking::{IndexedSource, SimilaritySource};
use tracing::info;

pub const INDEX_FILE: &str = "syllabus.index";
pub const METADATA_FILE: &str = "syllabus_meta.json";

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexHeader {
    pub format_version: u32,
    pub dim: usize,
    pub embedder: String,
    pub count: usize,
    pub metadata_sha256: String,
    pub built_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    header: IndexHeader,
    index: FlatIndex,
}

/// Loaded, validated index + side-table. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct SyllabusIndex {
    header: IndexHeader,
    index: FlatIndex,
    units: Vec<UnitRecord>,
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|f| f.write_all(bytes))
        .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

impl SyllabusIndex {
    pub fn new(embedder: &str, index: FlatIndex, units: Vec<UnitRecord>) -> Result<Self> {
        if index.len() != units.len() {
            return Err(Error::Integrity(format!(
                "index holds {} vectors but metadata has {} records",
                index.len(),
                units.len()
            )));
        }

        let metadata_sha256 = sha256_hex(&serde_json::to_vec_pretty(&units)?);
        Ok(Self {
            header: IndexHeader {
                format_version: FORMAT_VERSION,
                dim: index.dim(),
                embedder: embedder.to_string(),
                count: units.len(),
                metadata_sha256,
                built_at: Utc::now(),
            },
            index,
            units,
        })
    }

    pub fn header(&self) -> &IndexHeader {
        &self.header
    }

    pub fn units(&self) -> &[UnitRecord] {
        &self.units
    }

    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    pub fn dim(&self) -> usize {
        self.header.dim
    }

    /// Write both artifacts. The side-table goes first so a crash in between
    /// leaves a pair whose checksum no longer matches.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let metadata = serde_json::to_vec_pretty(&self.units)?;
        let mut header = self.header.clone();
        header.metadata_sha256 = sha256_hex(&metadata);

        let file = IndexFile {
            header,
            index: self.index.clone(),
        };
        let encoded = bincode::serialize(&file)
            .map_err(|e| Error::Serialization(format!("index encode: {}", e)))?;

        write_atomic(&dir.join(METADATA_FILE), &metadata)?;
        write_atomic(&dir.join(INDEX_FILE), &encoded)?;

        info!(
            dir = %dir.display(),
            units = self.units.len(),
            embedder = %self.header.embedder,
            "index artifacts written"
        );
        Ok(())
    }

    /// Load and cross-check both artifacts
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let index_path = dir.join(INDEX_FILE);
        let metadata_path = dir.join(METADATA_FILE);

        match (index_path.exists(), metadata_path.exists()) {
            (true, true) => {}
            (false, false) => {
                return Err(Error::NotFound(format!("no index artifacts in {}", dir.display())))
            }
            (true, false) => {
                return Err(Error::Integrity(format!(
                    "{} exists without {}",
                    INDEX_FILE, METADATA_FILE
                )))
            }
            (false, true) => {
                return Err(Error::Integrity(format!(
                    "{} exists without {}",
                    METADATA_FILE, INDEX_FILE
                )))
            }
        }

        let encoded = fs::read(&index_path)?;
        let file: IndexFile = bincode::deserialize(&encoded)
            .map_err(|e| Error::Integrity(format!("corrupt {}: {}", INDEX_FILE, e)))?;
        let header = file.header;

        if header.format_version != FORMAT_VERSION {
            return Err(Error::Integrity(format!(
                "unsupported index format version {}",
                header.format_version
            )));
        }

        let metadata = fs::read(&metadata_path)?;
        let checksum = sha256_hex(&metadata);
        if checksum != header.metadata_sha256 {
            return Err(Error::Integrity(format!(
                "{} does not belong to {} (checksum {} != {})",
                METADATA_FILE, INDEX_FILE, checksum, header.metadata_sha256
            )));
        }

        let units: Vec<UnitRecord> = serde_json::from_slice(&metadata)
            .map_err(|e| Error::Integrity(format!("corrupt {}: {}", METADATA_FILE, e)))?;

        if file.index.dim() != header.dim {
            return Err(Error::Integrity(format!(
                "header dimension {} but vectors have dimension {}",
                header.dim,
                file.index.dim()
            )));
        }
        if file.index.len() != header.count || units.len() != header.count {
            return Err(Error::Integrity(format!(
                "header count {} but index has {} vectors and metadata {} records",
                header.count,
                file.index.len(),
                units.len()
            )));
        }

        Ok(Self {
            header,
            index: file.index,
            units,
        })
    }

    /// The query embedder must be the one that produced the stored vectors
    pub fn verify_embedder(&self, embedder: &dyn Embedder) -> Result<()> {
        if embedder.dim() != self.header.dim {
            return Err(Error::InvalidDimension {
                expected: self.header.dim,
                actual: embedder.dim(),
            });
        }
        if embedder.name() != self.header.embedder {
            return Err(Error::Integrity(format!(
                "index built with embedder '{}' but service uses '{}'",
                self.header.embedder,
                embedder.name()
            )));
        }
        Ok(())
    }
}

impl SimilaritySource for SyllabusIndex {
    fn search(&self, query: &Vector, k: usize) -> Result<Vec<MatchItem>> {
        IndexedSource::new(&self.index, &self.units)?.search(query, k)
    }

    fn len(&self) -> usize {
        self.units.len()
    }
}
