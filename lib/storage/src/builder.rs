//! Offline index build
//!
//! Active registry entries → source text → chunks → embeddings → paired
//! artifacts. Reading and embedding run in parallel with rayon; output order
//! follows the registry's key order so identical inputs give identical files.
//!
//! Sources are plain text. A PDF is indexed through a sibling text export
//! (`syllabus.pdf` → `syllabus.txt`) when one exists; a binary file without a
//! text export is skipped.

use crate::index_store::SyllabusIndex;
use crate::registry::{Registry, RegistryEntry};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use syllabx_core::{
    chunk_text, ChunkConfig, Embedder, Error, FlatIndex, ProgramKey, Result, UnitRecord, Vector, VectorIndex,
};
use tracing::{info, warn};

/// What a build did, per program
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub programs_indexed: usize,
    pub units_indexed: usize,
    /// Programs left out of the index, with the reason
    pub skipped: Vec<(ProgramKey, String)>,
    /// Keys with more than one active registry entry
    pub conflicts: Vec<ProgramKey>,
}

pub struct IndexBuilder<'a> {
    embedder: &'a dyn Embedder,
    chunking: ChunkConfig,
    data_dir: PathBuf,
}

impl<'a> IndexBuilder<'a> {
    /// `data_dir` is the root registry file paths are relative to
    pub fn new<P: Into<PathBuf>>(embedder: &'a dyn Embedder, data_dir: P) -> Self {
        Self {
            embedder,
            chunking: ChunkConfig::default(),
            data_dir: data_dir.into(),
        }
    }

    pub fn with_chunking(mut self, chunking: ChunkConfig) -> Self {
        self.chunking = chunking;
        self
    }

    pub fn build(&self, registry: &Registry) -> Result<(SyllabusIndex, BuildReport)> {
        let mut report = BuildReport {
            conflicts: registry.integrity_violations().into_iter().map(|c| c.key).collect(),
            ..BuildReport::default()
        };

        let entries = registry.active_entries();
        let loaded: Vec<(ProgramKey, std::result::Result<Vec<(String, Vector)>, String>)> = entries
            .par_iter()
            .map(|entry| (entry.key(), self.load_program(entry)))
            .collect();

        let mut units = Vec::new();
        let mut vectors = Vec::new();
        for ((key, embedded), entry) in loaded.into_iter().zip(&entries) {
            match embedded {
                Ok(embedded) => {
                    info!(program = %key, chunks = embedded.len(), "processed syllabus");
                    report.programs_indexed += 1;
                    for (chunk, vector) in embedded {
                        units.push(UnitRecord::new(&key, chunk, Some(entry.file_path.clone())));
                        vectors.push(vector);
                    }
                }
                Err(reason) => {
                    warn!(program = %key, file = %entry.file_path, %reason, "skipping program");
                    report.skipped.push((key, reason));
                }
            }
        }

        if units.is_empty() {
            return Err(Error::NotFound("no embeddings generated: no usable syllabus text".to_string()));
        }

        let mut index = FlatIndex::with_capacity(self.embedder.dim(), vectors.len());
        index.add(&vectors)?;
        report.units_indexed = units.len();

        let index = SyllabusIndex::new(self.embedder.name(), index, units)?;
        Ok((index, report))
    }

    /// Build and write both artifacts into `index_dir`. Nothing is written on failure.
    pub fn build_and_save<P: AsRef<Path>>(&self, registry: &Registry, index_dir: P) -> Result<BuildReport> {
        let (index, report) = self.build(registry)?;
        index.save(index_dir)?;
        info!(
            programs = report.programs_indexed,
            units = report.units_indexed,
            skipped = report.skipped.len(),
            "syllabus index built"
        );
        Ok(report)
    }

    /// Read, chunk and embed one program. Any failure skips the whole program.
    fn load_program(&self, entry: &RegistryEntry) -> std::result::Result<Vec<(String, Vector)>, String> {
        let path = self.data_dir.join(&entry.file_path);
        let text = read_source_text(&path)?;
        let chunks = chunk_text(&text, &self.chunking);
        if chunks.is_empty() {
            return Err("no chunks survived after cleaning".to_string());
        }

        let dim = self.embedder.dim();
        chunks
            .into_iter()
            .map(|chunk| match self.embedder.encode(&chunk) {
                Ok(vector) if vector.dim() == dim => Ok((chunk, vector)),
                Ok(vector) => Err(format!("embedder returned dimension {}, expected {}", vector.dim(), dim)),
                Err(e) => Err(e.to_string()),
            })
            .collect()
    }
}

fn read_source_text(path: &Path) -> std::result::Result<String, String> {
    let export = path.with_extension("txt");
    let source = if export.exists() { export } else { path.to_path_buf() };

    if !source.exists() {
        return Err(format!("file not found: {}", path.display()));
    }
    let bytes = fs::read(&source).map_err(|e| format!("unreadable {}: {}", source.display(), e))?;
    String::from_utf8(bytes).map_err(|_| format!("no text layer in {}", source.display()))
}
