//! Document ingestion and update checks
//!
//! New syllabus versions land under `raw_pdfs/` in the data directory and are
//! recorded in the registry. A document whose hash is already known for the
//! program only refreshes `last_checked`.

use crate::index_store::{sha256_hex, write_atomic};
use crate::registry::{RegisterOutcome, Registry, RegistryEntry};
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use syllabx_core::ProgramKey;
use tracing::{info, warn};

pub const RAW_DIR: &str = "raw_pdfs";

/// `<college>_<program>_<year>_<hash8>.<ext>`, lowercased, spaces as underscores
pub fn stored_file_name(key: &ProgramKey, academic_year: Option<&str>, hash: &str, ext: &str) -> String {
    let slug = |s: &str| s.trim().to_lowercase().replace(char::is_whitespace, "_");
    let mut parts = vec![slug(&key.college), slug(&key.program)];
    if let Some(year) = academic_year.filter(|y| !y.trim().is_empty()) {
        parts.push(slug(year));
    }
    parts.push(hash.chars().take(8).collect());
    format!("{}.{}", parts.join("_"), ext.trim_start_matches('.').to_lowercase())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ingested {
    pub outcome: RegisterOutcome,
    /// Registry path of the stored document, relative to the data directory
    pub file_path: String,
    pub hash: String,
}

/// Result of one update check over the registry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateReport {
    pub checked: usize,
    pub updated: Vec<ProgramKey>,
    pub unchanged: Vec<ProgramKey>,
    /// Active entries without a `source_url`
    pub no_source: Vec<ProgramKey>,
    pub failed: Vec<(ProgramKey, String)>,
}

impl UpdateReport {
    pub fn needs_rebuild(&self) -> bool {
        !self.updated.is_empty()
    }
}

pub struct Ingestor {
    data_dir: PathBuf,
}

impl Ingestor {
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Store `bytes` as a new version of `key` unless the same document is already registered
    #[allow(clippy::too_many_arguments)]
    pub fn ingest_bytes(
        &self,
        registry: &mut Registry,
        key: &ProgramKey,
        academic_year: Option<&str>,
        source_url: Option<&str>,
        bytes: &[u8],
        ext: &str,
        today: NaiveDate,
    ) -> Result<Ingested> {
        let hash = sha256_hex(bytes);

        if let Some(existing) = registry.find_by_hash(key, &hash) {
            let file_path = existing.file_path.clone();
            registry.register_version(self.entry(key, &file_path, &hash, academic_year, source_url), today);
            info!(program = %key, "document unchanged");
            return Ok(Ingested {
                outcome: RegisterOutcome::Unchanged,
                file_path,
                hash,
            });
        }

        let file_path = format!("{}/{}", RAW_DIR, stored_file_name(key, academic_year, &hash, ext));
        let target = self.data_dir.join(&file_path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        write_atomic(&target, bytes).with_context(|| format!("writing {}", target.display()))?;

        let outcome = registry.register_version(self.entry(key, &file_path, &hash, academic_year, source_url), today);
        info!(program = %key, file = %file_path, "new syllabus version registered");
        Ok(Ingested {
            outcome,
            file_path,
            hash,
        })
    }

    /// Ingest a local file; its extension is kept
    pub fn ingest_file(
        &self,
        registry: &mut Registry,
        key: &ProgramKey,
        academic_year: Option<&str>,
        source: &Path,
        today: NaiveDate,
    ) -> Result<Ingested> {
        let bytes = fs::read(source).with_context(|| format!("reading {}", source.display()))?;
        let ext = source.extension().and_then(|e| e.to_str()).unwrap_or("pdf");
        self.ingest_bytes(registry, key, academic_year, None, &bytes, ext, today)
    }

    /// Re-download every active entry with a `source_url` and register changed documents.
    /// A failing download is recorded and does not stop the others.
    pub async fn check_for_updates(
        &self,
        registry: &mut Registry,
        client: &reqwest::Client,
        today: NaiveDate,
    ) -> UpdateReport {
        let mut report = UpdateReport::default();
        let active: Vec<RegistryEntry> = registry.active_entries().into_iter().cloned().collect();

        for entry in active {
            let key = entry.key();
            let Some(url) = entry.source_url.clone() else {
                warn!(program = %key, "no source_url, skipping update check");
                report.no_source.push(key);
                continue;
            };

            report.checked += 1;
            info!(program = %key, %url, "checking for syllabus update");

            let bytes = match download(client, &url).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(program = %key, error = %e, "update check failed");
                    report.failed.push((key, e.to_string()));
                    continue;
                }
            };

            let ext = Path::new(&entry.file_path)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("pdf");
            match self.ingest_bytes(
                registry,
                &key,
                entry.academic_year.as_deref(),
                Some(&url),
                &bytes,
                ext,
                today,
            ) {
                Ok(ingested) if ingested.outcome == RegisterOutcome::Added => report.updated.push(key),
                Ok(_) => report.unchanged.push(key),
                Err(e) => {
                    warn!(program = %key, error = %e, "storing update failed");
                    report.failed.push((key, e.to_string()));
                }
            }
        }

        if report.needs_rebuild() {
            info!(updated = report.updated.len(), "updates detected, rebuild the index");
        } else {
            info!("all syllabi are up to date");
        }
        report
    }

    fn entry(
        &self,
        key: &ProgramKey,
        file_path: &str,
        hash: &str,
        academic_year: Option<&str>,
        source_url: Option<&str>,
    ) -> RegistryEntry {
        RegistryEntry {
            college: key.college.clone(),
            program: key.program.clone(),
            file_path: file_path.to_string(),
            hash: hash.to_string(),
            academic_year: academic_year.map(str::to_string),
            is_active: true,
            last_checked: None,
            source_url: source_url.map(str::to_string),
        }
    }
}

async fn download(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| anyhow!("Failed to download syllabus: {}", e))?;

    if !response.status().is_success() {
        return Err(anyhow!("Failed to download syllabus: HTTP {}", response.status()));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| anyhow!("Failed to read syllabus data: {}", e))?;
    Ok(bytes.to_vec())
}
