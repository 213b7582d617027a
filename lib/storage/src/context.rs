//! Shared, swappable service state
//!
//! A [`ServiceContext`] bundles everything a ranking request reads: the
//! embedder, the loaded index and the scoring engine. It is immutable; a
//! reload builds a fresh context and swaps it into the [`ContextHandle`] only
//! after it validated. Requests already holding the old `Arc` finish on it.

use crate::index_store::SyllabusIndex;
use crate::metadata::{ProgramMetadataStore, ProgramRecord};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use syllabx_core::{Embedder, Result};
use syllabx_ranking::{Ranking, RankingEngine, ScoringPolicy, SimilaritySource};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Directory holding the paired index artifacts
    pub index_dir: PathBuf,
    /// Program metadata file, read per request
    pub metadata_path: PathBuf,
    pub policy: ScoringPolicy,
}

/// Index summary for health checks
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextInfo {
    pub index_size: usize,
    pub embedder: String,
    pub dim: usize,
    pub built_at: DateTime<Utc>,
    pub loaded_at: DateTime<Utc>,
}

pub struct ServiceContext {
    config: ContextConfig,
    embedder: Arc<dyn Embedder>,
    index: SyllabusIndex,
    engine: RankingEngine,
    metadata: ProgramMetadataStore,
    loaded_at: DateTime<Utc>,
}

impl ServiceContext {
    /// Load and validate the index against `embedder`. Any integrity problem fails the load.
    pub fn load(config: ContextConfig, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let engine = RankingEngine::new(config.policy.clone())?;
        let index = SyllabusIndex::load(&config.index_dir)?;
        index.verify_embedder(embedder.as_ref())?;

        info!(
            units = index.len(),
            embedder = %embedder.name(),
            index_dir = %config.index_dir.display(),
            "service context loaded"
        );

        Ok(Self {
            metadata: ProgramMetadataStore::new(config.metadata_path.clone()),
            config,
            embedder,
            index,
            engine,
            loaded_at: Utc::now(),
        })
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn index(&self) -> &SyllabusIndex {
        &self.index
    }

    pub fn engine(&self) -> &RankingEngine {
        &self.engine
    }

    /// Rank programs for a free-text interest. A blank interest yields no results.
    pub fn rank(&self, interest: &str, limit: Option<usize>) -> Result<Ranking> {
        if interest.trim().is_empty() {
            debug!("blank interest, returning empty ranking");
            return Ok(self.engine.rank_matches(Vec::new(), limit));
        }
        self.engine
            .rank_interest(interest, self.embedder.as_ref(), &self.index, limit)
    }

    pub fn program_details(&self, college: Option<&str>, program: &str) -> Result<ProgramRecord> {
        self.metadata.lookup(college, program)
    }

    pub fn info(&self) -> ContextInfo {
        let header = self.index.header();
        ContextInfo {
            index_size: self.index.len(),
            embedder: header.embedder.clone(),
            dim: header.dim,
            built_at: header.built_at,
            loaded_at: self.loaded_at,
        }
    }
}

/// Current context behind a read-mostly lock
pub struct ContextHandle {
    current: RwLock<Arc<ServiceContext>>,
}

impl ContextHandle {
    pub fn new(context: ServiceContext) -> Self {
        Self {
            current: RwLock::new(Arc::new(context)),
        }
    }

    pub fn load(config: ContextConfig, embedder: Arc<dyn Embedder>) -> Result<Self> {
        Ok(Self::new(ServiceContext::load(config, embedder)?))
    }

    /// Snapshot for one request
    pub fn current(&self) -> Arc<ServiceContext> {
        self.current.read().clone()
    }

    /// Re-read the artifacts from disk. On failure the live context stays in place.
    pub fn reload(&self) -> Result<Arc<ServiceContext>> {
        let live = self.current();
        match ServiceContext::load(live.config.clone(), live.embedder.clone()) {
            Ok(fresh) => Ok(self.swap(fresh)),
            Err(e) => {
                warn!(error = %e, "reload rejected, keeping current index");
                Err(e)
            }
        }
    }

    /// Install `context` and return it
    pub fn swap(&self, context: ServiceContext) -> Arc<ServiceContext> {
        let fresh = Arc::new(context);
        *self.current.write() = fresh.clone();
        info!(units = fresh.index.len(), "service context swapped");
        fresh
    }
}
