//! # SyllabX
//!
//! Explainable semantic ranking of academic programs against a free-text
//! interest.
//!
//! Syllabus documents are chunked into units and embedded into a flat
//! inner-product index. A query retrieves the closest units; per-program
//! evidence is filtered, blended and classified into a deterministic,
//! explainable ranking.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! syllabx build-index --data-dir ./data --index-dir ./vector_store
//! syllabx serve --http-port 8000
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use syllabx::prelude::*;
//!
//! let config = ContextConfig {
//!     index_dir: "./vector_store".into(),
//!     metadata_path: "./data/university_metadata.json".into(),
//!     policy: ScoringPolicy::default(),
//! };
//! let context = ServiceContext::load(config, Arc::new(HashingEmbedder::default())).unwrap();
//!
//! let ranking = context.rank("machine learning and optimization", Some(10)).unwrap();
//! for result in &ranking.results {
//!     println!("{} {:.4} {}", result.key, result.score, result.alignment_strength());
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - `syllabx-core` - Vectors, flat index, embedder, chunking, error type
//! - `syllabx-ranking` - Aggregation, normalization, classification, ranking
//! - `syllabx-storage` - Index artifacts, registry, metadata, ingestion, service context
//! - `syllabx-api` - REST API

// Re-export core types
pub use syllabx_core::{
    chunk_text, ChunkConfig, Embedder, Error, FlatIndex, HashingEmbedder, MatchItem, ProgramKey,
    Result, UnitRecord, Vector, VectorIndex,
};

// Re-export ranking
pub use syllabx_ranking::{
    AlignmentBands, AlignmentStrength, Normalization, RankResponse, RankedResult, Ranking,
    RankingEngine, ScoringPolicy, SimilarityScale, SimilaritySource,
};

// Re-export storage
pub use syllabx_storage::{
    ContextConfig, ContextHandle, IndexBuilder, Ingestor, ProgramMetadataStore, Registry,
    ServiceContext, SyllabusIndex,
};

// Re-export API
pub use syllabx_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ContextConfig, ContextHandle, Embedder, Error, HashingEmbedder, IndexBuilder, ProgramKey,
        RankedResult, RankingEngine, Registry, RestApi, Result, ScoringPolicy, ServiceContext,
        SimilaritySource, SyllabusIndex,
    };
}
