//! # SyllabX Ranking
//!
//! Turns raw nearest-neighbor hits over syllabus units into an explainable,
//! deterministic ranking of academic programs.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Similarity │────>│  Aggregator │────>│ Normalizer  │
//! │   Source    │     │ (floor, N,  │     │ (optional)  │
//! └─────────────┘     │  blend)     │     └─────────────┘
//!                     └─────────────┘            │
//!                      ┌─────────────┐           │
//!                      │ Classifier  │<──────────┘
//!                      └─────────────┘
//!                             │
//!                      ┌─────────────┐
//!                      │   Ranker    │
//!                      └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use syllabx_core::{MatchItem, ProgramKey};
//! use syllabx_ranking::{RankingEngine, ScoringPolicy};
//!
//! let engine = RankingEngine::new(ScoringPolicy::default()).unwrap();
//! let key = ProgramKey::new("IIT Delhi", "M.Tech AI");
//! let hits = vec![
//!     MatchItem::new(key.clone(), "Neural networks", None, 0.6),
//!     MatchItem::new(key.clone(), "Optimization", None, 0.5),
//!     MatchItem::new(key, "Institute history", None, 0.2),
//! ];
//!
//! let ranking = engine.rank_matches(hits, None);
//! assert_eq!(ranking.results[0].score, 0.5682);
//! ```

pub mod aggregate;
pub mod classify;
pub mod engine;
pub mod explain;
pub mod normalize;
pub mod policy;
pub mod rank;
pub mod source;

pub use aggregate::{blend, group_matches, Aggregator, BlendedScore, ProgramAggregate, ProgramScore};
pub use classify::AlignmentStrength;
pub use engine::{Ranking, RankingEngine};
pub use explain::{
    round4, Explainability, RankResponse, RankedResult, RankingStats, ResultSummary, TopUnit,
};
pub use normalize::min_max;
pub use policy::{
    AlignmentBands, Normalization, ScoringPolicy, SimilarityScale, DEFAULT_TOP_K, MAX_TOP_UNITS,
};
pub use rank::Ranker;
pub use source::{IndexedSource, SimilaritySource};
