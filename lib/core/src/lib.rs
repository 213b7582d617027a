//! # SyllabX Core
//!
//! Core library for the SyllabX program ranker.
//!
//! This crate provides the fundamental data structures:
//!
//! - [`ProgramKey`] - Composite `(college, program)` identity used for aggregation
//! - [`UnitRecord`] / [`MatchItem`] - Indexed syllabus units and retrieval hits
//! - [`Vector`] - Dense embedding with cosine helpers
//! - [`FlatIndex`] - Exact inner-product nearest-neighbor index
//! - [`HashingEmbedder`] - Deterministic text embedder
//! - [`chunk_text`] - Syllabus text chunking
//!
//! ## Example
//!
//! ```rust
//! use syllabx_core::{Embedder, FlatIndex, HashingEmbedder, VectorIndex};
//!
//! let embedder = HashingEmbedder::new(64).unwrap();
//! let mut index = FlatIndex::new(embedder.dim());
//!
//! let units = vec!["supervised learning".to_string(), "heat transfer".to_string()];
//! index.add(&embedder.encode_batch(&units).unwrap()).unwrap();
//!
//! let query = embedder.encode("machine learning").unwrap();
//! let hits = index.search(&query, 10).unwrap();
//! assert_eq!(hits.matches().count(), 2);
//! ```

pub mod chunk;
pub mod embedder;
pub mod error;
pub mod index;
pub mod key;
pub mod unit;
pub mod vector;

pub use chunk::{chunk_text, clean_text, ChunkConfig};
pub use embedder::{Embedder, HashingEmbedder, DEFAULT_EMBEDDING_DIM};
pub use error::{Error, Result};
pub use index::{FlatIndex, SearchHits, VectorIndex, MAX_SEARCH_K, NO_MATCH};
pub use key::ProgramKey;
pub use unit::{MatchItem, UnitRecord};
pub use vector::Vector;
