//! Similarity source adapter
//!
//! Wraps a raw [`VectorIndex`] and its metadata side-table: drops sentinel
//! slots and resolves ids to [`MatchItem`]s.

use syllabx_core::{Error, MatchItem, Result, UnitRecord, Vector, VectorIndex};

/// Nearest-unit retrieval for a query embedding
pub trait SimilaritySource: Send + Sync {
    /// At most `k` hits, strongest first. Fewer when the index is smaller than `k`.
    fn search(&self, query: &Vector, k: usize) -> Result<Vec<MatchItem>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Index plus side-table viewed as a [`SimilaritySource`]
pub struct IndexedSource<'a, I: VectorIndex + ?Sized> {
    index: &'a I,
    units: &'a [UnitRecord],
}

impl<'a, I: VectorIndex + ?Sized> IndexedSource<'a, I> {
    /// Fails when the side-table does not describe every indexed vector
    pub fn new(index: &'a I, units: &'a [UnitRecord]) -> Result<Self> {
        if index.len() != units.len() {
            return Err(Error::Integrity(format!(
                "index holds {} vectors but metadata has {} records",
                index.len(),
                units.len()
            )));
        }
        Ok(Self { index, units })
    }
}

impl<I: VectorIndex + ?Sized> SimilaritySource for IndexedSource<'_, I> {
    fn search(&self, query: &Vector, k: usize) -> Result<Vec<MatchItem>> {
        let hits = self.index.search(&query.normalized(), k)?;

        hits.matches()
            .map(|(id, similarity)| {
                self.units
                    .get(id)
                    .map(|record| MatchItem::from_record(record, similarity))
                    .ok_or_else(|| {
                        Error::Integrity(format!("index returned id {} absent from metadata", id))
                    })
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.units.len()
    }
}
