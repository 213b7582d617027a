//! Query → ranked programs
//!
//! One call runs the whole pipeline synchronously and owns all of its
//! intermediate state: embed → search → aggregate → (normalize) → classify → rank.

use crate::aggregate::{group_matches, Aggregator, ProgramScore};
use crate::explain::{round4, Explainability, RankedResult, RankingStats};
use crate::normalize::min_max;
use crate::policy::{Normalization, ScoringPolicy};
use crate::rank::Ranker;
use crate::source::SimilaritySource;
use syllabx_core::{Embedder, MatchItem, Result};
use tracing::debug;

/// Output of one ranking call
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub results: Vec<RankedResult>,
    pub stats: RankingStats,
}

#[derive(Debug, Clone)]
pub struct RankingEngine {
    policy: ScoringPolicy,
}

impl RankingEngine {
    pub fn new(policy: ScoringPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Embed `interest`, retrieve `top_k` units and rank the programs they belong to
    pub fn rank_interest(
        &self,
        interest: &str,
        embedder: &dyn Embedder,
        source: &dyn SimilaritySource,
        limit: Option<usize>,
    ) -> Result<Ranking> {
        let query = embedder.encode(interest)?;
        let matches = source.search(&query, self.policy.top_k)?;
        debug!(hits = matches.len(), top_k = self.policy.top_k, "retrieved candidate units");
        Ok(self.rank_matches(matches, limit))
    }

    /// Rank already-retrieved hits. Never fails: no survivors is an empty ranking.
    pub fn rank_matches(&self, matches: Vec<MatchItem>, limit: Option<usize>) -> Ranking {
        let candidates_count = matches.len();
        let groups = group_matches(matches, self.policy.scale);
        let scores = Aggregator::new(&self.policy).aggregate(&groups);
        let programs_scored = scores.len();

        let raw: Vec<f64> = scores.iter().map(|s| s.blend.raw).collect();
        let finals = match self.policy.normalization {
            Normalization::None => raw,
            Normalization::MinMax => min_max(&raw),
        };

        let results: Vec<RankedResult> = scores
            .into_iter()
            .zip(finals)
            .map(|(score, final_score)| self.to_ranked(score, final_score))
            .collect();
        let results = Ranker::new(limit).rank(results);

        let stats = RankingStats {
            candidates_count,
            programs_matched: groups.len(),
            programs_scored,
            results_count: results.len(),
            best_score: results.first().map(|r| r.score),
        };
        debug!(?stats, "ranking complete");

        Ranking { results, stats }
    }

    fn to_ranked(&self, score: ProgramScore, final_score: f64) -> RankedResult {
        let final_score = round4(final_score);
        let mut top_units = score.top_units;
        for unit in &mut top_units {
            unit.similarity = round4(unit.similarity);
        }

        RankedResult {
            key: score.key,
            score: final_score,
            explainability: Explainability {
                average_similarity: round4(score.blend.average),
                weighted_similarity: round4(score.blend.weighted),
                peak_similarity: round4(score.blend.peak),
                raw_score: round4(score.blend.raw),
                matched_unit_count: score.matched_unit_count,
                alignment_strength: self.policy.bands.classify(final_score),
            },
            syllabus_pdf: score.file_path,
            top_units,
        }
    }
}
