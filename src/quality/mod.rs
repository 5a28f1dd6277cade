//! Composite quality scoring for papers.
//!
//! A paper's score is a weighted sum of four components, each in `[0, 1]`:
//!
//! | Component    | Default weight | Based on                                   |
//! |--------------|----------------|--------------------------------------------|
//! | citation     | 0.40           | `log10(citations + 1) / 3` plus influential bonus |
//! | venue        | 0.30           | venue table points / 30                    |
//! | recency      | 0.20           | age tiers of the publication date          |
//! | completeness | 0.10           | abstract, authors, DOI present             |
//!
//! The sum is scaled to `0..=100`.

mod venue;

pub use venue::{
    VenueStore, VenueTable, VenueTableError, DEFAULT_VENUE_POINTS, MAX_VENUE_POINTS,
};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{non_empty, Paper};

/// Accepted deviation of the weight sum from 1.0
pub const WEIGHT_TOLERANCE: f64 = 0.01;

/// Cap on the bonus from influential citations
const MAX_INFLUENTIAL_BONUS: f64 = 0.1;

#[derive(Debug, Error, PartialEq)]
pub enum QualityError {
    #[error("Quality weights must sum to 1.0 (got {sum:.3})")]
    InvalidWeights { sum: f64 },
}

/// Component weights of the quality score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityWeights {
    pub citation: f64,
    pub venue: f64,
    pub recency: f64,
    pub completeness: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            citation: 0.40,
            venue: 0.30,
            recency: 0.20,
            completeness: 0.10,
        }
    }
}

impl QualityWeights {
    pub fn sum(&self) -> f64 {
        self.citation + self.venue + self.recency + self.completeness
    }

    /// Check that the weights sum to 1.0 within [`WEIGHT_TOLERANCE`]
    pub fn validate(&self) -> Result<(), QualityError> {
        let sum = self.sum();
        if !sum.is_finite() || (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(QualityError::InvalidWeights { sum });
        }
        Ok(())
    }
}

/// Per-component view of a paper's score
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub citation: f64,
    pub venue: f64,
    pub recency: f64,
    pub completeness: f64,
    pub total: f64,
}

/// Scores papers from citations, venue, recency and metadata completeness
///
/// Scoring is pure; the scorer can be shared across tasks.
#[derive(Debug, Clone)]
pub struct QualityScorer {
    weights: QualityWeights,
    venues: Arc<VenueStore>,
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self {
            weights: QualityWeights::default(),
            venues: Arc::new(VenueStore::default()),
        }
    }
}

impl QualityScorer {
    /// Create a scorer; fails if the weights do not sum to 1.0
    pub fn new(weights: QualityWeights, venues: VenueTable) -> Result<Self, QualityError> {
        Self::with_store(weights, Arc::new(VenueStore::new(venues)))
    }

    /// Create a scorer reading from a shared, reloadable venue store
    pub fn with_store(weights: QualityWeights, venues: Arc<VenueStore>) -> Result<Self, QualityError> {
        weights.validate()?;
        Ok(Self { weights, venues })
    }

    pub fn weights(&self) -> QualityWeights {
        self.weights
    }

    pub fn venue_store(&self) -> &Arc<VenueStore> {
        &self.venues
    }

    /// Score a paper against the current time
    pub fn score(&self, paper: &Paper) -> f64 {
        self.score_at(paper, Utc::now())
    }

    /// Score a paper as if it were `now`
    pub fn score_at(&self, paper: &Paper, now: DateTime<Utc>) -> f64 {
        self.breakdown_at(paper, now).total
    }

    pub fn breakdown(&self, paper: &Paper) -> ScoreBreakdown {
        self.breakdown_at(paper, Utc::now())
    }

    pub fn breakdown_at(&self, paper: &Paper, now: DateTime<Utc>) -> ScoreBreakdown {
        let citation = Self::citation_score(paper);
        let venue = self.venue_score(paper);
        let recency = Self::recency_score(paper, now);
        let completeness = Self::completeness_score(paper);

        let w = &self.weights;
        let weighted = w.citation * citation
            + w.venue * venue
            + w.recency * recency
            + w.completeness * completeness;

        ScoreBreakdown {
            citation,
            venue,
            recency,
            completeness,
            total: (weighted * 100.0).clamp(0.0, 100.0),
        }
    }

    /// Citation impact, log-scaled so 1000 citations saturate
    pub fn citation_score(paper: &Paper) -> f64 {
        let citations = paper.citation_count.unwrap_or(0);
        if citations == 0 {
            return 0.0;
        }

        let base = (f64::from(citations) + 1.0).log10() / 3.0;
        let bonus = (f64::from(paper.influential_citation_count.unwrap_or(0)) * 0.01)
            .min(MAX_INFLUENTIAL_BONUS);
        (base + bonus).min(1.0)
    }

    /// Venue reputation from the loaded venue table
    pub fn venue_score(&self, paper: &Paper) -> f64 {
        let points = self.venues.load_full().points(paper.venue.as_deref());
        (f64::from(points) / f64::from(MAX_VENUE_POINTS)).min(1.0)
    }

    /// Age tiers; missing or future dates are neutral
    pub fn recency_score(paper: &Paper, now: DateTime<Utc>) -> f64 {
        let Some(published) = paper.published else {
            return 0.5;
        };
        if published > now {
            return 0.5;
        }

        match (now - published).num_days() {
            d if d < 365 => 1.0,
            d if d < 730 => 0.75,
            d if d < 1825 => 0.5,
            _ => 0.25,
        }
    }

    /// Presence of abstract (0.5), authors (0.3) and DOI (0.2)
    pub fn completeness_score(paper: &Paper) -> f64 {
        let mut score = 0.0;
        if non_empty(&paper.r#abstract).is_some() {
            score += 0.5;
        }
        if !paper.authors.is_empty() {
            score += 0.3;
        }
        if non_empty(&paper.doi).is_some() {
            score += 0.2;
        }
        score
    }

    /// Score, filter and sort papers, best first
    ///
    /// Works on copies; the caller's papers are left untouched. Papers below
    /// `min_score` are dropped and equal scores keep their input order.
    pub fn rank_papers(&self, papers: &[Paper], min_score: f64) -> Vec<Paper> {
        self.rank_papers_at(papers, min_score, Utc::now())
    }

    pub fn rank_papers_at(&self, papers: &[Paper], min_score: f64, now: DateTime<Utc>) -> Vec<Paper> {
        let mut ranked: Vec<Paper> = papers
            .iter()
            .cloned()
            .map(|mut paper| {
                paper.quality_score = Some(self.score_at(&paper, now));
                paper
            })
            .filter(|paper| paper.quality_score.unwrap_or(0.0) >= min_score)
            .collect();

        ranked.sort_by(|a, b| {
            let a = a.quality_score.unwrap_or(0.0);
            let b = b.quality_score.unwrap_or(0.0);
            b.total_cmp(&a)
        });

        tracing::debug!(
            input = papers.len(),
            kept = ranked.len(),
            min_score,
            "Ranked papers by quality"
        );
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Author, PaperBuilder, ProviderType};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn cited(citations: u32) -> Paper {
        PaperBuilder::new("Paper", ProviderType::SemanticScholar)
            .citations(citations)
            .build()
    }

    fn scorer() -> QualityScorer {
        QualityScorer::new(QualityWeights::default(), VenueTable::bundled()).unwrap()
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        assert!(QualityWeights::default().validate().is_ok());

        let within = QualityWeights {
            citation: 0.405,
            ..QualityWeights::default()
        };
        assert!(within.validate().is_ok());

        let off = QualityWeights {
            citation: 0.5,
            ..QualityWeights::default()
        };
        assert!(matches!(
            QualityScorer::new(off, VenueTable::empty()),
            Err(QualityError::InvalidWeights { .. })
        ));
    }

    #[test]
    fn test_citation_component() {
        let expected = [(0, 0.0), (10, 0.35), (100, 0.67), (1000, 1.0)];
        for (citations, score) in expected {
            let got = QualityScorer::citation_score(&cited(citations));
            assert!((got - score).abs() <= 0.02, "{} citations scored {}", citations, got);
        }

        let one = QualityScorer::citation_score(&cited(1));
        assert!(one > 0.0 && one < 0.2);
    }

    #[test]
    fn test_influential_bonus_is_capped() {
        let paper = PaperBuilder::new("P", ProviderType::SemanticScholar)
            .citations(10)
            .influential_citations(500)
            .build();
        let base = QualityScorer::citation_score(&cited(10));
        let boosted = QualityScorer::citation_score(&paper);
        assert!((boosted - base - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_venue_component() {
        let scorer = scorer();
        let neurips = PaperBuilder::new("P", ProviderType::Arxiv)
            .venue("NeurIPS 2024")
            .build();
        assert_eq!(scorer.venue_score(&neurips), 1.0);

        let blank = PaperBuilder::new("P", ProviderType::Arxiv).venue("").build();
        assert!((scorer.venue_score(&blank) - 0.5).abs() < 1e-9);
        assert!((scorer.venue_score(&Paper::new("P", ProviderType::Arxiv)) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_recency_tiers() {
        let at = |days: i64| {
            let paper = PaperBuilder::new("P", ProviderType::Arxiv)
                .published(now() - chrono::Duration::days(days))
                .build();
            QualityScorer::recency_score(&paper, now())
        };

        assert_eq!(at(0), 1.0);
        assert_eq!(at(364), 1.0);
        assert_eq!(at(365), 0.75);
        assert_eq!(at(729), 0.75);
        assert_eq!(at(730), 0.5);
        assert_eq!(at(1824), 0.5);
        assert_eq!(at(1825), 0.25);
        assert_eq!(at(-10), 0.5);
        assert_eq!(
            QualityScorer::recency_score(&Paper::new("P", ProviderType::Arxiv), now()),
            0.5
        );
    }

    #[test]
    fn test_completeness_component() {
        let bare = Paper::new("P", ProviderType::Arxiv);
        assert_eq!(QualityScorer::completeness_score(&bare), 0.0);

        let whitespace = PaperBuilder::new("P", ProviderType::Arxiv)
            .abstract_text("   ")
            .doi(" ")
            .build();
        assert_eq!(QualityScorer::completeness_score(&whitespace), 0.0);

        let full = PaperBuilder::new("P", ProviderType::Arxiv)
            .abstract_text("Abstract")
            .author(Author::new("A"))
            .doi("10.1/x")
            .build();
        assert!((QualityScorer::completeness_score(&full) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_bounds_and_monotonicity() {
        let scorer = scorer();
        let mut previous = 0.0;
        for citations in [0, 1, 5, 10, 50, 100, 1000, 10_000, u32::MAX] {
            let score = scorer.score_at(&cited(citations), now());
            assert!((0.0..=100.0).contains(&score));
            assert!(score >= previous);
            previous = score;
        }
    }

    #[test]
    fn test_rank_papers_sorts_filters_and_keeps_input() {
        let scorer = scorer();
        let papers = vec![
            PaperBuilder::new("low", ProviderType::Arxiv).paper_id("a").build(),
            PaperBuilder::new("high", ProviderType::SemanticScholar)
                .paper_id("b")
                .citations(1000)
                .venue("NeurIPS")
                .build(),
            PaperBuilder::new("low twin", ProviderType::Arxiv).paper_id("c").build(),
        ];
        let snapshot = papers.clone();

        let ranked = scorer.rank_papers_at(&papers, 0.0, now());
        let ids: Vec<_> = ranked.iter().filter_map(|p| p.paper_id.as_deref()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert!(ranked.iter().all(|p| p.quality_score.is_some()));
        assert_eq!(papers, snapshot);

        let filtered = scorer.rank_papers_at(&papers, 50.0, now());
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].paper_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_rank_empty() {
        assert!(scorer().rank_papers(&[], 0.0).is_empty());
    }
}
