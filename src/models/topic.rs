//! Research topic: the immutable discovery request handed to the engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ProviderType;

/// How papers without an accessible PDF are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PdfStrategy {
    /// Keep every paper; PDF availability does not affect selection
    #[default]
    QualityFirst,
    /// Drop papers without an available PDF
    PdfRequired,
    /// Backfill low PDF availability with arXiv results
    ArxivSupplement,
}

/// What downstream consumers do with a paper that has no PDF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoPdfAction {
    /// Keep the paper and extract from its metadata and abstract
    #[default]
    MetadataOnly,
    /// Skip the paper entirely
    Skip,
    /// Keep the paper and flag it for manual PDF retrieval
    FlagForManual,
}

/// Publication window passed down to providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Timeframe {
    /// Papers published within the last `hours`
    Recent { hours: u32 },
    /// Papers published in or after `year`
    SinceYear { year: i32 },
    /// Papers published between two dates, inclusive
    DateRange { start: NaiveDate, end: NaiveDate },
}

/// Default arXiv supplement trigger threshold
pub const DEFAULT_SUPPLEMENT_THRESHOLD: f64 = 0.5;

/// Default maximum number of results requested from a provider
pub const DEFAULT_MAX_RESULTS: usize = 50;

/// A fully validated discovery request
///
/// Topics are produced by the config layer (see [`crate::config::TopicEntry`])
/// or by [`TopicBuilder`] and are read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    query: String,
    provider: ProviderType,
    auto_select: bool,
    min_citations: Option<u32>,
    benchmark: bool,
    quality_ranking: bool,
    min_quality_score: f64,
    pdf_strategy: PdfStrategy,
    no_pdf_action: NoPdfAction,
    supplement_threshold: f64,
    max_results: usize,
    timeframe: Option<Timeframe>,
}

impl Topic {
    /// Create a topic with default settings for the given query
    pub fn new(query: impl Into<String>) -> Self {
        TopicBuilder::new(query).build()
    }

    pub fn builder(query: impl Into<String>) -> TopicBuilder {
        TopicBuilder::new(query)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Explicitly preferred provider
    pub fn provider(&self) -> ProviderType {
        self.provider
    }

    pub fn auto_select(&self) -> bool {
        self.auto_select
    }

    pub fn min_citations(&self) -> Option<u32> {
        self.min_citations
    }

    pub fn benchmark(&self) -> bool {
        self.benchmark
    }

    pub fn quality_ranking(&self) -> bool {
        self.quality_ranking
    }

    pub fn min_quality_score(&self) -> f64 {
        self.min_quality_score
    }

    pub fn pdf_strategy(&self) -> PdfStrategy {
        self.pdf_strategy
    }

    pub fn no_pdf_action(&self) -> NoPdfAction {
        self.no_pdf_action
    }

    /// PDF availability rate below which the arXiv supplement runs
    pub fn supplement_threshold(&self) -> f64 {
        self.supplement_threshold
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub fn timeframe(&self) -> Option<Timeframe> {
        self.timeframe
    }

    /// Copy of this topic with auto-selection forced on
    pub(crate) fn with_auto_select(&self) -> Topic {
        Topic {
            auto_select: true,
            ..self.clone()
        }
    }

    /// Copy of this topic carrying cleaned query text
    pub(crate) fn with_query(&self, query: String) -> Topic {
        Topic {
            query,
            ..self.clone()
        }
    }
}

/// Builder for [`Topic`]
#[derive(Debug, Clone)]
pub struct TopicBuilder {
    topic: Topic,
}

impl TopicBuilder {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            topic: Topic {
                query: query.into(),
                provider: ProviderType::Arxiv,
                auto_select: true,
                min_citations: None,
                benchmark: false,
                quality_ranking: false,
                min_quality_score: 0.0,
                pdf_strategy: PdfStrategy::default(),
                no_pdf_action: NoPdfAction::default(),
                supplement_threshold: DEFAULT_SUPPLEMENT_THRESHOLD,
                max_results: DEFAULT_MAX_RESULTS,
                timeframe: None,
            },
        }
    }

    pub fn provider(mut self, provider: ProviderType) -> Self {
        self.topic.provider = provider;
        self
    }

    pub fn auto_select(mut self, auto_select: bool) -> Self {
        self.topic.auto_select = auto_select;
        self
    }

    pub fn min_citations(mut self, min_citations: u32) -> Self {
        self.topic.min_citations = Some(min_citations);
        self
    }

    pub fn benchmark(mut self, benchmark: bool) -> Self {
        self.topic.benchmark = benchmark;
        self
    }

    pub fn quality_ranking(mut self, enabled: bool) -> Self {
        self.topic.quality_ranking = enabled;
        self
    }

    pub fn min_quality_score(mut self, score: f64) -> Self {
        self.topic.min_quality_score = score;
        self
    }

    pub fn pdf_strategy(mut self, strategy: PdfStrategy) -> Self {
        self.topic.pdf_strategy = strategy;
        self
    }

    pub fn no_pdf_action(mut self, action: NoPdfAction) -> Self {
        self.topic.no_pdf_action = action;
        self
    }

    pub fn supplement_threshold(mut self, threshold: f64) -> Self {
        self.topic.supplement_threshold = threshold;
        self
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.topic.max_results = max;
        self
    }

    pub fn timeframe(mut self, timeframe: Timeframe) -> Self {
        self.topic.timeframe = Some(timeframe);
        self
    }

    pub fn build(self) -> Topic {
        self.topic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_defaults() {
        let topic = Topic::new("graph neural networks");
        assert_eq!(topic.query(), "graph neural networks");
        assert!(topic.auto_select());
        assert_eq!(topic.provider(), ProviderType::Arxiv);
        assert_eq!(topic.pdf_strategy(), PdfStrategy::QualityFirst);
        assert_eq!(topic.supplement_threshold(), 0.5);
        assert_eq!(topic.min_citations(), None);
        assert!(!topic.quality_ranking());
    }

    #[test]
    fn test_with_auto_select_leaves_original() {
        let topic = Topic::builder("x")
            .provider(ProviderType::SemanticScholar)
            .auto_select(false)
            .build();
        let auto = topic.with_auto_select();
        assert!(auto.auto_select());
        assert!(!topic.auto_select());
        assert_eq!(auto.provider(), ProviderType::SemanticScholar);
    }

    #[test]
    fn test_strategy_serde_names() {
        let strategy: PdfStrategy = serde_json::from_str("\"arxiv_supplement\"").unwrap();
        assert_eq!(strategy, PdfStrategy::ArxivSupplement);
        let action: NoPdfAction = serde_json::from_str("\"flag_for_manual\"").unwrap();
        assert_eq!(action, NoPdfAction::FlagForManual);
    }
}
