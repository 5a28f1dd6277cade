//! Topic definitions as written in configuration files.
//!
//! ```toml
//! [[topics]]
//! name = "agents"
//! query = "LLM agents tool use"
//! provider = "semantic_scholar"
//! auto_select = false
//! min_citations = 5
//! quality_ranking = true
//! min_quality_score = 40
//! pdf_strategy = "arxiv_supplement"
//! supplement_threshold = 0.6
//! max_results = 25
//!
//! [topics.timeframe]
//! type = "since_year"
//! year = 2023
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    NoPdfAction, PdfStrategy, ProviderType, Timeframe, Topic, UnknownProviderType,
    DEFAULT_MAX_RESULTS, DEFAULT_SUPPLEMENT_THRESHOLD,
};

/// Why a topic entry was rejected
#[derive(Debug, Error, PartialEq)]
pub enum TopicError {
    #[error("Topic query is empty")]
    EmptyQuery,

    #[error(transparent)]
    UnknownProvider(#[from] UnknownProviderType),

    #[error("min_quality_score must be within 0..=100 (got {0})")]
    MinQualityOutOfRange(f64),

    #[error("supplement_threshold must be within 0..=1 (got {0})")]
    ThresholdOutOfRange(f64),

    #[error("max_results must be greater than zero")]
    ZeroMaxResults,

    #[error("Invalid timeframe: {0}")]
    InvalidTimeframe(String),
}

/// A topic as written by the user, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicEntry {
    /// Label used in logs and reports; defaults to the query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub query: String,

    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_true")]
    pub auto_select: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_citations: Option<u32>,

    #[serde(default)]
    pub benchmark: bool,

    #[serde(default)]
    pub quality_ranking: bool,

    #[serde(default)]
    pub min_quality_score: f64,

    #[serde(default)]
    pub pdf_strategy: PdfStrategy,

    #[serde(default)]
    pub no_pdf_action: NoPdfAction,

    #[serde(default = "default_supplement_threshold")]
    pub supplement_threshold: f64,

    #[serde(default = "default_max_results")]
    pub max_results: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<Timeframe>,
}

fn default_provider() -> String {
    ProviderType::Arxiv.id().to_string()
}

fn default_true() -> bool {
    true
}

fn default_supplement_threshold() -> f64 {
    DEFAULT_SUPPLEMENT_THRESHOLD
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

impl TopicEntry {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            name: None,
            query: query.into(),
            provider: default_provider(),
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
        }
    }

    /// Display label for this entry
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.query)
    }

    /// Validate the entry into an immutable [`Topic`]
    pub fn validate(&self) -> Result<Topic, TopicError> {
        let query = self.query.trim();
        if query.is_empty() {
            return Err(TopicError::EmptyQuery);
        }

        let provider: ProviderType = self.provider.parse()?;

        if !(0.0..=100.0).contains(&self.min_quality_score) {
            return Err(TopicError::MinQualityOutOfRange(self.min_quality_score));
        }
        if !(0.0..=1.0).contains(&self.supplement_threshold) {
            return Err(TopicError::ThresholdOutOfRange(self.supplement_threshold));
        }
        if self.max_results == 0 {
            return Err(TopicError::ZeroMaxResults);
        }

        let mut builder = Topic::builder(query)
            .provider(provider)
            .auto_select(self.auto_select)
            .benchmark(self.benchmark)
            .quality_ranking(self.quality_ranking)
            .min_quality_score(self.min_quality_score)
            .pdf_strategy(self.pdf_strategy)
            .no_pdf_action(self.no_pdf_action)
            .supplement_threshold(self.supplement_threshold)
            .max_results(self.max_results);

        if let Some(min) = self.min_citations {
            builder = builder.min_citations(min);
        }
        if let Some(timeframe) = self.timeframe {
            validate_timeframe(timeframe)?;
            builder = builder.timeframe(timeframe);
        }

        Ok(builder.build())
    }
}

fn validate_timeframe(timeframe: Timeframe) -> Result<(), TopicError> {
    match timeframe {
        Timeframe::Recent { hours: 0 } => Err(TopicError::InvalidTimeframe(
            "recent window must be at least one hour".to_string(),
        )),
        Timeframe::DateRange { start, end } if start > end => Err(TopicError::InvalidTimeframe(
            format!("start {} is after end {}", start, end),
        )),
        _ => Ok(()),
    }
}

impl TryFrom<&TopicEntry> for Topic {
    type Error = TopicError;

    fn try_from(entry: &TopicEntry) -> Result<Self, Self::Error> {
        entry.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_validate_defaults() {
        let topic = TopicEntry::new("  graph neural networks ").validate().unwrap();
        assert_eq!(topic.query(), "graph neural networks");
        assert_eq!(topic.provider(), ProviderType::Arxiv);
        assert!(topic.auto_select());
        assert_eq!(topic.pdf_strategy(), PdfStrategy::QualityFirst);
        assert_eq!(topic.supplement_threshold(), 0.5);
        assert_eq!(topic.max_results(), 50);
    }

    #[test]
    fn test_validate_carries_fields() {
        let entry = TopicEntry {
            provider: "s2".to_string(),
            auto_select: false,
            min_citations: Some(10),
            quality_ranking: true,
            min_quality_score: 40.0,
            pdf_strategy: PdfStrategy::ArxivSupplement,
            supplement_threshold: 0.7,
            max_results: 20,
            ..TopicEntry::new("agents")
        };

        let topic = Topic::try_from(&entry).unwrap();
        assert_eq!(topic.provider(), ProviderType::SemanticScholar);
        assert!(!topic.auto_select());
        assert_eq!(topic.min_citations(), Some(10));
        assert!(topic.quality_ranking());
        assert_eq!(topic.min_quality_score(), 40.0);
        assert_eq!(topic.pdf_strategy(), PdfStrategy::ArxivSupplement);
        assert_eq!(topic.supplement_threshold(), 0.7);
        assert_eq!(topic.max_results(), 20);
    }

    #[test]
    fn test_validate_rejects_bad_entries() {
        assert_eq!(TopicEntry::new("   ").validate(), Err(TopicError::EmptyQuery));

        let unknown = TopicEntry {
            provider: "google_scholar".to_string(),
            ..TopicEntry::new("x")
        };
        assert_eq!(
            unknown.validate(),
            Err(TopicError::UnknownProvider(UnknownProviderType(
                "google_scholar".to_string()
            )))
        );

        let quality = TopicEntry {
            min_quality_score: 101.0,
            ..TopicEntry::new("x")
        };
        assert!(matches!(quality.validate(), Err(TopicError::MinQualityOutOfRange(_))));

        let threshold = TopicEntry {
            supplement_threshold: -0.1,
            ..TopicEntry::new("x")
        };
        assert!(matches!(threshold.validate(), Err(TopicError::ThresholdOutOfRange(_))));

        let zero = TopicEntry {
            max_results: 0,
            ..TopicEntry::new("x")
        };
        assert_eq!(zero.validate(), Err(TopicError::ZeroMaxResults));

        let range = TopicEntry {
            timeframe: Some(Timeframe::DateRange {
                start: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            }),
            ..TopicEntry::new("x")
        };
        assert!(matches!(range.validate(), Err(TopicError::InvalidTimeframe(_))));
    }

    #[test]
    fn test_deserialize_from_toml() {
        let entry: TopicEntry = toml::from_str(
            r#"
query = "diffusion models"
provider = "huggingface"
pdf_strategy = "pdf_required"

[timeframe]
type = "recent"
hours = 48
"#,
        )
        .unwrap();

        assert_eq!(entry.label(), "diffusion models");
        let topic = entry.validate().unwrap();
        assert_eq!(topic.provider(), ProviderType::HuggingFace);
        assert_eq!(topic.pdf_strategy(), PdfStrategy::PdfRequired);
        assert_eq!(topic.timeframe(), Some(Timeframe::Recent { hours: 48 }));
    }
}
