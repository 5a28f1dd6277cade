//! Provider selection heuristics.
//!
//! Rules are checked in order and the first match wins:
//!
//! 1. auto-selection disabled: the topic's explicit provider
//! 2. a minimum citation count: a citation-capable provider
//! 3. trending AI/ML vocabulary: a trending-capable provider
//! 4. arXiv vocabulary (categories, "preprint"): arXiv
//! 5. cross-disciplinary vocabulary: a broad-coverage provider with citations
//! 6. the configured preference order, then the first available provider

use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::discovery::DiscoveryError;
use crate::models::{ProviderType, Topic};
use crate::providers::{CapabilityMatrix, ProviderFeatures};

const TRENDING_TERMS: &[&str] = &[
    "llm",
    "llms",
    "large language model",
    "large language models",
    "transformer",
    "transformers",
    "rag",
    "retrieval augmented",
    "retrieval-augmented",
    "diffusion",
    "fine-tuning",
    "finetuning",
    "lora",
    "gpt",
    "prompt",
    "prompting",
    "multimodal",
    "agent",
    "agents",
    "instruction tuning",
    "rlhf",
    "vision language",
    "vision-language",
];

const ARXIV_TERMS: &[&str] = &[
    "arxiv",
    "preprint",
    "preprints",
    "cs.",
    "math.",
    "physics",
    "hep-",
    "astro-ph",
    "cond-mat",
    "quant-ph",
    "stat.ml",
    "gr-qc",
    "nlin",
    "q-bio",
    "q-fin",
    "eess",
];

const CROSS_DISCIPLINARY_TERMS: &[&str] = &[
    "medicine",
    "medical",
    "clinical",
    "psychology",
    "sociology",
    "economics",
    "law",
    "legal",
    "education",
    "public health",
    "epidemiology",
    "neuroscience",
    "biology",
    "political science",
    "history",
    "philosophy",
    "linguistics",
];

/// Which selection rule produced a choice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionRule {
    Explicit,
    MinCitations,
    Trending,
    ArxivTerms,
    CrossDisciplinary,
    PreferenceOrder,
    FirstAvailable,
}

impl fmt::Display for SelectionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SelectionRule::Explicit => "explicit provider requested (auto-select disabled)",
            SelectionRule::MinCitations => "minimum citation requirement needs citation data",
            SelectionRule::Trending => "query matches trending AI/ML terms",
            SelectionRule::ArxivTerms => "query matches arXiv-specific terms",
            SelectionRule::CrossDisciplinary => {
                "query matches cross-disciplinary terms needing broad coverage"
            }
            SelectionRule::PreferenceOrder => "first available provider in preference order",
            SelectionRule::FirstAvailable => "no preferred provider available, first available used",
        };
        f.write_str(text)
    }
}

/// A selection plus the rule that made it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recommendation {
    pub provider: ProviderType,
    pub rule: SelectionRule,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider.id(), self.rule)
    }
}

/// Term vocabulary compiled into one case-insensitive alternation
///
/// Terms match anywhere in the query, including inside longer words
/// ("physics" in "astrophysics").
#[derive(Debug, Clone)]
struct Vocabulary(Regex);

impl Vocabulary {
    fn new(terms: &[&str]) -> Result<Self, regex::Error> {
        let alternation = terms
            .iter()
            .map(|term| regex::escape(term))
            .collect::<Vec<_>>()
            .join("|");

        RegexBuilder::new(&alternation)
            .case_insensitive(true)
            .build()
            .map(Self)
    }

    fn matches(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

/// Picks the provider best suited to a topic
#[derive(Debug, Clone)]
pub struct ProviderSelector {
    capabilities: CapabilityMatrix,
    preference_order: Vec<ProviderType>,
    trending: Vocabulary,
    arxiv: Vocabulary,
    cross_disciplinary: Vocabulary,
}

impl ProviderSelector {
    pub fn new(
        capabilities: CapabilityMatrix,
        preference_order: Vec<ProviderType>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            capabilities,
            preference_order,
            trending: Vocabulary::new(TRENDING_TERMS)?,
            arxiv: Vocabulary::new(ARXIV_TERMS)?,
            cross_disciplinary: Vocabulary::new(CROSS_DISCIPLINARY_TERMS)?,
        })
    }

    pub fn capabilities(&self) -> &CapabilityMatrix {
        &self.capabilities
    }

    pub fn preference_order(&self) -> &[ProviderType] {
        &self.preference_order
    }

    /// Select a provider from `available`
    ///
    /// The effective citation requirement is the larger of `min_citations`
    /// and the topic's own.
    pub fn select(
        &self,
        topic: &Topic,
        available: &[ProviderType],
        min_citations: Option<u32>,
    ) -> Result<ProviderType, DiscoveryError> {
        self.recommend(topic, available, min_citations)
            .map(|r| r.provider)
    }

    /// Select a provider and report which rule fired
    pub fn recommend(
        &self,
        topic: &Topic,
        available: &[ProviderType],
        min_citations: Option<u32>,
    ) -> Result<Recommendation, DiscoveryError> {
        if available.is_empty() {
            return Err(DiscoveryError::NoProviderAvailable);
        }

        let pick = |provider, rule| Ok(Recommendation { provider, rule });

        if !topic.auto_select() {
            let requested = topic.provider();
            if available.contains(&requested) {
                return pick(requested, SelectionRule::Explicit);
            }
            return Err(DiscoveryError::RequestedProviderUnavailable {
                requested,
                available: available.to_vec(),
            });
        }

        let min_citations = min_citations
            .unwrap_or(0)
            .max(topic.min_citations().unwrap_or(0));
        if min_citations > 0 {
            if let Some(p) = self.first_with(available, ProviderFeatures::CITATIONS) {
                return pick(p, SelectionRule::MinCitations);
            }
        }

        let query = topic.query();

        if self.trending.matches(query) {
            if let Some(p) = self.first_with(available, ProviderFeatures::TRENDING) {
                return pick(p, SelectionRule::Trending);
            }
        }

        if self.arxiv.matches(query) && available.contains(&ProviderType::Arxiv) {
            return pick(ProviderType::Arxiv, SelectionRule::ArxivTerms);
        }

        if self.cross_disciplinary.matches(query) {
            let wanted = ProviderFeatures::CITATIONS | ProviderFeatures::BROAD_COVERAGE;
            if let Some(p) = self.first_with(available, wanted) {
                return pick(p, SelectionRule::CrossDisciplinary);
            }
        }

        if let Some(p) = self
            .preference_order
            .iter()
            .copied()
            .find(|p| available.contains(p))
        {
            return pick(p, SelectionRule::PreferenceOrder);
        }

        pick(available[0], SelectionRule::FirstAvailable)
    }

    /// Best available provider with all of `features`: preference order
    /// first, then input order
    fn first_with(
        &self,
        available: &[ProviderType],
        features: ProviderFeatures,
    ) -> Option<ProviderType> {
        let capable = |p: &ProviderType| self.capabilities.supports(*p, features);

        self.preference_order
            .iter()
            .copied()
            .filter(|p| available.contains(p))
            .find(capable)
            .or_else(|| available.iter().copied().find(capable))
    }

    /// Available providers ordered for fallback, excluding `exclude`
    pub fn fallback_order(
        &self,
        available: &[ProviderType],
        exclude: &[ProviderType],
    ) -> Vec<ProviderType> {
        let mut order: Vec<ProviderType> = self
            .preference_order
            .iter()
            .copied()
            .filter(|p| available.contains(p))
            .collect();
        for p in available {
            if !order.contains(p) {
                order.push(*p);
            }
        }
        order.retain(|p| !exclude.contains(p));
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ProviderType::{Arxiv, HuggingFace, SemanticScholar};

    fn selector() -> ProviderSelector {
        ProviderSelector::new(
            CapabilityMatrix::standard(),
            vec![Arxiv, SemanticScholar, HuggingFace],
        )
        .unwrap()
    }

    fn recommend(query: &str, available: &[ProviderType]) -> Recommendation {
        selector()
            .recommend(&Topic::new(query), available, None)
            .unwrap()
    }

    #[test]
    fn test_no_providers() {
        let err = selector().select(&Topic::new("x"), &[], None).unwrap_err();
        assert!(matches!(err, DiscoveryError::NoProviderAvailable));
    }

    #[test]
    fn test_explicit_provider() {
        let topic = Topic::builder("llm agents")
            .provider(SemanticScholar)
            .auto_select(false)
            .build();
        let s = selector();
        assert_eq!(
            s.select(&topic, &[Arxiv, SemanticScholar], None).unwrap(),
            SemanticScholar
        );

        let err = s.select(&topic, &[Arxiv, HuggingFace], None).unwrap_err();
        assert!(matches!(
            err,
            DiscoveryError::RequestedProviderUnavailable {
                requested: SemanticScholar,
                ..
            }
        ));
    }

    #[test]
    fn test_min_citations_picks_citation_provider() {
        let topic = Topic::builder("quantum error correction")
            .min_citations(10)
            .build();
        let s = selector();
        assert_eq!(
            s.select(&topic, &[Arxiv, SemanticScholar], None).unwrap(),
            SemanticScholar
        );

        let plain = Topic::new("quantum error correction");
        assert_eq!(
            s.recommend(&plain, &[Arxiv, SemanticScholar], Some(5)).unwrap().rule,
            SelectionRule::MinCitations
        );
        // Without a citation-capable provider the later rules decide
        assert_eq!(s.select(&topic, &[Arxiv, HuggingFace], None).unwrap(), Arxiv);
    }

    #[test]
    fn test_explicit_zero_keeps_topic_citation_requirement() {
        let topic = Topic::builder("quantum error correction")
            .min_citations(10)
            .build();
        let r = selector()
            .recommend(&topic, &[Arxiv, SemanticScholar], Some(0))
            .unwrap();
        assert_eq!((r.provider, r.rule), (SemanticScholar, SelectionRule::MinCitations));
    }

    #[test]
    fn test_trending_terms() {
        let r = recommend("LLM agents for code", &[Arxiv, SemanticScholar, HuggingFace]);
        assert_eq!(r.provider, HuggingFace);
        assert_eq!(r.rule, SelectionRule::Trending);

        let r = recommend("Fine-Tuning strategies", &[Arxiv, HuggingFace]);
        assert_eq!(r.provider, HuggingFace);
    }

    #[test]
    fn test_terms_match_inside_longer_words() {
        let all = [Arxiv, SemanticScholar, HuggingFace];

        let r = recommend("astrophysics of black holes", &all);
        assert_eq!((r.provider, r.rule), (Arxiv, SelectionRule::ArxivTerms));

        let r = recommend("agentic workflows", &all);
        assert_eq!((r.provider, r.rule), (HuggingFace, SelectionRule::Trending));

        let r = recommend("biomedical imaging", &[Arxiv, SemanticScholar]);
        assert_eq!((r.provider, r.rule), (SemanticScholar, SelectionRule::CrossDisciplinary));
    }

    #[test]
    fn test_arxiv_terms() {
        let r = recommend("cs.LG optimization", &[SemanticScholar, Arxiv]);
        assert_eq!(r.provider, Arxiv);
        assert_eq!(r.rule, SelectionRule::ArxivTerms);

        let r = recommend("hep-th dualities", &[SemanticScholar, Arxiv]);
        assert_eq!(r.provider, Arxiv);

        // arXiv terms without arXiv available fall through
        let r = recommend("recent preprint on graphs", &[HuggingFace, SemanticScholar]);
        assert_eq!(r.rule, SelectionRule::PreferenceOrder);
        assert_eq!(r.provider, SemanticScholar);
    }

    #[test]
    fn test_cross_disciplinary_terms() {
        let r = recommend("clinical outcomes of telehealth", &[Arxiv, SemanticScholar]);
        assert_eq!(r.provider, SemanticScholar);
        assert_eq!(r.rule, SelectionRule::CrossDisciplinary);

        let r = recommend("clinical outcomes of telehealth", &[Arxiv, HuggingFace]);
        assert_eq!(r.provider, Arxiv);
        assert_eq!(r.rule, SelectionRule::PreferenceOrder);
    }

    #[test]
    fn test_rule_priority() {
        // Trending beats arXiv terms
        let r = recommend("transformers preprint", &[Arxiv, HuggingFace]);
        assert_eq!(r.rule, SelectionRule::Trending);

        // arXiv terms beat cross-disciplinary terms
        let r = recommend("q-bio neuroscience", &[Arxiv, SemanticScholar]);
        assert_eq!(r.rule, SelectionRule::ArxivTerms);
    }

    #[test]
    fn test_preference_order_and_first_available() {
        let s = ProviderSelector::new(CapabilityMatrix::standard(), vec![HuggingFace, Arxiv]).unwrap();
        let topic = Topic::new("graph coloring");
        assert_eq!(s.select(&topic, &[Arxiv, HuggingFace], None).unwrap(), HuggingFace);

        let r = s.recommend(&topic, &[SemanticScholar], None).unwrap();
        assert_eq!(r.provider, SemanticScholar);
        assert_eq!(r.rule, SelectionRule::FirstAvailable);
    }

    #[test]
    fn test_recommendation_reason_names_rule() {
        let r = recommend("diffusion models", &[HuggingFace]);
        assert_eq!(r.to_string(), "huggingface: query matches trending AI/ML terms");
    }

    #[test]
    fn test_fallback_order() {
        let s = selector();
        assert_eq!(
            s.fallback_order(&[HuggingFace, SemanticScholar, Arxiv], &[Arxiv]),
            vec![SemanticScholar, HuggingFace]
        );
        let partial = ProviderSelector::new(CapabilityMatrix::standard(), vec![HuggingFace]).unwrap();
        assert_eq!(
            partial.fallback_order(&[Arxiv, SemanticScholar, HuggingFace], &[]),
            vec![HuggingFace, Arxiv, SemanticScholar]
        );
    }
}
