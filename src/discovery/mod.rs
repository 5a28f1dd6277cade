//! Discovery engine: provider selection, execution and post-processing.
//!
//! A request moves through these stages:
//!
//! ```text
//! select provider -> execute -> (fallback -> execute)* -> post-process
//! ```
//!
//! In benchmark mode every available provider is queried concurrently and
//! the successful results are merged instead. Post-processing applies the
//! arXiv supplement, the `pdf_required` filter and quality ranking, in that
//! order.

pub mod selector;

pub use selector::{ProviderSelector, Recommendation, SelectionRule};

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use thiserror::Error;
use tokio::time::timeout;

use crate::config::{Config, ConfigError};
use crate::models::{
    DiscoveryOutcome, Paper, PdfStrategy, ProviderComparison, ProviderMetrics, ProviderType,
    Topic, UnknownProviderType,
};
use crate::providers::{CapabilityMatrix, Provider, ProviderError, ProviderRegistry};
use crate::quality::QualityScorer;
use crate::utils::merge_unique;

/// Default time allowed for a single provider call
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

fn join_ids(providers: &[ProviderType]) -> String {
    if providers.is_empty() {
        return "none".to_string();
    }
    providers
        .iter()
        .map(|p| p.id())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors surfaced by the discovery engine
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("No search provider is available")]
    NoProviderAvailable,

    #[error(
        "Requested provider '{requested}' is unavailable (available: {})",
        join_ids(.available)
    )]
    RequestedProviderUnavailable {
        requested: ProviderType,
        available: Vec<ProviderType>,
    },

    #[error(transparent)]
    UnknownProviderType(#[from] UnknownProviderType),

    /// A provider failed and no fallback was attempted
    #[error("Provider '{provider}' failed: {source}")]
    Provider {
        provider: ProviderType,
        #[source]
        source: ProviderError,
    },

    #[error("All providers failed (tried: {}); last error: {last_error}", join_ids(.attempted))]
    AllProvidersFailed {
        attempted: Vec<ProviderType>,
        last_error: ProviderError,
    },
}

impl DiscoveryError {
    /// Configuration or programmer errors that no retry can fix
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DiscoveryError::NoProviderAvailable
                | DiscoveryError::RequestedProviderUnavailable { .. }
                | DiscoveryError::UnknownProviderType(_)
        )
    }

    /// Failures reported by a provider backend
    pub fn is_api_error(&self) -> bool {
        matches!(
            self,
            DiscoveryError::Provider { .. } | DiscoveryError::AllProvidersFailed { .. }
        )
    }
}

/// The discovery orchestrator
#[derive(Debug, Clone)]
pub struct Discovery {
    registry: ProviderRegistry,
    selector: ProviderSelector,
    scorer: QualityScorer,
    provider_timeout: Duration,
    fallback_enabled: bool,
    benchmark_mode: bool,
}

impl Discovery {
    /// Create an orchestrator with fallback and benchmark mode disabled
    pub fn new(registry: ProviderRegistry, selector: ProviderSelector, scorer: QualityScorer) -> Self {
        Self {
            registry,
            selector,
            scorer,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            fallback_enabled: false,
            benchmark_mode: false,
        }
    }

    /// Build the orchestrator and its built-in providers from configuration
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let registry = ProviderRegistry::from_config(config)?;
        Self::with_registry(config, registry)
    }

    /// Build the orchestrator from configuration around an existing registry
    pub fn with_registry(config: &Config, registry: ProviderRegistry) -> Result<Self, ConfigError> {
        let selector = ProviderSelector::new(
            CapabilityMatrix::standard(),
            config.discovery.preference_order()?,
        )?;
        let scorer = config.quality.scorer()?;

        Ok(Self::new(registry, selector, scorer)
            .with_timeout(config.discovery.provider_timeout())
            .with_fallback(config.discovery.fallback_enabled)
            .with_benchmark_mode(config.discovery.benchmark_mode))
    }

    pub fn with_timeout(mut self, provider_timeout: Duration) -> Self {
        self.provider_timeout = provider_timeout;
        self
    }

    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_enabled = enabled;
        self
    }

    /// Query every available provider for every topic
    pub fn with_benchmark_mode(mut self, enabled: bool) -> Self {
        self.benchmark_mode = enabled;
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn selector(&self) -> &ProviderSelector {
        &self.selector
    }

    pub fn scorer(&self) -> &QualityScorer {
        &self.scorer
    }

    /// Providers that can be queried right now, in registration order
    pub fn available_providers(&self) -> Vec<ProviderType> {
        self.registry.available_types()
    }

    /// Which provider a topic would be routed to, and why
    pub fn recommend(&self, topic: &Topic) -> Result<Recommendation, DiscoveryError> {
        self.selector
            .recommend(topic, &self.available_providers(), None)
    }

    /// Discover papers for a topic
    pub async fn discover(&self, topic: &Topic) -> Result<Vec<Paper>, DiscoveryError> {
        self.discover_with_metrics(topic).await.map(|o| o.papers)
    }

    /// Discover papers and report per-provider metrics
    pub async fn discover_with_metrics(&self, topic: &Topic) -> Result<DiscoveryOutcome, DiscoveryError> {
        self.check_requested_provider(topic)?;

        if topic.benchmark() || self.benchmark_mode {
            return self.benchmark(topic).await;
        }

        let available = self.available_providers();
        let primary = self.resolve_provider(topic, &available)?;
        tracing::info!(provider = %primary, query = topic.query(), "Selected provider");

        let Attempt {
            provider,
            papers,
            mut metrics,
            attempted,
        } = self.execute(topic, primary, &available).await?;

        let (papers, supplemented) = self
            .supplement(topic, papers, &attempted, &mut metrics)
            .await;
        let papers = self.post_process(topic, papers);

        tracing::info!(
            provider = %provider,
            count = papers.len(),
            supplemented,
            "Discovery complete"
        );

        Ok(DiscoveryOutcome {
            papers,
            provider: Some(provider),
            metrics,
            comparison: None,
            supplemented,
        })
    }

    /// Query every available provider concurrently and merge the results
    ///
    /// A failing provider is recorded in the metrics and does not affect the
    /// others; the request fails only when every provider fails.
    pub async fn benchmark(&self, topic: &Topic) -> Result<DiscoveryOutcome, DiscoveryError> {
        self.check_requested_provider(topic)?;

        let providers: Vec<Arc<dyn Provider>> = self
            .registry
            .all()
            .filter(|p| p.is_available())
            .cloned()
            .collect();
        if providers.is_empty() {
            return Err(DiscoveryError::NoProviderAvailable);
        }

        tracing::info!(
            providers = %join_ids(&providers.iter().map(|p| p.provider_type()).collect::<Vec<_>>()),
            query = topic.query(),
            "Running benchmark"
        );

        let (types, handles): (Vec<ProviderType>, Vec<_>) = providers
            .iter()
            .map(|provider| {
                let provider = Arc::clone(provider);
                let topic = topic.clone();
                let limit = self.provider_timeout;
                let provider_type = provider.provider_type();
                let handle =
                    tokio::spawn(async move { query_provider(provider.as_ref(), &topic, limit).await });
                (provider_type, handle)
            })
            .unzip();

        // join_all yields in registration order, which keeps the merge deterministic
        let joined = join_all(handles).await;
        let mut metrics = Vec::with_capacity(joined.len());
        let mut merged = Vec::new();
        let mut last_error = None;

        for (provider_type, joined) in types.into_iter().zip(joined) {
            let (result, metric) = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    let error = ProviderError::Api(format!("search task panicked: {}", e));
                    let metric = ProviderMetrics::failure(provider_type, Duration::ZERO, &error);
                    (Err(error), metric)
                }
            };
            metrics.push(metric);

            match result {
                Ok(papers) => {
                    let (all, _) = merge_unique(merged, papers);
                    merged = all;
                }
                Err(error) => {
                    tracing::warn!(provider = %provider_type, error = %error, "Benchmark provider failed");
                    last_error = Some(error);
                }
            }
        }

        if metrics.iter().all(|m| !m.success) {
            return Err(DiscoveryError::AllProvidersFailed {
                attempted: metrics.iter().map(|m| m.provider).collect(),
                last_error: last_error
                    .unwrap_or_else(|| ProviderError::Api("no provider answered".to_string())),
            });
        }

        let comparison = ProviderComparison::from_metrics(metrics.clone(), merged.len());
        tracing::info!(
            total_unique = comparison.total_unique_papers,
            overlap = comparison.overlap_count,
            fastest = ?comparison.fastest_provider,
            most_results = ?comparison.most_results_provider,
            "Benchmark complete"
        );

        let queried: Vec<ProviderType> = metrics.iter().map(|m| m.provider).collect();
        let (papers, supplemented) = self.supplement(topic, merged, &queried, &mut metrics).await;
        let papers = self.post_process(topic, papers);

        Ok(DiscoveryOutcome {
            papers,
            provider: None,
            metrics,
            comparison: Some(comparison),
            supplemented,
        })
    }

    /// An explicit provider must be registered, in every mode
    fn check_requested_provider(&self, topic: &Topic) -> Result<(), DiscoveryError> {
        if !topic.auto_select() && !self.registry.has(topic.provider()) {
            return Err(UnknownProviderType(topic.provider().id().to_string()).into());
        }
        Ok(())
    }

    /// Resolve the primary provider for a non-benchmark request
    fn resolve_provider(
        &self,
        topic: &Topic,
        available: &[ProviderType],
    ) -> Result<ProviderType, DiscoveryError> {
        match self.selector.select(topic, available, None) {
            Err(DiscoveryError::RequestedProviderUnavailable { requested, .. })
                if self.fallback_enabled =>
            {
                tracing::warn!(
                    requested = %requested,
                    "Requested provider unavailable, selecting another"
                );
                self.selector.select(&topic.with_auto_select(), available, None)
            }
            other => other,
        }
    }

    /// Run the primary provider, hopping to the next one on failure when
    /// fallback is enabled
    ///
    /// Each provider is tried at most once.
    async fn execute(
        &self,
        topic: &Topic,
        primary: ProviderType,
        available: &[ProviderType],
    ) -> Result<Attempt, DiscoveryError> {
        let mut metrics = Vec::new();
        let mut attempted = Vec::new();
        let mut current = primary;

        loop {
            attempted.push(current);
            let (result, metric) = match self.registry.get(current) {
                Some(provider) => query_provider(provider.as_ref(), topic, self.provider_timeout).await,
                None => {
                    let error = ProviderError::Unavailable(format!("{} is not registered", current));
                    let metric = ProviderMetrics::failure(current, Duration::ZERO, &error);
                    (Err(error), metric)
                }
            };
            metrics.push(metric);

            let error = match result {
                Ok(papers) => {
                    return Ok(Attempt {
                        provider: current,
                        papers,
                        metrics,
                        attempted,
                    })
                }
                Err(error) => error,
            };

            if !self.fallback_enabled {
                tracing::warn!(provider = %current, error = %error, "Provider failed");
                return Err(DiscoveryError::Provider {
                    provider: current,
                    source: error,
                });
            }

            match self.selector.fallback_order(available, &attempted).first() {
                Some(&next) => {
                    tracing::warn!(
                        provider = %current,
                        next = %next,
                        error = %error,
                        "Provider failed, falling back"
                    );
                    current = next;
                }
                None => {
                    tracing::warn!(provider = %current, error = %error, "Provider failed, no fallback left");
                    return Err(DiscoveryError::AllProvidersFailed {
                        attempted,
                        last_error: error,
                    });
                }
            }
        }
    }

    /// Backfill a result set with few PDFs from arXiv
    ///
    /// Runs only for the `arxiv_supplement` strategy. Any problem with arXiv
    /// leaves the primary results unchanged.
    async fn supplement(
        &self,
        topic: &Topic,
        papers: Vec<Paper>,
        attempted: &[ProviderType],
        metrics: &mut Vec<ProviderMetrics>,
    ) -> (Vec<Paper>, usize) {
        if topic.pdf_strategy() != PdfStrategy::ArxivSupplement {
            return (papers, 0);
        }

        let rate = pdf_rate(&papers);
        if !papers.is_empty() && rate >= topic.supplement_threshold() {
            tracing::debug!(rate, threshold = topic.supplement_threshold(), "PDF rate sufficient, no supplement");
            return (papers, 0);
        }
        if attempted.contains(&ProviderType::Arxiv) {
            tracing::debug!("arXiv already queried, no supplement");
            return (papers, 0);
        }

        let Some(arxiv) = self
            .registry
            .get(ProviderType::Arxiv)
            .filter(|p| p.is_available())
        else {
            tracing::debug!("arXiv unavailable, skipping supplement");
            return (papers, 0);
        };

        tracing::debug!(rate, threshold = topic.supplement_threshold(), "Supplementing from arXiv");
        let (result, metric) = query_provider(arxiv.as_ref(), topic, self.provider_timeout).await;
        metrics.push(metric);

        match result {
            Ok(extra) => {
                let (merged, added) = merge_unique(papers, extra);
                tracing::debug!(added, "arXiv supplement merged");
                (merged, added)
            }
            Err(error) => {
                tracing::warn!(error = %error, "arXiv supplement failed, keeping primary results");
                (papers, 0)
            }
        }
    }

    /// Apply the `pdf_required` filter, then quality ranking
    fn post_process(&self, topic: &Topic, mut papers: Vec<Paper>) -> Vec<Paper> {
        if topic.pdf_strategy() == PdfStrategy::PdfRequired {
            let before = papers.len();
            papers.retain(|p| p.pdf_available);
            tracing::debug!(dropped = before - papers.len(), "Dropped papers without PDF");
        }

        if topic.quality_ranking() {
            papers = self.scorer.rank_papers(&papers, topic.min_quality_score());
        }

        papers
    }
}

/// Result of a successful execute stage
struct Attempt {
    provider: ProviderType,
    papers: Vec<Paper>,
    metrics: Vec<ProviderMetrics>,
    attempted: Vec<ProviderType>,
}

/// Share of papers with an available PDF
fn pdf_rate(papers: &[Paper]) -> f64 {
    let with_pdf = papers.iter().filter(|p| p.pdf_available).count();
    with_pdf as f64 / papers.len().max(1) as f64
}

/// Validate the query and run one search under `limit`
///
/// A search still running at the deadline is dropped, not awaited.
async fn query_provider(
    provider: &dyn Provider,
    topic: &Topic,
    limit: Duration,
) -> (Result<Vec<Paper>, ProviderError>, ProviderMetrics) {
    let provider_type = provider.provider_type();
    let start = Instant::now();

    let result = match provider.validate_query(topic.query()) {
        Ok(query) => {
            let topic = topic.with_query(query);
            match timeout(limit, provider.search(&topic)).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(limit)),
            }
        }
        Err(error) => Err(error),
    };

    let latency = start.elapsed();
    let metric = match &result {
        Ok(papers) => {
            tracing::debug!(
                provider = %provider_type,
                latency_ms = latency.as_millis() as u64,
                count = papers.len(),
                "Provider search succeeded"
            );
            ProviderMetrics::success(provider_type, latency, papers.len())
        }
        Err(error) => ProviderMetrics::failure(provider_type, latency, error),
    };

    (result, metric)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaperBuilder;

    fn with_pdf(pdf: bool) -> Paper {
        PaperBuilder::new("P", ProviderType::SemanticScholar)
            .pdf_available(pdf)
            .build()
    }

    #[test]
    fn test_pdf_rate() {
        assert_eq!(pdf_rate(&[]), 0.0);
        assert_eq!(pdf_rate(&[with_pdf(false)]), 0.0);
        assert_eq!(pdf_rate(&[with_pdf(true), with_pdf(false)]), 0.5);
        assert_eq!(pdf_rate(&[with_pdf(true), with_pdf(true)]), 1.0);
    }

    #[test]
    fn test_error_classification() {
        let unavailable = DiscoveryError::RequestedProviderUnavailable {
            requested: ProviderType::SemanticScholar,
            available: vec![ProviderType::Arxiv, ProviderType::HuggingFace],
        };
        assert!(unavailable.is_fatal());
        assert_eq!(
            unavailable.to_string(),
            "Requested provider 'semantic_scholar' is unavailable (available: arxiv, huggingface)"
        );

        let failed = DiscoveryError::Provider {
            provider: ProviderType::Arxiv,
            source: ProviderError::Api("boom".into()),
        };
        assert!(failed.is_api_error());
        assert!(!failed.is_fatal());

        let unknown: DiscoveryError = UnknownProviderType("scholar".into()).into();
        assert!(unknown.is_fatal());
    }
}
