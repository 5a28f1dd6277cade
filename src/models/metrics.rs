//! Per-provider metrics and benchmark comparison results.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Paper, ProviderType};

/// Outcome of a single provider invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMetrics {
    pub provider: ProviderType,
    pub latency_ms: u64,
    pub result_count: usize,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProviderMetrics {
    pub fn success(provider: ProviderType, latency: Duration, result_count: usize) -> Self {
        Self {
            provider,
            latency_ms: latency.as_millis() as u64,
            result_count,
            success: true,
            error: None,
        }
    }

    pub fn failure(provider: ProviderType, latency: Duration, error: impl ToString) -> Self {
        Self {
            provider,
            latency_ms: latency.as_millis() as u64,
            result_count: 0,
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Side-by-side comparison of every provider queried in benchmark mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderComparison {
    /// Providers queried, in declaration order
    pub providers: Vec<ProviderType>,
    pub metrics: Vec<ProviderMetrics>,
    /// Papers left after merging and deduplicating successful results
    pub total_unique_papers: usize,
    /// Raw successful results minus unique papers
    pub overlap_count: usize,
    pub fastest_provider: Option<ProviderType>,
    pub most_results_provider: Option<ProviderType>,
}

impl ProviderComparison {
    /// Build a comparison from per-provider metrics, given in declaration order
    ///
    /// Ties on latency or result count go to the provider listed first.
    pub fn from_metrics(metrics: Vec<ProviderMetrics>, total_unique_papers: usize) -> Self {
        let mut fastest: Option<&ProviderMetrics> = None;
        let mut most: Option<&ProviderMetrics> = None;

        for m in metrics.iter().filter(|m| m.success) {
            if fastest.map_or(true, |f| m.latency_ms < f.latency_ms) {
                fastest = Some(m);
            }
            if most.map_or(true, |b| m.result_count > b.result_count) {
                most = Some(m);
            }
        }

        let raw_total: usize = metrics
            .iter()
            .filter(|m| m.success)
            .map(|m| m.result_count)
            .sum();

        Self {
            providers: metrics.iter().map(|m| m.provider).collect(),
            fastest_provider: fastest.map(|m| m.provider),
            most_results_provider: most.map(|m| m.provider),
            overlap_count: raw_total.saturating_sub(total_unique_papers),
            total_unique_papers,
            metrics,
        }
    }

    /// Providers whose query failed
    pub fn failed_providers(&self) -> Vec<ProviderType> {
        self.metrics
            .iter()
            .filter(|m| !m.success)
            .map(|m| m.provider)
            .collect()
    }
}

/// Final result of a discovery request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryOutcome {
    /// Ranked, deduplicated papers
    pub papers: Vec<Paper>,
    /// Provider whose results formed the primary set (None in benchmark mode)
    pub provider: Option<ProviderType>,
    /// One entry per provider invocation, in invocation order
    pub metrics: Vec<ProviderMetrics>,
    /// Present only for benchmark runs
    pub comparison: Option<ProviderComparison>,
    /// Number of papers appended by the arXiv supplement
    pub supplemented: usize,
}
