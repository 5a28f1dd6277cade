//! Static per-provider capability facts.

use crate::models::ProviderType;

bitflags::bitflags! {
    /// Feature flags a provider can support
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ProviderFeatures: u32 {
        const SEARCH = 1 << 0;
        const CITATIONS = 1 << 1;
        const TRENDING = 1 << 2;
        const OPEN_ACCESS_PDF = 1 << 3;
        /// Coverage spans disciplines well beyond CS/physics/math
        const BROAD_COVERAGE = 1 << 4;
    }
}

/// Capability facts for one provider type
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderCapability {
    pub coverage: &'static str,
    pub features: ProviderFeatures,
    /// Fraction of results that typically carry an open-access PDF
    pub open_access_rate: f64,
    pub requires_credential: bool,
    /// Nominal request budget
    pub requests_per_second: f64,
}

impl ProviderCapability {
    pub fn supports_citations(&self) -> bool {
        self.features.contains(ProviderFeatures::CITATIONS)
    }

    pub fn supports_trending(&self) -> bool {
        self.features.contains(ProviderFeatures::TRENDING)
    }

    pub fn has_broad_coverage(&self) -> bool {
        self.features.contains(ProviderFeatures::BROAD_COVERAGE)
    }
}

/// Process-wide capability table, constructed once and passed to the
/// selector
#[derive(Debug, Clone)]
pub struct CapabilityMatrix {
    entries: Vec<(ProviderType, ProviderCapability)>,
}

impl CapabilityMatrix {
    /// The capability table for the built-in providers
    pub fn standard() -> Self {
        Self {
            entries: vec![
                (
                    ProviderType::Arxiv,
                    ProviderCapability {
                        coverage: "Preprints in physics, mathematics, computer science, \
                                   quantitative biology, quantitative finance and statistics",
                        features: ProviderFeatures::SEARCH | ProviderFeatures::OPEN_ACCESS_PDF,
                        open_access_rate: 1.0,
                        requires_credential: false,
                        requests_per_second: 0.33,
                    },
                ),
                (
                    ProviderType::SemanticScholar,
                    ProviderCapability {
                        coverage: "200M+ papers across all academic disciplines",
                        features: ProviderFeatures::SEARCH
                            | ProviderFeatures::CITATIONS
                            | ProviderFeatures::BROAD_COVERAGE,
                        open_access_rate: 0.4,
                        requires_credential: true,
                        requests_per_second: 1.0,
                    },
                ),
                (
                    ProviderType::HuggingFace,
                    ProviderCapability {
                        coverage: "Community-curated daily AI/ML papers",
                        features: ProviderFeatures::SEARCH
                            | ProviderFeatures::TRENDING
                            | ProviderFeatures::OPEN_ACCESS_PDF,
                        open_access_rate: 1.0,
                        requires_credential: false,
                        requests_per_second: 10.0,
                    },
                ),
            ],
        }
    }

    /// Build a custom matrix (used for tests and alternative deployments)
    pub fn from_entries(entries: Vec<(ProviderType, ProviderCapability)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, provider: ProviderType) -> Option<&ProviderCapability> {
        self.entries
            .iter()
            .find(|(p, _)| *p == provider)
            .map(|(_, c)| c)
    }

    pub fn supports(&self, provider: ProviderType, features: ProviderFeatures) -> bool {
        self.get(provider)
            .map(|c| c.features.contains(features))
            .unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProviderType, &ProviderCapability)> {
        self.entries.iter().map(|(p, c)| (*p, c))
    }
}

impl Default for CapabilityMatrix {
    fn default() -> Self {
        Self::standard()
    }
}
