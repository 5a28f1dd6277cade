//! Search provider plugins with a trait-based architecture.
//!
//! This module defines the [`Provider`] trait that every paper-search backend
//! implements. Backends are registered with a [`ProviderRegistry`] in
//! declaration order and consumed by the discovery engine, which never talks
//! to a backend except through this trait.
//!
//! # Built-in providers
//!
//! - `arxiv` - arXiv Atom API (no credential, always open-access PDFs)
//! - `semantic_scholar` - Semantic Scholar Graph API (requires `SEMANTIC_SCHOLAR_API_KEY`)
//! - `huggingface` - HuggingFace Daily Papers (trending AI/ML papers)
//!
//! # Implementing a New Provider
//!
//! 1. Add a variant to [`ProviderType`] and a row to [`CapabilityMatrix::standard`]
//! 2. Create a struct that implements `Provider` (at minimum `provider_type` and `search`)
//! 3. Override `requires_credential` / `is_available` if the backend needs a key
//! 4. Register it with [`ProviderRegistry::register`]

mod arxiv;
mod capability;
mod huggingface;
pub mod mock;
mod registry;
mod semantic;

pub use arxiv::ArxivProvider;
pub use capability::{CapabilityMatrix, ProviderCapability, ProviderFeatures};
pub use huggingface::HuggingFaceProvider;
pub use mock::MockProvider;
pub use registry::ProviderRegistry;
pub use semantic::SemanticScholarProvider;

use async_trait::async_trait;
use std::time::Duration;

use crate::models::{Paper, ProviderType, Topic};
use crate::utils::validate_query;

/// The Provider trait defines the contract for all paper-search backends.
///
/// Providers own their transport-level retries; callers see one result per
/// `search` call.
#[async_trait]
pub trait Provider: Send + Sync + std::fmt::Debug {
    /// Which backend this is
    fn provider_type(&self) -> ProviderType;

    /// Human-readable name of this provider
    fn name(&self) -> &str {
        self.provider_type().name()
    }

    /// Whether this backend needs an access credential to be queried
    fn requires_credential(&self) -> bool {
        false
    }

    /// Whether this provider can be queried right now
    ///
    /// A provider that requires a credential is unavailable until one is
    /// configured.
    fn is_available(&self) -> bool {
        !self.requires_credential()
    }

    /// Check query text for characters or patterns this backend rejects
    ///
    /// Returns the cleaned query text.
    fn validate_query(&self, query: &str) -> Result<String, ProviderError> {
        validate_query(query).map_err(|e| ProviderError::InvalidQuery(e.to_string()))
    }

    /// Search for papers matching the topic
    async fn search(&self, topic: &Topic) -> Result<Vec<Paper>, ProviderError>;
}

/// Errors that can occur when querying a provider
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    /// General backend failure
    #[error("API error: {0}")]
    Api(String),

    /// Rate limit exceeded; the caller may retry later
    #[error("Rate limit exceeded")]
    RateLimit { retry_after: Option<Duration> },

    /// The query is malformed for this backend; retrying will not help
    #[error("Invalid query parameter: {0}")]
    InvalidQuery(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Parsing error (XML, JSON, etc.)
    #[error("Parse error: {0}")]
    Parse(String),

    /// The provider did not answer within the allotted time
    #[error("Provider timed out after {0:?}")]
    Timeout(Duration),

    /// The provider cannot be queried (e.g. missing credential)
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

impl ProviderError {
    /// True for the API error family (general failures, rate limits,
    /// transport and decoding failures, timeouts)
    pub fn is_api_error(&self) -> bool {
        !matches!(
            self,
            ProviderError::InvalidQuery(_) | ProviderError::Unavailable(_)
        )
    }

    /// Whether retrying the same request later could succeed
    pub fn is_retriable(&self) -> bool {
        self.is_api_error()
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ProviderError::RateLimit { .. })
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS) {
            ProviderError::RateLimit { retry_after: None }
        } else if err.is_decode() {
            ProviderError::Parse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(format!("JSON: {}", err))
    }
}

/// Map a non-success HTTP status to a provider error
pub(crate) fn status_error(provider: &str, response: &reqwest::Response) -> ProviderError {
    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);
        ProviderError::RateLimit { retry_after }
    } else if status == reqwest::StatusCode::BAD_REQUEST {
        ProviderError::InvalidQuery(format!("{} rejected the query ({})", provider, status))
    } else {
        ProviderError::Api(format!("{} returned status: {}", provider, status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_taxonomy() {
        assert!(ProviderError::Api("x".into()).is_api_error());
        assert!(ProviderError::RateLimit { retry_after: None }.is_api_error());
        assert!(ProviderError::RateLimit { retry_after: None }.is_rate_limit());
        assert!(ProviderError::Timeout(Duration::from_secs(1)).is_retriable());
        assert!(!ProviderError::InvalidQuery("x".into()).is_retriable());
        assert!(!ProviderError::Unavailable("x".into()).is_api_error());
    }

    #[test]
    fn test_default_validate_query() {
        let provider = MockProvider::new(ProviderType::Arxiv);
        assert_eq!(provider.validate_query("  llm agents ").unwrap(), "llm agents");
        assert!(matches!(
            provider.validate_query("x; DROP TABLE papers"),
            Err(ProviderError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_default_availability_follows_credential() {
        let open = MockProvider::new(ProviderType::Arxiv);
        assert!(open.is_available());

        let locked = MockProvider::new(ProviderType::SemanticScholar).requiring_credential(None);
        assert!(!locked.is_available());

        let keyed = MockProvider::new(ProviderType::SemanticScholar)
            .requiring_credential(Some("key".to_string()));
        assert!(keyed.is_available());
    }
}
