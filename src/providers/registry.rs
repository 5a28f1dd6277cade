//! Registry for managing search provider plugins.

use std::sync::Arc;

use super::{ArxivProvider, HuggingFaceProvider, Provider, ProviderError, SemanticScholarProvider};
use crate::config::Config;
use crate::models::ProviderType;
use crate::utils::HttpClient;

/// Registry of search providers
///
/// Providers are kept in registration order; that order is what the
/// discovery engine treats as declaration order. Registering a second
/// provider of the same type replaces the first in place.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with all built-in providers configured from `config`
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let client = HttpClient::with_timeout(config.discovery.provider_timeout())?;
        let mut registry = Self::new();

        registry.register(Arc::new(ArxivProvider::new(client.clone())));
        registry.register(Arc::new(SemanticScholarProvider::new(
            client.clone(),
            config.api_keys.semantic_scholar.clone(),
        )));
        registry.register(Arc::new(HuggingFaceProvider::new(client)));

        Ok(registry)
    }

    /// Register a provider
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        let provider_type = provider.provider_type();
        match self
            .providers
            .iter_mut()
            .find(|p| p.provider_type() == provider_type)
        {
            Some(slot) => *slot = provider,
            None => self.providers.push(provider),
        }
    }

    /// Get a provider by type
    pub fn get(&self, provider_type: ProviderType) -> Option<&Arc<dyn Provider>> {
        self.providers
            .iter()
            .find(|p| p.provider_type() == provider_type)
    }

    /// Get all registered providers in registration order
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn Provider>> {
        self.providers.iter()
    }

    /// Registered provider types in registration order
    pub fn types(&self) -> Vec<ProviderType> {
        self.providers.iter().map(|p| p.provider_type()).collect()
    }

    /// Provider types that can be queried right now, in registration order
    pub fn available_types(&self) -> Vec<ProviderType> {
        self.providers
            .iter()
            .filter(|p| p.is_available())
            .map(|p| p.provider_type())
            .collect()
    }

    /// Check if a provider type is registered
    pub fn has(&self, provider_type: ProviderType) -> bool {
        self.get(provider_type).is_some()
    }

    /// Get the number of registered providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockProvider;

    #[test]
    fn test_registry_preserves_order() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(MockProvider::new(ProviderType::HuggingFace)));
        registry.register(Arc::new(MockProvider::new(ProviderType::Arxiv)));

        assert_eq!(
            registry.types(),
            vec![ProviderType::HuggingFace, ProviderType::Arxiv]
        );
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_register_replaces_same_type() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(MockProvider::new(ProviderType::Arxiv)));
        registry.register(Arc::new(MockProvider::new(ProviderType::SemanticScholar)));
        registry.register(Arc::new(
            MockProvider::new(ProviderType::Arxiv).requiring_credential(None),
        ));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.types()[0], ProviderType::Arxiv);
        assert!(!registry.get(ProviderType::Arxiv).unwrap().is_available());
    }

    #[test]
    fn test_available_types_excludes_missing_credentials() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(MockProvider::new(ProviderType::Arxiv)));
        registry.register(Arc::new(
            MockProvider::new(ProviderType::SemanticScholar).requiring_credential(None),
        ));

        assert!(registry.has(ProviderType::SemanticScholar));
        assert_eq!(registry.available_types(), vec![ProviderType::Arxiv]);
    }

    #[test]
    fn test_from_config_registers_builtins() {
        let mut config = Config::default();
        config.api_keys.semantic_scholar = None;
        let registry = ProviderRegistry::from_config(&config).unwrap();

        assert_eq!(registry.types(), ProviderType::ALL.to_vec());
        assert_eq!(
            registry.available_types(),
            vec![ProviderType::Arxiv, ProviderType::HuggingFace]
        );
    }
}
