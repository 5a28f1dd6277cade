//! Mock provider for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::models::{Paper, PaperBuilder, ProviderType, Topic};
use crate::providers::{Provider, ProviderError};

/// A mock provider that returns a scripted response, optionally after a delay.
#[derive(Debug)]
pub struct MockProvider {
    provider_type: ProviderType,
    response: Mutex<Result<Vec<Paper>, ProviderError>>,
    delay: Option<Duration>,
    credential: Option<Option<String>>,
    calls: AtomicUsize,
}

impl MockProvider {
    /// Create a mock impersonating `provider_type` that returns no papers.
    pub fn new(provider_type: ProviderType) -> Self {
        Self {
            provider_type,
            response: Mutex::new(Ok(Vec::new())),
            delay: None,
            credential: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Return these papers from every search.
    pub fn with_papers(self, papers: Vec<Paper>) -> Self {
        self.set_response(Ok(papers));
        self
    }

    /// Fail every search with this error.
    pub fn failing(self, error: ProviderError) -> Self {
        self.set_response(Err(error));
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Mark this provider as credential-gated, with or without a configured key.
    pub fn requiring_credential(mut self, credential: Option<String>) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Replace the scripted response.
    pub fn set_response(&self, response: Result<Vec<Paper>, ProviderError>) {
        let mut guard = self.response.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = response;
    }

    /// Number of times `search` has been called.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn provider_type(&self) -> ProviderType {
        self.provider_type
    }

    fn requires_credential(&self) -> bool {
        self.credential.is_some()
    }

    fn is_available(&self) -> bool {
        match &self.credential {
            Some(key) => key.is_some(),
            None => true,
        }
    }

    async fn search(&self, _topic: &Topic) -> Result<Vec<Paper>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.response
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Helper function to create a mock paper for testing.
pub fn make_paper(paper_id: &str, title: &str, source: ProviderType) -> Paper {
    PaperBuilder::new(title, source)
        .paper_id(paper_id)
        .url(format!("http://example.com/{}", paper_id))
        .build()
}
