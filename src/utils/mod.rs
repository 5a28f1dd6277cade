//! Utility modules supporting discovery.
//!
//! - [`deduplicate_papers`] / [`merge_unique`]: cross-provider deduplication by DOI, ID and title
//! - [`HttpClient`]: shared HTTP client used by the built-in providers
//! - [`with_retry`]: provider-internal retry with exponential backoff
//! - [`validate_query`]: rejects query text with injection patterns
//!
//! # Deduplication
//!
//! ```rust
//! use paper_discovery::models::{PaperBuilder, ProviderType};
//! use paper_discovery::utils::merge_unique;
//!
//! let primary = vec![PaperBuilder::new("Attention Is All You Need", ProviderType::SemanticScholar).build()];
//! let extra = vec![PaperBuilder::new("attention is all you need", ProviderType::Arxiv).build()];
//!
//! let (merged, added) = merge_unique(primary, extra);
//! assert_eq!(merged.len(), 1);
//! assert_eq!(added, 0);
//! ```

mod dedup;
mod http;
mod retry;
mod validate;

pub use dedup::{
    deduplicate_papers, is_duplicate, merge_unique, normalize_title, DuplicateMatch, PaperIndex,
};
pub use http::HttpClient;
pub use retry::{api_retry_config, with_retry, RetryConfig};
pub use validate::{validate_query, ValidationError, MAX_QUERY_LENGTH};
