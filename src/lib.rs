//! # Paper Discovery
//!
//! A discovery and ranking engine for academic papers across multiple
//! search providers.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Paper, Topic, provider metrics)
//! - [`providers`]: Search provider plugins behind the [`Provider`] trait
//! - [`discovery`]: Provider selection and the discovery orchestrator
//! - [`quality`]: Composite quality scoring and the venue table
//! - [`utils`]: HTTP client, deduplication, retry and query validation
//! - [`config`]: Configuration management
//!
//! ## Example
//!
//! ```no_run
//! use paper_discovery::{Config, Discovery, Topic};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let discovery = Discovery::from_config(&Config::default())?;
//! let topic = Topic::builder("retrieval augmented generation")
//!     .quality_ranking(true)
//!     .build();
//!
//! for paper in discovery.discover(&topic).await? {
//!     println!("{:.1} {}", paper.quality_score.unwrap_or(0.0), paper.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod discovery;
pub mod models;
pub mod providers;
pub mod quality;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use discovery::{Discovery, DiscoveryError, ProviderSelector};
pub use models::{DiscoveryOutcome, Paper, ProviderType, Topic};
pub use providers::{Provider, ProviderError, ProviderRegistry};
pub use quality::QualityScorer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
