//! Configuration management.
//!
//! Configuration is layered: an optional TOML or YAML file, then
//! environment variables prefixed with `PAPER_DISCOVERY` using `__` as the
//! section separator (e.g. `PAPER_DISCOVERY_DISCOVERY__FALLBACK_ENABLED=true`).
//!
//! ```toml
//! [api_keys]
//! semantic_scholar = "your-api-key"
//!
//! [discovery]
//! provider_timeout_secs = 30
//! fallback_enabled = false
//! benchmark_mode = false
//! preference_order = ["arxiv", "semantic_scholar", "huggingface"]
//!
//! [quality]
//! venue_scores_path = "./venue_scores.yaml"
//!
//! [quality.weights]
//! citation = 0.4
//! venue = 0.3
//! recency = 0.2
//! completeness = 0.1
//!
//! [logging]
//! level = "info"
//! format = "text"
//!
//! [[topics]]
//! query = "retrieval augmented generation"
//! ```

mod topics;

pub use topics::{TopicEntry, TopicError};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::{ProviderType, Topic, UnknownProviderType};
use crate::providers::ProviderError;
use crate::quality::{QualityError, QualityScorer, QualityWeights, VenueTable};

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "PAPER_DISCOVERY";

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "paper-discovery.toml";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid topic '{name}': {source}")]
    Topic {
        name: String,
        #[source]
        source: TopicError,
    },

    #[error(transparent)]
    UnknownProvider(#[from] UnknownProviderType),

    #[error(transparent)]
    Quality(#[from] QualityError),

    #[error("Failed to set up providers: {0}")]
    Provider(#[from] ProviderError),

    #[error("Invalid selector vocabulary: {0}")]
    Selector(#[from] regex::Error),
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api_keys: ApiKeys,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub quality: QualityConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub topics: Vec<TopicEntry>,
}

/// API keys for external services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeys {
    /// Semantic Scholar API key; the provider is unavailable without it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_scholar: Option<String>,
}

impl Default for ApiKeys {
    fn default() -> Self {
        Self {
            semantic_scholar: std::env::var("SEMANTIC_SCHOLAR_API_KEY").ok(),
        }
    }
}

/// Discovery engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Time allowed for a single provider call
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_secs: u64,

    /// Try the next provider when the selected one fails
    #[serde(default)]
    pub fallback_enabled: bool,

    /// Query every available provider for every topic
    #[serde(default)]
    pub benchmark_mode: bool,

    /// Provider identifiers, most preferred first
    #[serde(default = "default_preference_order")]
    pub preference_order: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            provider_timeout_secs: default_provider_timeout(),
            fallback_enabled: false,
            benchmark_mode: false,
            preference_order: default_preference_order(),
        }
    }
}

fn default_provider_timeout() -> u64 {
    30
}

fn default_preference_order() -> Vec<String> {
    ProviderType::ALL.iter().map(|p| p.id().to_string()).collect()
}

impl DiscoveryConfig {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs.max(1))
    }

    /// Parsed preference order; unknown names are an error
    pub fn preference_order(&self) -> Result<Vec<ProviderType>, UnknownProviderType> {
        let mut order = Vec::with_capacity(self.preference_order.len());
        for name in &self.preference_order {
            let provider: ProviderType = name.parse()?;
            if !order.contains(&provider) {
                order.push(provider);
            }
        }
        Ok(order)
    }
}

/// Quality scorer settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityConfig {
    /// YAML venue table; the bundled table is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue_scores_path: Option<PathBuf>,

    /// Points for venues not in the table, overriding the table's own default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_venue_score: Option<u32>,

    #[serde(default)]
    pub weights: QualityWeights,
}

impl QualityConfig {
    /// The venue table these settings describe
    ///
    /// A configured table that cannot be read falls back to an empty table.
    pub fn venue_table(&self) -> VenueTable {
        let table = match &self.venue_scores_path {
            Some(path) => VenueTable::load(path),
            None => VenueTable::bundled(),
        };
        match self.default_venue_score {
            Some(points) => table.with_default_score(points),
            None => table,
        }
    }

    pub fn scorer(&self) -> Result<QualityScorer, QualityError> {
        QualityScorer::new(self.weights, self.venue_table())
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Validate every configured topic
    pub fn topics(&self) -> Result<Vec<Topic>, ConfigError> {
        self.topics
            .iter()
            .map(|entry| {
                entry.validate().map_err(|source| ConfigError::Topic {
                    name: entry.label().to_string(),
                    source,
                })
            })
            .collect()
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write as TOML to `path`
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }
}

/// Locate a configuration file in the working directory or the platform
/// config directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("paper-discovery").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Load configuration from `path` (or a discovered file) layered with
/// environment overrides
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    match path.map(Path::to_path_buf).or_else(find_config_file) {
        Some(file) => {
            tracing::debug!(path = %file.display(), "Loading configuration file");
            builder = builder.add_source(config::File::from(file.as_path()));
        }
        None => tracing::debug!("No configuration file found, using defaults"),
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("discovery.preference_order"),
        )
        .build()?;

    let mut config: Config = settings.try_deserialize()?;
    if config.api_keys.semantic_scholar.is_none() {
        config.api_keys.semantic_scholar = std::env::var("SEMANTIC_SCHOLAR_API_KEY").ok();
    }
    Ok(config)
}
