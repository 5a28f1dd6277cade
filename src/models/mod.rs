//! Core data models for papers, topics and provider metrics.

mod metrics;
mod paper;
mod topic;

pub use metrics::{DiscoveryOutcome, ProviderComparison, ProviderMetrics};
pub(crate) use paper::non_empty;
pub use paper::{Author, Paper, PaperBuilder, ProviderType, UnknownProviderType};
pub use topic::{
    NoPdfAction, PdfStrategy, Timeframe, Topic, TopicBuilder, DEFAULT_MAX_RESULTS,
    DEFAULT_SUPPLEMENT_THRESHOLD,
};
