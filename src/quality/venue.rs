//! Venue reputation table.
//!
//! The table maps lower-case venue substrings to reputation points in
//! `0..=30`. A broken or missing table never stops scoring: loading falls
//! back to an empty table with the default point value, so every venue
//! scores the same.

use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use config::{File, FileFormat, Value, ValueKind};
use thiserror::Error;

/// Upper bound of the venue points scale
pub const MAX_VENUE_POINTS: u32 = 30;

/// Points given to unknown venues when the table does not say otherwise
pub const DEFAULT_VENUE_POINTS: u32 = 15;

const BUNDLED_TABLE: &str = include_str!("../../data/venue_scores.yaml");

/// Errors raised while reading a venue table
#[derive(Debug, Error)]
pub enum VenueTableError {
    #[error("Failed to read venue table: {0}")]
    Read(#[from] config::ConfigError),

    #[error("Venue '{venue}' has a non-integer point value")]
    NotAnInteger { venue: String },

    #[error("Venue '{venue}' has {points} points, expected 0..={MAX_VENUE_POINTS}")]
    OutOfRange { venue: String, points: i128 },
}

/// Immutable venue to points lookup
#[derive(Debug, Clone, PartialEq)]
pub struct VenueTable {
    /// Sorted longest key first so the most specific match wins
    venues: Vec<(String, u32)>,
    default_score: u32,
}

impl Default for VenueTable {
    fn default() -> Self {
        Self::empty()
    }
}

impl VenueTable {
    /// Table with no venues; everything scores the default
    pub fn empty() -> Self {
        Self {
            venues: Vec::new(),
            default_score: DEFAULT_VENUE_POINTS,
        }
    }

    pub fn new(venues: impl IntoIterator<Item = (String, u32)>, default_score: u32) -> Self {
        let mut venues: Vec<(String, u32)> = venues
            .into_iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v.min(MAX_VENUE_POINTS)))
            .filter(|(k, _)| !k.is_empty())
            .collect();
        venues.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        venues.dedup_by(|a, b| a.0 == b.0);

        Self {
            venues,
            default_score: default_score.min(MAX_VENUE_POINTS),
        }
    }

    /// The table shipped with the crate
    pub fn bundled() -> Self {
        Self::from_source(File::from_str(BUNDLED_TABLE, FileFormat::Yaml)).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Bundled venue table is invalid, using empty table");
            Self::empty()
        })
    }

    /// Load a table from a YAML file, falling back to an empty table on any
    /// error
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(table) => {
                tracing::debug!(path = %path.display(), venues = table.len(), "Loaded venue table");
                table
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Venue table unavailable, venue scores fall back to the default"
                );
                Self::empty()
            }
        }
    }

    /// Load a table from a YAML file
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, VenueTableError> {
        Self::from_source(File::from(path.as_ref()).format(FileFormat::Yaml))
    }

    fn from_source<S>(source: S) -> Result<Self, VenueTableError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let raw = config::Config::builder().add_source(source).build()?;

        let default_score = match raw.get::<Value>("default_score") {
            Ok(value) => points_of("default_score", value)?,
            Err(config::ConfigError::NotFound(_)) => DEFAULT_VENUE_POINTS,
            Err(e) => return Err(e.into()),
        };

        let entries = match raw.get_table("venues") {
            Ok(table) => table,
            Err(config::ConfigError::NotFound(_)) => Default::default(),
            Err(e) => return Err(e.into()),
        };

        let venues = entries
            .into_iter()
            .map(|(venue, value)| {
                let points = points_of(&venue, value)?;
                Ok((venue, points))
            })
            .collect::<Result<Vec<_>, VenueTableError>>()?;

        Ok(Self::new(venues, default_score))
    }

    /// Replace the default point value
    pub fn with_default_score(mut self, points: u32) -> Self {
        self.default_score = points.min(MAX_VENUE_POINTS);
        self
    }

    pub fn default_score(&self) -> u32 {
        self.default_score
    }

    /// Points for a venue; the longest table key contained in the venue wins
    pub fn points(&self, venue: Option<&str>) -> u32 {
        let venue = match venue.map(|v| v.trim().to_lowercase()) {
            Some(v) if !v.is_empty() => v,
            _ => return self.default_score,
        };

        self.venues
            .iter()
            .find(|(key, _)| venue.contains(key.as_str()))
            .map_or(self.default_score, |(_, points)| *points)
    }

    pub fn len(&self) -> usize {
        self.venues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }
}

fn points_of(venue: &str, value: Value) -> Result<u32, VenueTableError> {
    let points: i128 = match value.kind {
        ValueKind::I64(v) => v.into(),
        ValueKind::I128(v) => v,
        ValueKind::U64(v) => v.into(),
        ValueKind::U128(v) => i128::try_from(v).unwrap_or(i128::MAX),
        _ => {
            return Err(VenueTableError::NotAnInteger {
                venue: venue.to_string(),
            })
        }
    };

    if !(0..=i128::from(MAX_VENUE_POINTS)).contains(&points) {
        return Err(VenueTableError::OutOfRange {
            venue: venue.to_string(),
            points,
        });
    }
    Ok(points as u32)
}

/// Shared venue table that can be swapped atomically while scorers read it
#[derive(Debug)]
pub struct VenueStore {
    inner: ArcSwap<VenueTable>,
}

impl Default for VenueStore {
    fn default() -> Self {
        Self::new(VenueTable::bundled())
    }
}

impl VenueStore {
    pub fn new(initial: VenueTable) -> Self {
        Self {
            inner: ArcSwap::new(Arc::new(initial)),
        }
    }

    /// Snapshot of the current table
    pub fn load_full(&self) -> Arc<VenueTable> {
        self.inner.load_full()
    }

    /// Swap in a new table
    pub fn store(&self, table: VenueTable) {
        self.inner.store(Arc::new(table));
    }

    /// Reload from a file; the current table is kept if the file is unusable
    pub fn reload(&self, path: impl AsRef<Path>) -> Result<(), VenueTableError> {
        let path = path.as_ref();
        match VenueTable::try_load(path) {
            Ok(table) => {
                tracing::info!(path = %path.display(), venues = table.len(), "Venue table reloaded");
                self.store(table);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Venue table reload failed, keeping current table");
                Err(e)
            }
        }
    }
}
