//! Common types for the migration track processor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A raw telemetry row: column name → cell text, exactly as read from the source.
pub type RawRow = HashMap<String, String>;

/// A validated GPS fix for one individual.
///
/// Created only by the normalizer; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    /// Individual identifier, kept as a categorical label
    pub individual_id: String,

    /// Fix time (UTC)
    pub timestamp: DateTime<Utc>,

    /// Latitude in degrees, [-90, 90]
    pub latitude: f64,

    /// Longitude in degrees, [-180, 180]
    pub longitude: f64,
}

impl PositionRecord {
    /// Returns the `(lat, lon)` pair.
    pub fn coord(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// Column names for the four required fields.
///
/// Defaults mirror the Movebank CSV export schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSchema {
    /// Individual identifier column (default: "individual-local-identifier")
    pub individual: String,

    /// Timestamp column (default: "timestamp")
    pub timestamp: String,

    /// Latitude column (default: "location-lat")
    pub latitude: String,

    /// Longitude column (default: "location-long")
    pub longitude: String,
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            individual: "individual-local-identifier".to_string(),
            timestamp: "timestamp".to_string(),
            latitude: "location-lat".to_string(),
            longitude: "location-long".to_string(),
        }
    }
}

impl ColumnSchema {
    /// Returns the required column names in a fixed order.
    pub fn required(&self) -> [&str; 4] {
        [
            &self.individual,
            &self.timestamp,
            &self.latitude,
            &self.longitude,
        ]
    }
}

/// Which rendered view the caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Polylines with start/end markers
    #[default]
    Static,

    /// Time-bucketed animation frames
    Animated,
}

impl ViewMode {
    /// Returns the view name.
    pub fn name(&self) -> &'static str {
        match self {
            ViewMode::Static => "static",
            ViewMode::Animated => "animated",
        }
    }
}

impl std::str::FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "static" => Ok(ViewMode::Static),
            "animated" | "animation" => Ok(ViewMode::Animated),
            _ => Err(format!("Unknown view mode: {}", s)),
        }
    }
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
