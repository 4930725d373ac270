//! Pipeline configuration.
//!
//! Holds every option of a single invocation. Defaults reproduce the
//! interactive app's initial state: bundled sample, all individuals, static
//! view, 7-day frames.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::animation::{BucketRange, BucketWidth};
use crate::dataset::{DataSource, DEFAULT_MAX_ROWS};
use crate::error::{MigrationError, Result};
use crate::static_paths::ZoomPolicy;
use crate::tracks::Selection;
use crate::types::{ColumnSchema, ViewMode};

/// Configuration for one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Sample or uploaded file (default: sample)
    pub data_source: DataSource,

    /// Individuals to render; `None` means all, an empty list means none
    pub selected_individuals: Option<Vec<String>>,

    /// Static paths or animation frames (default: static)
    pub view_mode: ViewMode,

    /// Animation bucket width in days (default: 7)
    pub bucket_width_days: u32,

    /// Permitted bucket widths (default: 1..=30)
    pub bucket_range: BucketRange,

    /// Row ceiling (default: 1,000,000)
    pub max_rows: usize,

    /// Abort on the first malformed row (default: false)
    pub strict: bool,

    /// Column names of the required fields
    pub columns: ColumnSchema,

    /// Zoom heuristics
    pub zoom: ZoomPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_source: DataSource::Sample,
            selected_individuals: None,
            view_mode: ViewMode::Static,
            bucket_width_days: BucketWidth::DEFAULT_DAYS,
            bucket_range: BucketRange::default(),
            max_rows: DEFAULT_MAX_ROWS,
            strict: false,
            columns: ColumnSchema::default(),
            zoom: ZoomPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Parses a JSON config; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| MigrationError::Config(e.to_string()))
    }

    /// Reads a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn selection(&self) -> Selection {
        match &self.selected_individuals {
            None => Selection::All,
            Some(ids) => Selection::Individuals(ids.clone()),
        }
    }

    /// Validated bucket width.
    pub fn bucket_width(&self) -> Result<BucketWidth> {
        BucketWidth::new(self.bucket_width_days, &self.bucket_range)
    }
}
