//! Error types for the migration track processor.

use thiserror::Error;

/// Errors that can occur while turning telemetry rows into renderable views.
///
/// Pipeline-level states (`EmptySelection`, `NoDataInRange`) are ordinary
/// variants here: the caller matches on them and shows a message.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A row failed normalization (missing or unparseable field)
    #[error("Malformed record at row {row}: field '{field}' {reason}")]
    MalformedRecord {
        row: usize,
        field: String,
        reason: String,
    },

    /// No individuals selected for rendering
    #[error("No individuals selected")]
    EmptySelection,

    /// Row ceiling exceeded while loading
    #[error("Dataset too large: {rows} rows exceeds limit of {limit}")]
    DatasetTooLarge { rows: usize, limit: usize },

    /// Animation binning produced zero buckets
    #[error("No data in range: nothing to bin into animation frames")]
    NoDataInRange,

    /// Bucket width outside the configured range
    #[error("Bucket width {days} days outside allowed range {min}..={max}")]
    InvalidBucketWidth { days: u32, min: u32, max: u32 },

    /// Delimited-text parsing failed
    #[error("CSV error: {0}")]
    Csv(String),

    /// Configuration file could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),

    /// Export serialization failed
    #[error("Export error: {0}")]
    Export(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MigrationError {
    /// Creates a malformed-record error.
    pub fn malformed(row: usize, field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            row,
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a CSV error.
    pub fn csv(err: impl std::fmt::Display) -> Self {
        Self::Csv(err.to_string())
    }
}

impl From<csv::Error> for MigrationError {
    fn from(err: csv::Error) -> Self {
        Self::csv(err)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MigrationError>;
