//! Dataset loading - delimited text into raw rows
//!
//! Reads CSV with a header line into [`RawRow`]s. Extra columns are kept
//! (and later ignored by the normalizer); short rows simply lack the
//! trailing cells. A row ceiling guards against unbounded inputs.
//!
//! Cells are decoded lossily: invalid UTF-8 becomes U+FFFD and the
//! normalizer rejects that row alone.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{MigrationError, Result};
use crate::types::RawRow;

/// Default row ceiling.
pub const DEFAULT_MAX_ROWS: usize = 1_000_000;

/// Bundled sample: arctic foxes (Vulpes lagopus), Argos, Karupelv, Greenland.
pub const SAMPLE_CSV: &str = include_str!("../data/sample.csv");

/// Where the telemetry comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// The bundled sample dataset
    #[default]
    Sample,

    /// A user-provided CSV file
    Uploaded(PathBuf),
}

impl DataSource {
    /// `"sample"` selects the bundled data; anything else is a file path.
    pub fn parse(arg: &str) -> Self {
        if arg.eq_ignore_ascii_case("sample") {
            DataSource::Sample
        } else {
            DataSource::Uploaded(PathBuf::from(arg))
        }
    }

    /// Loads all rows from this source.
    pub fn load(&self, max_rows: usize) -> Result<Vec<RawRow>> {
        match self {
            DataSource::Sample => read_csv(SAMPLE_CSV.as_bytes(), max_rows),
            DataSource::Uploaded(path) => read_csv_file(path, max_rows),
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Sample => write!(f, "sample"),
            DataSource::Uploaded(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Reads a CSV file from disk.
pub fn read_csv_file(path: impl AsRef<Path>, max_rows: usize) -> Result<Vec<RawRow>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let rows = read_csv(file, max_rows)?;
    info!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Reads CSV with headers from any reader.
///
/// Fails fast with `DatasetTooLarge` once more than `max_rows` rows are seen.
pub fn read_csv<R: Read>(reader: R, max_rows: usize) -> Result<Vec<RawRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let mut rows = Vec::new();

    for result in csv_reader.byte_records() {
        let record = result?;
        if rows.len() == max_rows {
            return Err(MigrationError::DatasetTooLarge {
                rows: rows.len() + 1,
                limit: max_rows,
            });
        }

        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(name, value)| (name.to_string(), String::from_utf8_lossy(value).into_owned()))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}
