//! Record Normalizer - Schema validation for raw telemetry rows
//!
//! Turns loosely-typed rows (column → text) into [`PositionRecord`]s.
//! Nothing downstream ever sees an unvalidated row.
//!
//! Rejection policy: **skip and report**. A bad row is recorded as a
//! [`RowRejection`] and the rest of the batch continues. `strict` mode turns
//! the first rejection into [`MigrationError::MalformedRecord`] instead.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{MigrationError, Result};
use crate::types::{ColumnSchema, PositionRecord, RawRow};

/// Layouts with an explicit offset (`+00`, `+0200`, `+02:00`).
const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
];

/// Naive layouts, read as UTC. `%.f` also accepts a missing fraction.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Left behind by lossy decoding of non-UTF-8 input.
const REPLACEMENT_CHAR: char = '\u{FFFD}';

// =============================================================================
// REJECTIONS
// =============================================================================

/// One row that failed normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRejection {
    /// Zero-based index into the input rows
    pub row: usize,

    /// Column that failed
    pub field: String,

    /// Human-readable reason
    pub reason: String,
}

impl RowRejection {
    fn new(row: usize, field: &str, reason: impl Into<String>) -> Self {
        Self {
            row,
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<RowRejection> for MigrationError {
    fn from(r: RowRejection) -> Self {
        MigrationError::MalformedRecord {
            row: r.row,
            field: r.field,
            reason: r.reason,
        }
    }
}

/// Output of a normalization pass.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    /// Accepted records, in input order
    pub records: Vec<PositionRecord>,

    /// Rejected rows, in input order
    pub rejected: Vec<RowRejection>,

    /// Number of rows examined
    pub total_rows: usize,
}

impl NormalizedBatch {
    /// Returns true if every row was accepted.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

// =============================================================================
// NORMALIZER
// =============================================================================

/// Validates raw rows against a [`ColumnSchema`].
#[derive(Debug, Clone, Default)]
pub struct RecordNormalizer {
    schema: ColumnSchema,
    strict: bool,
}

impl RecordNormalizer {
    /// Creates a normalizer for the given column names.
    pub fn new(schema: ColumnSchema) -> Self {
        Self {
            schema,
            strict: false,
        }
    }

    /// Abort on the first malformed row instead of collecting rejections.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    /// Normalizes a batch of rows.
    ///
    /// Only fails in strict mode; otherwise bad rows land in `rejected`.
    pub fn normalize(&self, rows: &[RawRow]) -> Result<NormalizedBatch> {
        let mut batch = NormalizedBatch {
            records: Vec::with_capacity(rows.len()),
            rejected: Vec::new(),
            total_rows: rows.len(),
        };

        for (index, row) in rows.iter().enumerate() {
            match self.normalize_row(index, row) {
                Ok(record) => batch.records.push(record),
                Err(rejection) => {
                    if self.strict {
                        return Err(rejection.into());
                    }
                    debug!(
                        "Rejected row {}: {} {}",
                        rejection.row, rejection.field, rejection.reason
                    );
                    batch.rejected.push(rejection);
                }
            }
        }

        if !batch.rejected.is_empty() {
            warn!(
                "{} of {} rows rejected during normalization",
                batch.rejected.len(),
                batch.total_rows
            );
        }

        Ok(batch)
    }

    /// Normalizes a single row.
    pub fn normalize_row(
        &self,
        index: usize,
        row: &RawRow,
    ) -> std::result::Result<PositionRecord, RowRejection> {
        let schema = &self.schema;

        let individual_id = required_cell(index, row, &schema.individual)?.to_string();

        let ts_text = required_cell(index, row, &schema.timestamp)?;
        let timestamp = parse_timestamp(ts_text).ok_or_else(|| {
            RowRejection::new(
                index,
                &schema.timestamp,
                format!("is not a recognized timestamp: '{}'", ts_text),
            )
        })?;

        let latitude = parse_coordinate(index, row, &schema.latitude, 90.0)?;
        let longitude = parse_coordinate(index, row, &schema.longitude, 180.0)?;

        Ok(PositionRecord {
            individual_id,
            timestamp,
            latitude,
            longitude,
        })
    }
}

/// Looks up a cell, treating absent and blank cells alike.
fn required_cell<'a>(
    index: usize,
    row: &'a RawRow,
    field: &str,
) -> std::result::Result<&'a str, RowRejection> {
    match row.get(field).map(|v| v.trim()) {
        Some(v) if v.contains(REPLACEMENT_CHAR) => {
            Err(RowRejection::new(index, field, "is not valid UTF-8"))
        }
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(RowRejection::new(index, field, "is missing")),
    }
}

fn parse_coordinate(
    index: usize,
    row: &RawRow,
    field: &str,
    limit: f64,
) -> std::result::Result<f64, RowRejection> {
    let text = required_cell(index, row, field)?;
    let value: f64 = text
        .parse()
        .map_err(|_| RowRejection::new(index, field, format!("is not numeric: '{}'", text)))?;

    if !value.is_finite() {
        return Err(RowRejection::new(index, field, "is not finite"));
    }
    if value.abs() > limit {
        return Err(RowRejection::new(
            index,
            field,
            format!("{} outside [-{}, {}]", value, limit, limit),
        ));
    }
    Ok(value)
}

/// Parses an unambiguous date/time string into UTC.
///
/// RFC 3339 offsets are honored; naive forms are read as UTC and a bare
/// `YYYY-MM-DD` means midnight.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(id: &str, ts: &str, lat: &str, lon: &str) -> RawRow {
        let schema = ColumnSchema::default();
        let mut r = RawRow::new();
        r.insert(schema.individual, id.to_string());
        r.insert(schema.timestamp, ts.to_string());
        r.insert(schema.latitude, lat.to_string());
        r.insert(schema.longitude, lon.to_string());
        r
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = Utc.with_ymd_and_hms(2011, 7, 1, 0, 36, 19).unwrap();
        assert_eq!(parse_timestamp("2011-07-01 00:36:19.000"), Some(expected));
        assert_eq!(parse_timestamp("2011-07-01T00:36:19"), Some(expected));
        assert_eq!(parse_timestamp("2011-07-01T02:36:19+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2011/07/01 00:36:19"), Some(expected));
        assert_eq!(
            parse_timestamp("2011-07-01"),
            Some(Utc.with_ymd_and_hms(2011, 7, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("07/01/2011"), None);
    }

    #[test]
    fn test_parse_timestamp_short_offsets() {
        let midnight = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2020-01-01 00:00:00.000+00"), Some(midnight));
        assert_eq!(parse_timestamp("2020-01-01 02:00:00+0200"), Some(midnight));
        assert_eq!(parse_timestamp("2020-01-01T01:00:00+01:00"), Some(midnight));
        assert_eq!(parse_timestamp("2020-01-01 00:00:00"), Some(midnight));
    }

    #[test]
    fn test_invalid_utf8_cell_rejects_only_its_row() {
        let rows = vec![
            row("A", "2020-01-01", "10", "10"),
            row("Ren\u{FFFD}", "2020-01-02", "11", "11"),
            row("A", "2020-01-03", "12", "12"),
        ];

        let batch = RecordNormalizer::default().normalize(&rows).unwrap();

        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.rejected[0].row, 1);
        assert_eq!(batch.rejected[0].field, "individual-local-identifier");
        assert_eq!(batch.rejected[0].reason, "is not valid UTF-8");
    }

    #[test]
    fn test_normalize_accepts_valid_rows() {
        let rows = vec![row("fox-1", "2020-01-01", "72.5", "-24.1")];
        let batch = RecordNormalizer::default().normalize(&rows).unwrap();

        assert!(batch.is_clean());
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].individual_id, "fox-1");
        assert_eq!(batch.records[0].coord(), (72.5, -24.1));
    }

    #[test]
    fn test_skip_and_report_policy() {
        let rows = vec![
            row("a", "2020-01-01", "10", "10"),
            row("a", "2020-01-02", "north", "10"),
            row("b", "not-a-date", "10", "10"),
            row("", "2020-01-03", "10", "10"),
            row("b", "2020-01-04", "95", "10"),
            row("b", "2020-01-05", "10", "NaN"),
            row("c", "2020-01-06", "-10", "179.5"),
        ];

        let batch = RecordNormalizer::default().normalize(&rows).unwrap();

        assert_eq!(batch.total_rows, 7);
        assert_eq!(batch.records.len(), 2);
        let rejected: Vec<(usize, &str)> = batch
            .rejected
            .iter()
            .map(|r| (r.row, r.field.as_str()))
            .collect();
        assert_eq!(
            rejected,
            vec![
                (1, "location-lat"),
                (2, "timestamp"),
                (3, "individual-local-identifier"),
                (4, "location-lat"),
                (5, "location-long"),
            ]
        );
    }

    #[test]
    fn test_strict_mode_aborts() {
        let rows = vec![
            row("a", "2020-01-01", "10", "10"),
            row("a", "2020-01-02", "", "10"),
        ];

        let err = RecordNormalizer::default()
            .strict(true)
            .normalize(&rows)
            .unwrap_err();

        match err {
            MigrationError::MalformedRecord { row, field, .. } => {
                assert_eq!(row, 1);
                assert_eq!(field, "location-lat");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_custom_schema() {
        let schema = ColumnSchema {
            individual: "animal".into(),
            timestamp: "time".into(),
            latitude: "lat".into(),
            longitude: "lon".into(),
        };
        let mut r = RawRow::new();
        r.insert("animal".into(), " 17 ".into());
        r.insert("time".into(), "2020-03-01 12:00".into());
        r.insert("lat".into(), "1.5".into());
        r.insert("lon".into(), "2.5".into());

        let record = RecordNormalizer::new(schema).normalize_row(0, &r).unwrap();
        assert_eq!(record.individual_id, "17");
        assert_eq!(
            record.timestamp,
            Utc.with_ymd_and_hms(2020, 3, 1, 12, 0, 0).unwrap()
        );
    }
}
