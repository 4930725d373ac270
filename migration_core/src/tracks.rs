//! Track Grouper - Per-individual chronological tracks
//!
//! Partitions normalized records by individual (first appearance defines
//! display order) and stable-sorts each partition by timestamp, so records
//! with equal timestamps keep their input order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::{MigrationError, Result};
use crate::types::PositionRecord;

/// Chronologically ordered fixes for one individual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    individual_id: String,
    records: Vec<PositionRecord>,
}

impl Track {
    /// Builds a track, sorting `records` by timestamp (stable).
    ///
    /// Callers pass one partition from [`TrackSet::group`], so every record
    /// already belongs to `individual_id`.
    pub(crate) fn new(individual_id: impl Into<String>, mut records: Vec<PositionRecord>) -> Self {
        let individual_id = individual_id.into();
        debug_assert!(records.iter().all(|r| r.individual_id == individual_id));
        records.sort_by_key(|r| r.timestamp);
        Self {
            individual_id,
            records,
        }
    }

    pub fn individual_id(&self) -> &str {
        &self.individual_id
    }

    pub fn records(&self) -> &[PositionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&PositionRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&PositionRecord> {
        self.records.last()
    }

    /// Returns the `(lat, lon)` sequence in chronological order.
    pub fn coordinates(&self) -> Vec<(f64, f64)> {
        self.records.iter().map(PositionRecord::coord).collect()
    }

    /// Returns the first and last timestamps.
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.first()?.timestamp, self.last()?.timestamp))
    }
}

// =============================================================================
// SELECTION
// =============================================================================

/// Which individuals a view should include.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// Every individual in the dataset
    #[default]
    All,

    /// Exactly these individuals (an empty list selects nothing)
    Individuals(Vec<String>),
}

impl Selection {
    pub fn only<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection::Individuals(ids.into_iter().map(Into::into).collect())
    }

    fn contains(&self, id: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Individuals(ids) => ids.iter().any(|s| s == id),
        }
    }
}

// =============================================================================
// TRACK SET
// =============================================================================

/// All tracks of a dataset, in display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackSet {
    tracks: Vec<Track>,
}

impl TrackSet {
    /// Groups records by individual and orders each group chronologically.
    pub fn group(records: &[PositionRecord]) -> Self {
        let mut order: Vec<String> = Vec::new();
        let mut partitions: HashMap<&str, Vec<PositionRecord>> = HashMap::new();

        for record in records {
            let bucket = partitions
                .entry(record.individual_id.as_str())
                .or_insert_with(|| {
                    order.push(record.individual_id.clone());
                    Vec::new()
                });
            bucket.push(record.clone());
        }

        let tracks: Vec<Track> = order
            .into_iter()
            .map(|id| {
                let records = partitions.remove(id.as_str()).unwrap_or_default();
                Track::new(id, records)
            })
            .collect();

        debug!("Grouped {} records into {} tracks", records.len(), tracks.len());

        Self { tracks }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Individual ids in display (first-appearance) order.
    pub fn individual_ids(&self) -> Vec<&str> {
        self.tracks.iter().map(Track::individual_id).collect()
    }

    pub fn get(&self, individual_id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.individual_id == individual_id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Total number of records across all tracks.
    pub fn record_count(&self) -> usize {
        self.tracks.iter().map(Track::len).sum()
    }

    /// Earliest and latest timestamps across all tracks.
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.tracks
            .iter()
            .filter_map(Track::time_span)
            .reduce(|(lo, hi), (a, b)| (lo.min(a), hi.max(b)))
    }

    /// Restricts the set to the selected individuals, keeping display order.
    ///
    /// Unknown ids are ignored. Fails with `EmptySelection` if nothing
    /// remains, never falling back to all individuals.
    pub fn select(&self, selection: &Selection) -> Result<TrackSet> {
        if let Selection::Individuals(ids) = selection {
            for id in ids {
                if self.get(id).is_none() {
                    warn!("Selected individual '{}' not present in dataset", id);
                }
            }
        }

        let tracks: Vec<Track> = self
            .tracks
            .iter()
            .filter(|t| selection.contains(&t.individual_id))
            .cloned()
            .collect();

        if tracks.is_empty() {
            return Err(MigrationError::EmptySelection);
        }
        Ok(TrackSet { tracks })
    }
}
