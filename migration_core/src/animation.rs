//! Animation Frame Binner - Time-bucketed frames for map playback
//!
//! Every fix is floored into a fixed-width bucket; one frame is emitted per
//! bucket that holds at least one fix, in ascending bucket order.
//!
//! # Anchor
//!
//! Buckets are anchored at midnight UTC of the earliest selected fix's
//! calendar day:
//!
//! ```text
//! key   = floor((t - anchor) / width)
//! start = anchor + key * width
//! ```
//!
//! A single anchor for all fixes means a width that divides another width
//! always refines it, so narrower buckets never yield fewer frames.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{MigrationError, Result};
use crate::palette::{ColorAssignment, ColorEntry};
use crate::static_paths::{mean_center, MapView};
use crate::tracks::TrackSet;

const SECONDS_PER_DAY: i64 = 86_400;

// =============================================================================
// BUCKET WIDTH
// =============================================================================

/// Inclusive range of permitted bucket widths, in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketRange {
    pub min: u32,
    pub max: u32,
}

impl Default for BucketRange {
    fn default() -> Self {
        Self { min: 1, max: 30 }
    }
}

/// Validated bucket width in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BucketWidth(u32);

impl BucketWidth {
    /// Default frame interval (one week).
    pub const DEFAULT_DAYS: u32 = 7;

    /// Validates `days` against `range`. Zero is always rejected.
    pub fn new(days: u32, range: &BucketRange) -> Result<Self> {
        if days == 0 || days < range.min || days > range.max {
            return Err(MigrationError::InvalidBucketWidth {
                days,
                min: range.min,
                max: range.max,
            });
        }
        Ok(Self(days))
    }

    pub fn days(&self) -> u32 {
        self.0
    }

    fn seconds(&self) -> i64 {
        i64::from(self.0) * SECONDS_PER_DAY
    }
}

impl Default for BucketWidth {
    fn default() -> Self {
        Self(Self::DEFAULT_DAYS)
    }
}

// =============================================================================
// FRAMES
// =============================================================================

/// One individual's fix inside a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramePosition {
    /// Categorical label, never interpreted numerically
    pub individual_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// All fixes falling in one bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationFrame {
    /// Bucket index from the anchor
    pub bucket_key: i64,
    /// Bucket start, `YYYY-MM-DD`
    pub bucket_label: String,
    pub bucket_start: DateTime<Utc>,
    pub positions: Vec<FramePosition>,
}

/// Everything the animation renderer needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationView {
    pub bucket_width_days: u32,
    pub anchor: DateTime<Utc>,
    pub frames: Vec<AnimationFrame>,
    pub legend: Vec<ColorEntry>,
    pub view: MapView,
}

impl AnimationView {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Total fixes across all frames.
    pub fn position_count(&self) -> usize {
        self.frames.iter().map(|f| f.positions.len()).sum()
    }
}

/// Midnight UTC of `t`'s calendar day.
fn day_floor(t: DateTime<Utc>) -> DateTime<Utc> {
    t.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(t)
}

/// Bucket index of `t` relative to `anchor`.
pub fn bucket_key(t: DateTime<Utc>, anchor: DateTime<Utc>, width: BucketWidth) -> i64 {
    (t - anchor).num_seconds().div_euclid(width.seconds())
}

/// Start instant of bucket `key`.
pub fn bucket_start(key: i64, anchor: DateTime<Utc>, width: BucketWidth) -> DateTime<Utc> {
    anchor + Duration::seconds(key * width.seconds())
}

/// Bins the selected tracks into ordered frames.
///
/// Fails with `NoDataInRange` when there are no fixes at all.
pub fn bin_frames(selected: &TrackSet, width: BucketWidth) -> Result<Vec<AnimationFrame>> {
    let (earliest, _) = selected.time_span().ok_or(MigrationError::NoDataInRange)?;
    let anchor = day_floor(earliest);

    // Display order of tracks, then chronology, is preserved within a bucket
    let mut buckets: BTreeMap<i64, Vec<FramePosition>> = BTreeMap::new();
    for track in selected.tracks() {
        for record in track.records() {
            buckets
                .entry(bucket_key(record.timestamp, anchor, width))
                .or_default()
                .push(FramePosition {
                    individual_id: record.individual_id.clone(),
                    latitude: record.latitude,
                    longitude: record.longitude,
                    timestamp: record.timestamp,
                    color: None,
                });
        }
    }

    if buckets.is_empty() {
        return Err(MigrationError::NoDataInRange);
    }

    let frames: Vec<AnimationFrame> = buckets
        .into_iter()
        .map(|(key, positions)| {
            let start = bucket_start(key, anchor, width);
            AnimationFrame {
                bucket_key: key,
                bucket_label: start.format("%Y-%m-%d").to_string(),
                bucket_start: start,
                positions,
            }
        })
        .collect();

    debug!(
        "Binned {} records into {} frames ({}-day buckets)",
        selected.record_count(),
        frames.len(),
        width.days()
    );

    Ok(frames)
}

/// Builds the animated view: frames, colors and legend.
pub fn build_animation_view(
    selected: &TrackSet,
    width: BucketWidth,
    colors: &ColorAssignment,
    zoom: u8,
) -> Result<AnimationView> {
    let mut frames = bin_frames(selected, width)?;
    for frame in &mut frames {
        for position in &mut frame.positions {
            position.color = colors.color_of(&position.individual_id).map(str::to_string);
        }
    }

    let (center_lat, center_lon) = mean_center(selected).ok_or(MigrationError::NoDataInRange)?;
    let anchor = frames
        .first()
        .map(|f| f.bucket_start)
        .ok_or(MigrationError::NoDataInRange)?;
    let legend = colors
        .legend(&selected.individual_ids())
        .into_iter()
        .cloned()
        .collect();

    Ok(AnimationView {
        bucket_width_days: width.days(),
        anchor,
        frames,
        legend,
        view: MapView {
            center_lat,
            center_lon,
            zoom,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::assign_colors;
    use crate::types::PositionRecord;
    use chrono::TimeZone;

    fn rec(id: &str, day: u32, hour: u32) -> PositionRecord {
        PositionRecord {
            individual_id: id.to_string(),
            timestamp: Utc.with_ymd_and_hms(2020, 1, day, hour, 0, 0).unwrap(),
            latitude: day as f64,
            longitude: hour as f64,
        }
    }

    fn week() -> BucketWidth {
        BucketWidth::new(7, &BucketRange::default()).unwrap()
    }

    #[test]
    fn test_bucket_width_bounds() {
        let range = BucketRange::default();
        assert!(BucketWidth::new(1, &range).is_ok());
        assert!(BucketWidth::new(30, &range).is_ok());
        assert!(matches!(
            BucketWidth::new(0, &range),
            Err(MigrationError::InvalidBucketWidth { days: 0, .. })
        ));
        assert!(BucketWidth::new(31, &range).is_err());
        assert_eq!(BucketWidth::default().days(), 7);
    }

    #[test]
    fn test_anchor_is_midnight_of_earliest_day() {
        let set = TrackSet::group(&[rec("a", 3, 15), rec("a", 9, 23), rec("a", 10, 1)]);
        let frames = bin_frames(&set, week()).unwrap();

        let labels: Vec<&str> = frames.iter().map(|f| f.bucket_label.as_str()).collect();
        // Jan 3 00:00 anchor: [3, 10) and [10, 17)
        assert_eq!(labels, vec!["2020-01-03", "2020-01-10"]);
        assert_eq!(frames[0].positions.len(), 2);
    }

    #[test]
    fn test_frames_skip_empty_buckets() {
        let set = TrackSet::group(&[rec("a", 1, 0), rec("a", 29, 0)]);
        let frames = bin_frames(&set, week()).unwrap();

        let keys: Vec<i64> = frames.iter().map(|f| f.bucket_key).collect();
        assert_eq!(keys, vec![0, 4]);
        assert_eq!(frames[1].bucket_label, "2020-01-29");
    }

    #[test]
    fn test_positions_ordered_by_track_then_time() {
        let set = TrackSet::group(&[rec("b", 2, 0), rec("a", 1, 0), rec("b", 1, 0)]);
        let frames = bin_frames(&set, week()).unwrap();
        let order: Vec<(&str, u32)> = frames[0]
            .positions
            .iter()
            .map(|p| (p.individual_id.as_str(), p.latitude as u32))
            .collect();

        assert_eq!(order, vec![("b", 1), ("b", 2), ("a", 1)]);
    }

    #[test]
    fn test_empty_set_has_no_data() {
        let err = bin_frames(&TrackSet::default(), week()).unwrap_err();
        assert!(matches!(err, MigrationError::NoDataInRange));
    }

    #[test]
    fn test_animation_view_colors_and_legend() {
        let all = TrackSet::group(&[rec("a", 1, 0), rec("b", 2, 0), rec("c", 3, 0)]);
        let colors = assign_colors(all.individual_ids());
        let selected = all.select(&crate::tracks::Selection::only(["c", "a"])).unwrap();

        let view = build_animation_view(&selected, week(), &colors, 5).unwrap();

        assert_eq!(view.bucket_width_days, 7);
        assert_eq!(view.position_count(), 2);
        assert_eq!(view.legend.len(), 2);
        assert_eq!(view.legend[0].individual_id, "a");
        let c = view.frames[0]
            .positions
            .iter()
            .find(|p| p.individual_id == "c")
            .unwrap();
        assert_eq!(c.color.as_deref(), colors.color_of("c"));
        assert_eq!(view.view.zoom, 5);
    }
}
