//! Static Path Builder - Polylines and start/end markers per individual
//!
//! Produces one [`PathGeometry`] per selected track, plus a map center
//! (arithmetic mean of every selected fix), a zoom hint and the geographic
//! bounds of the selection.
//!
//! # Zoom heuristic
//!
//! More points are taken to mean wider geographic spread: when the selected
//! record count exceeds [`ZoomPolicy::point_threshold`] the wide zoom is used,
//! otherwise the close zoom (sparse or single-point data).

use chrono::{DateTime, Utc};
use geo::{BoundingRect, Coord, LineString, MultiPoint, Point, Rect};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MigrationError, Result};
use crate::palette::ColorAssignment;
use crate::tracks::{Track, TrackSet};

/// Fallback when an individual is missing from the color assignment.
const UNASSIGNED_COLOR: &str = "#7f7f7f";

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Zoom selection for the static map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomPolicy {
    /// Record count above which the wide zoom is used (default: 1)
    pub point_threshold: usize,

    /// Zoom for spread-out data (default: 6)
    pub wide_zoom: u8,

    /// Zoom for sparse or single-point data (default: 10)
    pub close_zoom: u8,

    /// Zoom for the animated map (default: 5)
    pub animated_zoom: u8,
}

impl Default for ZoomPolicy {
    fn default() -> Self {
        Self {
            point_threshold: 1,
            wide_zoom: 6,
            close_zoom: 10,
            animated_zoom: 5,
        }
    }
}

impl ZoomPolicy {
    /// Picks a zoom level for `record_count` selected fixes.
    pub fn zoom_for(&self, record_count: usize) -> u8 {
        if record_count > self.point_threshold {
            self.wide_zoom
        } else {
            self.close_zoom
        }
    }
}

// =============================================================================
// GEOMETRY TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Start,
    End,
}

impl MarkerKind {
    /// Icon color used by the map renderer.
    pub fn icon_color(&self) -> &'static str {
        match self {
            MarkerKind::Start => "green",
            MarkerKind::End => "red",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            MarkerKind::Start => "Start",
            MarkerKind::End => "End",
        }
    }
}

/// A start or end marker on a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub kind: MarkerKind,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    pub icon_color: String,
    pub tooltip: String,
}

impl Marker {
    fn new(kind: MarkerKind, individual_id: &str, lat: f64, lon: f64, ts: DateTime<Utc>) -> Self {
        Self {
            kind,
            latitude: lat,
            longitude: lon,
            timestamp: ts,
            icon_color: kind.icon_color().to_string(),
            tooltip: format!(
                "{} - Animal {}\n{}",
                kind.title(),
                individual_id,
                ts.format("%Y-%m-%d %H:%M:%S")
            ),
        }
    }

    pub fn coord(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// One individual's full movement history as a colored polyline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathGeometry {
    pub individual_id: String,
    pub color: String,
    /// `(lat, lon)` pairs in chronological order
    pub coordinates: Vec<(f64, f64)>,
    pub start: Marker,
    pub end: Marker,
}

impl PathGeometry {
    /// Builds the geometry for a non-empty track.
    pub fn from_track(track: &Track, color: &str) -> Option<Self> {
        let first = track.first()?;
        let last = track.last()?;
        let id = track.individual_id();

        Some(Self {
            individual_id: id.to_string(),
            color: color.to_string(),
            coordinates: track.coordinates(),
            start: Marker::new(MarkerKind::Start, id, first.latitude, first.longitude, first.timestamp),
            end: Marker::new(MarkerKind::End, id, last.latitude, last.longitude, last.timestamp),
        })
    }

    /// The path as a `geo` line string (x = longitude, y = latitude).
    pub fn to_line_string(&self) -> LineString<f64> {
        self.coordinates
            .iter()
            .map(|&(lat, lon)| Coord { x: lon, y: lat })
            .collect::<Vec<_>>()
            .into()
    }

    /// True for a single-fix track.
    pub fn is_degenerate(&self) -> bool {
        self.coordinates.len() == 1
    }
}

/// Geographic bounding box of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl From<Rect<f64>> for GeoBounds {
    fn from(rect: Rect<f64>) -> Self {
        Self {
            min_lat: rect.min().y,
            min_lon: rect.min().x,
            max_lat: rect.max().y,
            max_lon: rect.max().x,
        }
    }
}

/// Map center as `(lat, lon)` plus zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: u8,
}

/// Everything the static map renderer needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticView {
    pub paths: Vec<PathGeometry>,
    pub view: MapView,
    pub bounds: GeoBounds,
    pub record_count: usize,
}

// =============================================================================
// BUILDER
// =============================================================================

/// Arithmetic mean of every fix in `tracks`, as `(lat, lon)`.
pub fn mean_center(tracks: &TrackSet) -> Option<(f64, f64)> {
    let n = tracks.record_count();
    if n == 0 {
        return None;
    }
    let (lat_sum, lon_sum) = tracks
        .tracks()
        .iter()
        .flat_map(|t| t.records())
        .fold((0.0, 0.0), |(la, lo), r| (la + r.latitude, lo + r.longitude));
    Some((lat_sum / n as f64, lon_sum / n as f64))
}

/// Bounding box of every fix in `tracks`.
pub fn bounds_of(tracks: &TrackSet) -> Option<GeoBounds> {
    let points: Vec<Point<f64>> = tracks
        .tracks()
        .iter()
        .flat_map(|t| t.records())
        .map(|r| Point::new(r.longitude, r.latitude))
        .collect();
    MultiPoint::new(points).bounding_rect().map(GeoBounds::from)
}

/// Builds the static view for an already-selected track set.
///
/// `selected` must be the output of [`TrackSet::select`]; an empty set is
/// reported as `EmptySelection`.
pub fn build_static_view(
    selected: &TrackSet,
    colors: &ColorAssignment,
    zoom: &ZoomPolicy,
) -> Result<StaticView> {
    let paths: Vec<PathGeometry> = selected
        .tracks()
        .iter()
        .filter_map(|track| {
            let color = colors
                .color_of(track.individual_id())
                .unwrap_or(UNASSIGNED_COLOR);
            PathGeometry::from_track(track, color)
        })
        .collect();

    let (center_lat, center_lon) = mean_center(selected).ok_or(MigrationError::EmptySelection)?;
    let bounds = bounds_of(selected).ok_or(MigrationError::EmptySelection)?;
    let record_count = selected.record_count();

    debug!(
        "Built {} paths from {} records, center=({:.4}, {:.4})",
        paths.len(),
        record_count,
        center_lat,
        center_lon
    );

    Ok(StaticView {
        paths,
        view: MapView {
            center_lat,
            center_lon,
            zoom: zoom.zoom_for(record_count),
        },
        bounds,
        record_count,
    })
}
