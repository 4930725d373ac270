//! Migration Pipeline - One explicit invocation per view change
//!
//! ```text
//! raw rows ─► RecordNormalizer ─► TrackSet::group ─┬─► build_static_view
//!                                      │           │
//!                               assign_colors ─────┴─► build_animation_view
//! ```
//!
//! All inputs arrive as parameters and all outputs are returned as values.
//! Nothing is cached between invocations, so concurrent calls need no
//! coordination.
//!
//! # Usage
//!
//! ```ignore
//! use migration_core::{MigrationPipeline, PipelineConfig};
//!
//! let pipeline = MigrationPipeline::new(PipelineConfig::default());
//! let output = pipeline.run_from_source()?;
//! output.report.print();
//! ```

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::animation::{build_animation_view, AnimationView, BucketWidth};
use crate::config::PipelineConfig;
use crate::error::{MigrationError, Result};
use crate::normalizer::RecordNormalizer;
use crate::palette::{ColorAssignment, Palette};
use crate::report::IngestReport;
use crate::static_paths::{build_static_view, StaticView, ZoomPolicy};
use crate::tracks::{Selection, TrackSet};
use crate::types::{RawRow, ViewMode};

/// The rendered result of an invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RenderedView {
    Static(StaticView),
    Animated(AnimationView),
}

impl RenderedView {
    pub fn mode(&self) -> ViewMode {
        match self {
            RenderedView::Static(_) => ViewMode::Static,
            RenderedView::Animated(_) => ViewMode::Animated,
        }
    }
}

/// Everything one invocation produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub report: IngestReport,
    pub view: RenderedView,
}

/// A normalized, grouped and colored dataset.
///
/// Views are derived from it on demand; it holds no selection state.
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    pub tracks: TrackSet,
    pub colors: ColorAssignment,
    pub report: IngestReport,
}

impl PreparedDataset {
    /// Static paths for the selected individuals.
    pub fn static_view(&self, selection: &Selection, zoom: &ZoomPolicy) -> Result<StaticView> {
        let selected = self.tracks.select(selection)?;
        build_static_view(&selected, &self.colors, zoom)
    }

    /// Animation frames for the selected individuals.
    ///
    /// A dataset with no accepted records is `NoDataInRange`, whatever the
    /// selection.
    pub fn animation_view(
        &self,
        selection: &Selection,
        width: BucketWidth,
        zoom: u8,
    ) -> Result<AnimationView> {
        if self.tracks.is_empty() {
            return Err(MigrationError::NoDataInRange);
        }
        let selected = self.tracks.select(selection)?;
        build_animation_view(&selected, width, &self.colors, zoom)
    }
}

/// Stateless pipeline driven by a [`PipelineConfig`].
#[derive(Debug, Clone, Default)]
pub struct MigrationPipeline {
    config: PipelineConfig,
    palette: Palette,
}

impl MigrationPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            palette: Palette::default(),
        }
    }

    /// Overrides the color table.
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Normalizes, groups and colors `rows`.
    ///
    /// Colors cover every individual in the dataset, so they stay put when
    /// the selection changes.
    pub fn prepare(&self, rows: &[RawRow]) -> Result<PreparedDataset> {
        if rows.len() > self.config.max_rows {
            return Err(MigrationError::DatasetTooLarge {
                rows: rows.len(),
                limit: self.config.max_rows,
            });
        }

        let normalizer = RecordNormalizer::new(self.config.columns.clone()).strict(self.config.strict);
        let batch = normalizer.normalize(rows)?;
        let tracks = TrackSet::group(&batch.records);
        let colors = self.palette.assign(tracks.individual_ids());
        let report = IngestReport::new(self.config.data_source.to_string(), &batch, &tracks, &colors);

        info!(
            "Prepared {} individuals from {} rows ({} rejected)",
            tracks.len(),
            batch.total_rows,
            batch.rejected.len()
        );

        Ok(PreparedDataset {
            tracks,
            colors,
            report,
        })
    }

    /// Runs the configured view over `rows`.
    pub fn run(&self, rows: &[RawRow]) -> Result<PipelineOutput> {
        // Validate cheap parameters before touching the data
        let width = self.config.bucket_width()?;
        let prepared = self.prepare(rows)?;
        let selection = self.config.selection();

        let view = match self.config.view_mode {
            ViewMode::Static => {
                RenderedView::Static(prepared.static_view(&selection, &self.config.zoom)?)
            }
            ViewMode::Animated => RenderedView::Animated(prepared.animation_view(
                &selection,
                width,
                self.config.zoom.animated_zoom,
            )?),
        };

        Ok(PipelineOutput {
            report: prepared.report,
            view,
        })
    }

    /// Loads rows from the configured source, then runs.
    pub fn run_from_source(&self) -> Result<PipelineOutput> {
        let rows = self.config.data_source.load(self.config.max_rows)?;
        self.run(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::read_csv;

    const CSV: &str = "\
individual-local-identifier,timestamp,location-lat,location-long
A,2020-01-01,10,10
A,2020-01-10,12,12
B,2020-01-05,20,20
B,bad,20,20
";

    fn rows() -> Vec<RawRow> {
        read_csv(CSV.as_bytes(), 100).unwrap()
    }

    #[test]
    fn test_static_run() {
        let output = MigrationPipeline::new(PipelineConfig::default()).run(&rows()).unwrap();

        assert_eq!(output.report.rejected_rows(), 1);
        match output.view {
            RenderedView::Static(view) => {
                assert_eq!(view.paths.len(), 2);
                assert_eq!(view.view.zoom, 6);
            }
            other => panic!("expected static view, got {:?}", other.mode()),
        }
    }

    #[test]
    fn test_animated_run() {
        let config = PipelineConfig {
            view_mode: ViewMode::Animated,
            ..Default::default()
        };
        let output = MigrationPipeline::new(config).run(&rows()).unwrap();

        match output.view {
            RenderedView::Animated(view) => {
                let labels: Vec<&str> = view.frames.iter().map(|f| f.bucket_label.as_str()).collect();
                assert_eq!(labels, vec!["2020-01-01", "2020-01-08"]);
                assert_eq!(view.view.zoom, 5);
            }
            other => panic!("expected animated view, got {:?}", other.mode()),
        }
    }

    #[test]
    fn test_colors_stable_across_selection() {
        let pipeline = MigrationPipeline::default();
        let prepared = pipeline.prepare(&rows()).unwrap();

        let all = prepared.static_view(&Selection::All, &ZoomPolicy::default()).unwrap();
        let only_b = prepared
            .static_view(&Selection::only(["B"]), &ZoomPolicy::default())
            .unwrap();

        assert_eq!(all.paths[1].color, only_b.paths[0].color);
    }

    #[test]
    fn test_empty_selection_result() {
        let config = PipelineConfig {
            selected_individuals: Some(vec![]),
            ..Default::default()
        };
        let err = MigrationPipeline::new(config).run(&rows()).unwrap_err();
        assert!(matches!(err, MigrationError::EmptySelection));
    }

    #[test]
    fn test_all_rows_rejected_animation_has_no_data() {
        let rows = read_csv(
            "individual-local-identifier,timestamp,location-lat,location-long\nA,never,1,1\n".as_bytes(),
            10,
        )
        .unwrap();
        let config = PipelineConfig {
            view_mode: ViewMode::Animated,
            ..Default::default()
        };
        let err = MigrationPipeline::new(config).run(&rows).unwrap_err();
        assert!(matches!(err, MigrationError::NoDataInRange));
    }

    #[test]
    fn test_non_utf8_row_reported_not_fatal() {
        let bytes: &[u8] = b"individual-local-identifier,timestamp,location-lat,location-long\n\
A,2020-01-01,10,10\n\
Ren\xe9,2020-01-02,11,11\n\
A,2020-01-03,12,12\n";
        let rows = read_csv(bytes, 100).unwrap();

        let output = MigrationPipeline::default().run(&rows).unwrap();

        assert_eq!(output.report.accepted_rows, 2);
        assert_eq!(output.report.rejected_rows(), 1);
        assert_eq!(output.report.rejected[0].row, 1);
        assert_eq!(output.report.rejected[0].reason, "is not valid UTF-8");
        match output.view {
            RenderedView::Static(view) => assert_eq!(view.paths[0].coordinates.len(), 2),
            other => panic!("expected static view, got {:?}", other.mode()),
        }
    }

    #[test]
    fn test_row_ceiling() {
        let config = PipelineConfig {
            max_rows: 2,
            ..Default::default()
        };
        let err = MigrationPipeline::new(config).run(&rows()).unwrap_err();
        assert!(matches!(
            err,
            MigrationError::DatasetTooLarge { rows: 4, limit: 2 }
        ));
    }

    #[test]
    fn test_invalid_width_rejected_up_front() {
        let config = PipelineConfig {
            bucket_width_days: 0,
            ..Default::default()
        };
        let err = MigrationPipeline::new(config).run(&rows()).unwrap_err();
        assert!(matches!(err, MigrationError::InvalidBucketWidth { .. }));
    }

    #[test]
    fn test_sample_runs_both_views() {
        for mode in [ViewMode::Static, ViewMode::Animated] {
            let config = PipelineConfig {
                view_mode: mode,
                ..Default::default()
            };
            let output = MigrationPipeline::new(config).run_from_source().unwrap();
            assert_eq!(output.view.mode(), mode);
            assert_eq!(output.report.rejected_rows(), 0);
            assert_eq!(output.report.individual_count(), 3);
        }
    }
}
