//! Migration Core - Track processing for animal-tracking telemetry
//!
//! Turns raw GPS fixes into two renderable views:
//! 1. **Static paths**: one colored polyline per individual with start/end markers
//! 2. **Animation frames**: fixes binned into fixed-width time buckets
//!
//! Stages: normalize → group → color → {static paths, animation frames}.

pub mod error;
pub mod types;
pub mod normalizer;
pub mod tracks;
pub mod palette;
pub mod static_paths;
pub mod animation;
pub mod dataset;
pub mod config;
pub mod report;
pub mod pipeline;
pub mod export;

// Re-export key types for convenience
pub use error::{MigrationError, Result};
pub use types::{ColumnSchema, PositionRecord, RawRow, ViewMode};
pub use normalizer::{parse_timestamp, NormalizedBatch, RecordNormalizer, RowRejection};
pub use tracks::{Selection, Track, TrackSet};
pub use palette::{assign_colors, ColorAssignment, Palette, PALETTE_VERSION};
pub use static_paths::{build_static_view, PathGeometry, StaticView, ZoomPolicy};
pub use animation::{bin_frames, build_animation_view, AnimationFrame, AnimationView, BucketRange, BucketWidth};
pub use dataset::DataSource;
pub use config::PipelineConfig;
pub use report::IngestReport;
pub use pipeline::{MigrationPipeline, PipelineOutput, PreparedDataset, RenderedView};
pub use export::ViewExport;
