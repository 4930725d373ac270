//! JSON exporter for external renderers.
//!
//! Wraps a [`PipelineOutput`] with enough metadata for a map or chart
//! renderer to draw it without re-running the pipeline.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{MigrationError, Result};
use crate::palette::PALETTE_VERSION;
use crate::pipeline::{PipelineOutput, RenderedView};
use crate::report::IngestReport;

/// Complete renderer hand-off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewExport {
    /// Crate version that produced the export
    pub generator: String,

    /// Color table identifier
    pub palette_version: String,

    pub report: IngestReport,

    pub view: RenderedView,
}

impl ViewExport {
    pub fn new(output: PipelineOutput) -> Self {
        Self {
            generator: format!("migration_core {}", env!("CARGO_PKG_VERSION")),
            palette_version: PALETTE_VERSION.to_string(),
            report: output.report,
            view: output.view,
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| MigrationError::Export(e.to_string()))
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = self.to_json()?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
