//! Ingest report - what was loaded, what was rejected
//!
//! Summarizes a normalization + grouping pass so the caller can tell the
//! user how many rows were dropped and why, and which individuals exist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalizer::{NormalizedBatch, RowRejection};
use crate::palette::ColorAssignment;
use crate::tracks::TrackSet;

/// Per-individual summary line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualSummary {
    pub individual_id: String,
    pub records: usize,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub color: String,
}

/// Outcome of loading one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub source: String,
    pub total_rows: usize,
    pub accepted_rows: usize,
    pub rejected: Vec<RowRejection>,
    pub individuals: Vec<IndividualSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_span: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl IngestReport {
    pub fn new(
        source: impl Into<String>,
        batch: &NormalizedBatch,
        tracks: &TrackSet,
        colors: &ColorAssignment,
    ) -> Self {
        let individuals = tracks
            .tracks()
            .iter()
            .filter_map(|t| {
                let (first_seen, last_seen) = t.time_span()?;
                Some(IndividualSummary {
                    individual_id: t.individual_id().to_string(),
                    records: t.len(),
                    first_seen,
                    last_seen,
                    color: colors.color_of(t.individual_id()).unwrap_or_default().to_string(),
                })
            })
            .collect();

        Self {
            source: source.into(),
            total_rows: batch.total_rows,
            accepted_rows: batch.records.len(),
            rejected: batch.rejected.clone(),
            individuals,
            time_span: tracks.time_span(),
        }
    }

    pub fn rejected_rows(&self) -> usize {
        self.rejected.len()
    }

    pub fn individual_count(&self) -> usize {
        self.individuals.len()
    }

    /// Percentage of rows rejected.
    pub fn rejection_rate(&self) -> f64 {
        if self.total_rows > 0 {
            self.rejected.len() as f64 / self.total_rows as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Print formatted report to console
    pub fn print(&self) {
        let span = match self.time_span {
            Some((a, b)) => format!("{} → {}", a.format("%Y-%m-%d"), b.format("%Y-%m-%d")),
            None => "-".to_string(),
        };

        println!();
        println!("╔══════════════════════════════════════════════════════════════╗");
        println!("║               MIGRATION INGEST REPORT                        ║");
        println!("╠══════════════════════════════════════════════════════════════╣");
        println!("║ Source:      {:<48}║", truncate(&self.source, 48));
        println!("║ Total Rows:            {:>10}                            ║", self.total_rows);
        println!("║ Accepted:              {:>10}                            ║", self.accepted_rows);
        println!("║ Rejected:              {:>10} ({:>5.1}%)                   ║",
            self.rejected_rows(), self.rejection_rate());
        println!("║ Individuals:           {:>10}                            ║", self.individual_count());
        println!("║ Time Span:   {:<48}║", span);
        println!("╚══════════════════════════════════════════════════════════════╝");

        if !self.individuals.is_empty() {
            println!();
            println!("  Individual              Records    Color     First Seen");
            println!("─────────────────────────────────────────────────────────────");
            for ind in &self.individuals {
                println!("  {:<22}  {:>7}    {:<8}  {}",
                    truncate(&ind.individual_id, 22),
                    ind.records,
                    ind.color,
                    ind.first_seen.format("%Y-%m-%d %H:%M")
                );
            }
        }

        if !self.rejected.is_empty() {
            println!();
            println!("Rejected rows (first 10):");
            for r in self.rejected.iter().take(10) {
                println!("  row {:>6}: {} {}", r.row, r.field, r.reason);
            }
        }
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
