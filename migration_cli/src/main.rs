//! Migration Viz CLI
//!
//! Loads animal-tracking telemetry, builds the static or animated view and
//! hands it to a renderer as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use migration_core::dataset::DataSource;
use migration_core::{
    MigrationError, MigrationPipeline, PipelineConfig, RenderedView, ViewExport, ViewMode,
};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Animal migration track processor
#[derive(Parser, Debug)]
#[command(name = "migration-viz")]
#[command(about = "Build static paths or animation frames from animal-tracking CSV", long_about = None)]
struct Args {
    /// Data source: "sample" or a path to a Movebank-style CSV
    #[arg(long)]
    source: Option<String>,

    /// JSON config file (flags override its values)
    #[arg(short, long)]
    config: Option<String>,

    /// Individual to include (repeatable; default: all)
    #[arg(short, long = "individual")]
    individuals: Vec<String>,

    /// Select no individuals at all
    #[arg(long, conflicts_with = "individuals")]
    none: bool,

    /// View to build (static, animated)
    #[arg(long)]
    view: Option<ViewMode>,

    /// Animation frame interval in days
    #[arg(short, long)]
    bucket_days: Option<u32>,

    /// Row ceiling for the input dataset
    #[arg(long)]
    max_rows: Option<usize>,

    /// Abort on the first malformed row
    #[arg(long)]
    strict: bool,

    /// List individuals in the dataset and exit
    #[arg(long)]
    list: bool,

    /// Write the renderer export to this JSON file
    #[arg(long)]
    export: Option<String>,

    /// Print the renderer export to stdout
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Layers flags over the config file (or defaults).
    fn into_config(self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path))?,
            None => PipelineConfig::default(),
        };

        if let Some(source) = &self.source {
            config.data_source = DataSource::parse(source);
        }
        if self.none {
            config.selected_individuals = Some(Vec::new());
        } else if !self.individuals.is_empty() {
            config.selected_individuals = Some(self.individuals);
        }
        if let Some(view) = self.view {
            config.view_mode = view;
        }
        if let Some(days) = self.bucket_days {
            config.bucket_width_days = days;
        }
        if let Some(max_rows) = self.max_rows {
            config.max_rows = max_rows;
        }
        if self.strict {
            config.strict = true;
        }

        Ok(config)
    }
}

fn list_individuals(pipeline: &MigrationPipeline) -> Result<()> {
    let rows = pipeline.config().data_source.load(pipeline.config().max_rows)?;
    let prepared = pipeline.prepare(&rows)?;
    prepared.report.print();
    Ok(())
}

fn summarize(view: &RenderedView) {
    match view {
        RenderedView::Static(v) => {
            info!(
                "Static view: {} paths, center=({:.4}, {:.4}), zoom={}",
                v.paths.len(),
                v.view.center_lat,
                v.view.center_lon,
                v.view.zoom
            );
        }
        RenderedView::Animated(v) => {
            info!(
                "Animated view: {} frames of {} days, {} positions",
                v.frame_count(),
                v.bucket_width_days,
                v.position_count()
            );
            if let (Some(first), Some(last)) = (v.frames.first(), v.frames.last()) {
                info!("  {} → {}", first.bucket_label, last.bucket_label);
            }
        }
    }
}

fn run(args: Args) -> Result<()> {
    let list = args.list;
    let json = args.json;
    let export_path = args.export.clone();
    let config = args.into_config()?;

    info!(
        "Source: {} | view: {} | bucket: {} days",
        config.data_source, config.view_mode, config.bucket_width_days
    );

    let pipeline = MigrationPipeline::new(config);

    if list {
        return list_individuals(&pipeline);
    }

    let output = match pipeline.run_from_source() {
        Ok(output) => output,
        Err(MigrationError::EmptySelection) => {
            anyhow::bail!("No individuals selected - choose at least one with --individual");
        }
        Err(MigrationError::NoDataInRange) => {
            anyhow::bail!("No data to animate - the dataset has no valid records");
        }
        Err(e) => return Err(e.into()),
    };

    if !json {
        output.report.print();
        summarize(&output.view);
    }

    let export = ViewExport::new(output);
    if let Some(path) = &export_path {
        export
            .write_to_file(path)
            .with_context(|| format!("Failed to write export {}", path))?;
        info!("Exported view to {}", path);
    }
    if json {
        println!("{}", export.to_json()?);
    }

    Ok(())
}

fn main() {
    let args = Args::parse();

    // Initialize logging; stdout stays clean for --json
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    if let Err(e) = run(args) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
