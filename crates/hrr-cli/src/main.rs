//! hrr: command-line shell for hepatic-renal ratio analysis.
//!
//! Works on one directory of ultrasound images at a time. The directory's
//! results table (`LRR_results.csv` by default) is created on first use
//! and updated by every editing command.
//!
//! # Usage
//!
//! ```text
//! hrr --dir scans init
//! hrr --dir scans roi add p01.tif --structure liver --roi 120,88,14,9.5
//! hrr --dir scans roi undo p01.tif --structure liver
//! hrr --dir scans roi clear p01.tif
//! hrr --dir scans analyze --histograms
//! hrr --dir scans status --json
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use hrr_io::{AnalysisConfig, BatchProcessor, FileRasters, PngHistogramRenderer, ResultStore};
use hrr_pipeline::{
    AnnotationStatus, ClearTarget, EllipseRoi, ImageRecord, RecomputeStatus, Structure,
};
use serde::Serialize;

/// Annotate liver and kidney ROIs and compute hepatic-renal ratios.
#[derive(Parser)]
#[command(name = "hrr", version)]
struct Cli {
    /// Analysis directory holding the images and the results table.
    #[arg(long, short, default_value = ".")]
    dir: PathBuf,

    /// Full analysis config as a JSON string.
    ///
    /// Missing fields take their defaults. The JSON must be a valid
    /// `AnalysisConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Log per-record details (same as `RUST_LOG=debug`).
    #[arg(long, short)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the results table from a directory scan, or load it.
    Init,

    /// List every record with its annotation status and ratio.
    Status {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Edit the ROIs of one image.
    Roi {
        #[command(subcommand)]
        action: RoiAction,
    },

    /// Recompute every record and save the table.
    Analyze {
        /// Also write `<image>_histogram.png` figures.
        #[arg(long)]
        histograms: bool,

        /// Print the batch summary as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum RoiAction {
    /// Append an ellipse to a structure.
    Add {
        /// Image path or file name.
        image: String,

        /// `liver` or `kidney`.
        #[arg(long)]
        structure: Structure,

        /// Ellipse as `center_x,center_y,radius_x,radius_y` in pixels.
        #[arg(long, value_parser = parse_roi, allow_hyphen_values = true)]
        roi: EllipseRoi,

        /// Measure the image right away instead of waiting for `analyze`.
        #[arg(long)]
        measure: bool,
    },

    /// Remove the most recently added ellipse of a structure.
    Undo {
        /// Image path or file name.
        image: String,

        /// `liver` or `kidney`.
        #[arg(long)]
        structure: Structure,
    },

    /// Remove all ellipses of one structure, or of both.
    Clear {
        /// Image path or file name.
        image: String,

        /// `liver` or `kidney`; both when omitted.
        #[arg(long)]
        structure: Option<Structure>,
    },
}

/// One line of `status` output.
#[derive(Serialize)]
struct StatusRow<'a> {
    file_path: &'a str,
    status: AnnotationStatus,
    liver_rois: usize,
    kidney_rois: usize,
    mean_liver: Option<f64>,
    mean_kidney: Option<f64>,
    ratio: Option<f64>,
    ratio_std: Option<f64>,
}

impl<'a> StatusRow<'a> {
    fn new(record: &'a ImageRecord) -> Self {
        Self {
            file_path: record.file_path(),
            status: record.status(),
            liver_rois: record.rois(Structure::Liver).len(),
            kidney_rois: record.rois(Structure::Kidney).len(),
            mean_liver: record.mean(Structure::Liver),
            mean_kidney: record.mean(Structure::Kidney),
            ratio: record.ratio(),
            ratio_std: record.ratio_std(),
        }
    }
}

fn parse_roi(text: &str) -> Result<EllipseRoi, String> {
    let parts = text
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("expected four comma-separated numbers: {e}"))?;
    let [cx, cy, rx, ry] = parts[..] else {
        return Err(format!(
            "expected four comma-separated numbers, got {}",
            parts.len()
        ));
    };
    EllipseRoi::new(cx, cy, rx, ry).map_err(|e| e.to_string())
}

/// Build an [`AnalysisConfig`] from `--config-json`, or the defaults.
fn config_from_cli(cli: &Cli) -> Result<AnalysisConfig, String> {
    cli.config_json.as_ref().map_or_else(
        || Ok(AnalysisConfig::default()),
        |json| serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}")),
    )
}

/// Find the record for `image`, matching the stored path exactly or, failing
/// that, by file name.
fn find_record(store: &ResultStore, image: &str) -> Result<ImageRecord, String> {
    if let Some(record) = store.record(image) {
        return Ok(record.clone());
    }
    let mut by_name = store
        .records()
        .iter()
        .filter(|r| Path::new(r.file_path()).file_name() == Path::new(image).file_name());
    match (by_name.next(), by_name.next()) {
        (Some(record), None) => Ok(record.clone()),
        (Some(_), Some(_)) => Err(format!("{image} matches more than one record")),
        (None, _) => Err(format!(
            "{image} is not in {}",
            store.table_path().display()
        )),
    }
}

fn print_status(store: &ResultStore, json: bool) -> Result<(), String> {
    let rows: Vec<_> = store.records().iter().map(StatusRow::new).collect();
    if json {
        let text = serde_json::to_string_pretty(&rows)
            .map_err(|e| format!("Error serializing status: {e}"))?;
        println!("{text}");
        return Ok(());
    }

    let cell = |v: Option<f64>| v.map_or_else(|| "-".to_owned(), |v| format!("{v:.4}"));
    for row in &rows {
        println!(
            "{:<12} liver={} kidney={} mean_liver={} mean_kidney={} ratio={} ±{}  {}",
            status_label(row.status),
            row.liver_rois,
            row.kidney_rois,
            cell(row.mean_liver),
            cell(row.mean_kidney),
            cell(row.ratio),
            cell(row.ratio_std),
            row.file_path,
        );
    }
    Ok(())
}

const fn status_label(status: AnnotationStatus) -> &'static str {
    match status {
        AnnotationStatus::Unannotated => "unannotated",
        AnnotationStatus::Pending => "pending",
        AnnotationStatus::Measured => "measured",
    }
}

fn edit_roi(store: &mut ResultStore, action: RoiAction) -> Result<(), String> {
    let (image, measure) = match &action {
        RoiAction::Add { image, measure, .. } => (image.clone(), *measure),
        RoiAction::Undo { image, .. } | RoiAction::Clear { image, .. } => (image.clone(), false),
    };
    let mut record = find_record(store, &image)?;

    match action {
        RoiAction::Add { structure, roi, .. } => record.add_roi(structure, roi),
        RoiAction::Undo { structure, .. } => {
            if record.remove_last_roi(structure).is_none() {
                eprintln!("{}: no {structure} ROI to remove", record.file_path());
            }
        }
        RoiAction::Clear { structure, .. } => {
            record.clear(structure.map_or(ClearTarget::Both, ClearTarget::Only));
        }
    }

    // The edit is saved even when measuring fails.
    let measured = measure.then(|| record.recompute(&FileRasters));
    store.upsert(&record).map_err(|e| e.to_string())?;
    print_status_line(&record);

    match measured {
        None => {}
        Some(Ok(RecomputeStatus::IncompleteAnnotation)) => {
            eprintln!("{}: waiting for both structures", record.file_path());
        }
        Some(Ok(RecomputeStatus::Computed { ratio_defined })) => {
            if !ratio_defined {
                eprintln!("{}: ratio undefined", record.file_path());
            }
        }
        Some(Err(e)) => return Err(format!("ROI saved, but measuring failed: {e}")),
    }
    Ok(())
}

fn print_status_line(record: &ImageRecord) {
    let rois = |s: Structure| record.rois(s).len();
    println!(
        "{}: {} liver / {} kidney ROIs, {}",
        record.file_path(),
        rois(Structure::Liver),
        rois(Structure::Kidney),
        status_label(record.status()),
    );
}

fn run(cli: Cli) -> Result<(), String> {
    let config = config_from_cli(&cli)?;
    let mut store =
        ResultStore::open_or_initialize(&cli.dir, &config).map_err(|e| e.to_string())?;

    match cli.command {
        Command::Init => {
            println!(
                "{}: {} records",
                store.table_path().display(),
                store.len()
            );
            Ok(())
        }
        Command::Status { json } => print_status(&store, json),
        Command::Roi { action } => edit_roi(&mut store, action),
        Command::Analyze { histograms, json } => {
            let processor = BatchProcessor::new(
                FileRasters,
                PngHistogramRenderer::new(config.histogram.clone()),
            );
            let summary = processor
                .run_all(&mut store, histograms)
                .map_err(|e| e.to_string())?;
            if json {
                let text = serde_json::to_string_pretty(&summary)
                    .map_err(|e| format!("Error serializing summary: {e}"))?;
                println!("{text}");
            } else {
                println!(
                    "computed {}, incomplete {}, failed {}, histogram failures {}",
                    summary.computed, summary.incomplete, summary.failed, summary.render_failures,
                );
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    let _ = logger.format_timestamp_secs().try_init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}
