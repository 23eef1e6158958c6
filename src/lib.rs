//! coco2yolo: convert COCO detection annotations into a YOLO dataset.
//!
//! The core reads a COCO JSON document, maps category ids to dense class
//! indices, converts every pixel box into a normalized, clamped YOLO box and
//! writes one label file per image. Around it, the pipeline splits images
//! into train/val/test, copies or resizes the image files and writes the
//! Ultralytics `data.yaml`.
//!
//! # Modules
//!
//! - [`coco`]: COCO document model and loader
//! - [`geometry`]: pixel and normalized box types
//! - [`yolo`]: class mapping, box conversion and label writing
//! - [`split`]: seeded train/val/test partitioning
//! - [`images`]: copying and resizing source images
//! - [`pipeline`]: the end-to-end run and its report
//! - [`error`]: error types for coco2yolo operations

pub mod coco;
pub mod error;
pub mod geometry;
pub mod images;
pub mod pipeline;
pub mod split;
pub mod yolo;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

pub use error::ConvertError;
pub use pipeline::{convert_dataset, run_pipeline, PipelineOptions, RunReport};

use images::ResizeTarget;
use split::{SplitRatios, DEFAULT_SEED};

/// The coco2yolo CLI application.
#[derive(Parser)]
#[command(name = "coco2yolo")]
#[command(version, author, about)]
struct Cli {
    /// COCO annotation JSON file.
    #[arg(short, long)]
    coco: PathBuf,

    /// Directory holding the images named by the COCO file. Without it
    /// only label files are written.
    #[arg(short, long)]
    images: Option<PathBuf>,

    /// Output dataset directory.
    #[arg(short, long)]
    output: PathBuf,

    /// Stretch every image to WIDTHxHEIGHT (or SIZE for a square).
    #[arg(long, value_name = "WxH")]
    resize: Option<ResizeTarget>,

    /// Fraction of images for the validation split.
    #[arg(long, default_value_t = 0.1)]
    val_size: f64,

    /// Fraction of images for the test split.
    #[arg(long, default_value_t = 0.2)]
    test_size: f64,

    /// Seed for the train/val/test shuffle.
    #[arg(long, env = "COCO2YOLO_SEED", default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Exit non-zero if any image or annotation was skipped.
    #[arg(long)]
    strict: bool,

    /// Format of the run summary printed to stdout.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

impl Cli {
    fn to_options(&self) -> PipelineOptions {
        PipelineOptions {
            coco_path: self.coco.clone(),
            images_dir: self.images.clone(),
            output_dir: self.output.clone(),
            resize: self.resize,
            split: SplitRatios {
                val: self.val_size,
                test: self.test_size,
            },
            seed: self.seed,
            strict: self.strict,
        }
    }
}

/// Run the coco2yolo CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), ConvertError> {
    let cli = Cli::parse();
    let options = cli.to_options();

    match run_pipeline(&options) {
        Ok(report) => print_report(&cli, &report),
        Err(err) => {
            // Run-level failures still show what happened.
            if let Some(report) = err.report() {
                print_report(&cli, report)?;
            }
            Err(err)
        }
    }
}

fn print_report(cli: &Cli, report: &RunReport) -> Result<(), ConvertError> {
    match cli.report {
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(report).map_err(std::io::Error::from)?;
            println!("{json}");
        }
        ReportFormat::Text => {
            println!(
                "Converted {} -> {}:",
                cli.coco.display(),
                cli.output.display()
            );
            print!("{report}");
        }
    }
    Ok(())
}
