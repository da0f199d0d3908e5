//! Command-line interface for tooth_scan
//!
//! Runs one detector (or the segmenter-then-lesion cascade) on a photo,
//! prints the detections as JSON and writes an annotated copy.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use serde::Serialize;

use tooth_scan::{
    render_detections, Detection, DetectionCascade, DetectorConfig, ImageSource, LesionDetector,
    RenderStyle, Result, Sensitivity, ToothDetector, ToothSegmenter,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    /// Segmenter first, lesion detector when it finds nothing
    Auto,
    Segmenter,
    Lesion,
}

#[derive(Parser, Debug)]
#[command(
    name = "tooth_scan",
    about = "Flag visible dental conditions in an intraoral photo"
)]
struct Args {
    /// Path to the photo
    #[arg(value_name = "IMAGE")]
    input: PathBuf,

    /// Detection strategy
    #[arg(long, value_enum, default_value = "auto")]
    strategy: Strategy,

    /// Lesion detector sensitivity (low|medium|high)
    #[arg(long, default_value = "medium")]
    sensitivity: Sensitivity,

    /// JSON detector configuration overriding the defaults
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Skip writing the annotated image
    #[arg(long)]
    no_render: bool,
}

#[derive(Serialize)]
struct Report {
    input: PathBuf,
    strategy: Option<&'static str>,
    detections: Vec<Detection>,
    annotated: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(&args) {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: failed to serialize report: {e}");
                process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            log::debug!("{e:?}");
            process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<Report> {
    let mut config = match &args.config {
        Some(path) => DetectorConfig::from_json_file(path)?,
        None => DetectorConfig::default(),
    };
    config.lesion.sensitivity = args.sensitivity;

    let source = ImageSource::from_path(&args.input);
    let (strategy, style, detections) = match args.strategy {
        Strategy::Auto => {
            let outcome = DetectionCascade::from_config(&config)?.run(&source)?;
            (outcome.strategy, outcome.render_style, outcome.detections)
        }
        Strategy::Segmenter => single(&ToothSegmenter::from_config(&config.segmenter)?, &source)?,
        Strategy::Lesion => single(&LesionDetector::from_config(&config.lesion)?, &source)?,
    };

    let annotated = if args.no_render || detections.is_empty() {
        None
    } else {
        Some(annotate(&args.input, &detections, style))
    };

    Ok(Report {
        input: args.input.clone(),
        strategy,
        detections,
        annotated,
    })
}

fn single(
    detector: &dyn ToothDetector,
    source: &ImageSource<'_>,
) -> Result<(Option<&'static str>, RenderStyle, Vec<Detection>)> {
    let image = source.resolve()?;
    let detections = detector.detect(&image)?;
    Ok((Some(detector.name()), detector.render_style(), detections))
}

fn annotate(input: &Path, detections: &[Detection], style: RenderStyle) -> PathBuf {
    let output = render_detections(input, detections, style);
    if output == input {
        log::warn!("annotated image was not written");
    }
    output
}
