//! Command-line interface for sigverify
//!
//! Compares the signatures in two document images with the YOLO detector

use clap::Parser;
use opencv::core::Vector;
use opencv::imgcodecs;
use sigverify::{ComparisonConfig, ComparisonPipeline, ComparisonReport, YoloDetector};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "compare", about = "Decide whether two document images carry the same signature")]
struct Cli {
    /// First document image
    first: PathBuf,

    /// Second document image
    second: PathBuf,

    /// JSON configuration file; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// ONNX signature model, overrides the configured path
    #[arg(long)]
    model: Option<PathBuf>,

    /// Detection confidence threshold in [0, 1]
    #[arg(long)]
    confidence: Option<f32>,

    /// Similarity threshold; distances below it are "Same"
    #[arg(long)]
    threshold: Option<f64>,

    /// Print the outcome as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Directory for the annotated images
    #[arg(long, value_name = "DIR")]
    annotated_out: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(error) = run(&cli) {
        eprintln!("Comparison failed: {}", error);
        eprintln!("Suggestion: {}", error.user_message());
        process::exit(1);
    }
}

fn run(cli: &Cli) -> sigverify::Result<()> {
    let mut config = match &cli.config {
        Some(path) => ComparisonConfig::from_json_file(path)?,
        None => ComparisonConfig::default(),
    };
    if let Some(model) = &cli.model {
        config.detection.model_path = model.clone();
    }
    if let Some(confidence) = cli.confidence {
        config.detection.confidence_threshold = confidence;
    }
    if let Some(threshold) = cli.threshold {
        config.scoring.similarity_threshold = threshold;
    }

    let detector = YoloDetector::from_config(&config.detection)?;
    let pipeline = ComparisonPipeline::new(detector, &config)?;
    let report = pipeline.compare(&cli.first, &cli.second)?;

    if let Some(dir) = &cli.annotated_out {
        save_annotated(&report, dir, [&cli.first, &cli.second]);
    }
    print_report(&report, cli.json);
    Ok(())
}

fn save_annotated(report: &ComparisonReport, output_dir: &Path, inputs: [&PathBuf; 2]) {
    if let Err(e) = fs::create_dir_all(output_dir) {
        eprintln!("Warning: Failed to create output directory: {}", e);
        return;
    }

    for (analysis, input) in [&report.first, &report.second].into_iter().zip(inputs) {
        let base_name = input.file_stem().and_then(|s| s.to_str()).unwrap_or("image");
        let out_path = output_dir.join(format!("{}_annotated.png", base_name));
        let Some(out_str) = out_path.to_str() else {
            eprintln!("Warning: Output path is not valid UTF-8: {}", out_path.display());
            continue;
        };
        match imgcodecs::imwrite(out_str, &analysis.annotated, &Vector::new()) {
            Ok(_) => eprintln!("Saved annotated image to {}", out_path.display()),
            Err(e) => eprintln!("Warning: Failed to save annotated image: {}", e),
        }
    }
}

fn print_report(report: &ComparisonReport, json: bool) {
    let outcome = &report.outcome;
    if json {
        match serde_json::to_string_pretty(outcome) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("Error serializing outcome: {}", e),
        }
        return;
    }

    print!("{}", outcome.detection_summary());
    println!("{}", outcome.message());
    eprintln!();
    eprintln!("Regions: {} / {}", report.first.regions.len(), report.second.regions.len());
    eprintln!("Patterns: {} / {}", outcome.patterns1, outcome.patterns2);
}
