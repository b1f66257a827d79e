use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use config::AppConfig;
use pipeline::DetectorSource;

mod config;
#[cfg(feature = "display")]
mod live;
#[cfg_attr(not(feature = "display"), allow(dead_code))]
mod pipeline;
mod render;

#[derive(Parser)]
#[command(author, version, about = "Camera preview with object-detection overlay")]
struct Args {
    /// Load settings from a JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override the detector score threshold
    #[arg(long, global = true)]
    threshold: Option<f32>,
    /// Override the maximum detections per frame
    #[arg(long, global = true)]
    max_results: Option<usize>,
    /// TrueType font for label text
    #[arg(long, global = true)]
    font: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render one image with its overlay to a PNG
    Render {
        #[arg(long)]
        image: PathBuf,
        /// Recorded detections (JSON) instead of a model
        #[arg(long, conflicts_with = "model")]
        detections: Option<PathBuf>,
        /// ONNX model (needs the `onnx` feature)
        #[arg(long)]
        model: Option<PathBuf>,
        /// View size as WIDTHxHEIGHT
        #[arg(long, value_parser = render::parse_view)]
        view: Option<(u32, u32)>,
        #[arg(long)]
        out: PathBuf,
        /// Also write the recorded draw ops as JSON
        #[arg(long)]
        display_list: Option<PathBuf>,
    },
    /// Live preview window (needs the `display` feature)
    Live {
        /// Replay still images from a file or directory instead of a camera
        #[arg(long)]
        stills: Option<PathBuf>,
        #[arg(long, conflicts_with = "model")]
        detections: Option<PathBuf>,
        #[arg(long)]
        model: Option<PathBuf>,
    },
}

fn detector_source(detections: Option<PathBuf>, model: Option<PathBuf>, config: &AppConfig) -> DetectorSource {
    match (detections, model) {
        (Some(path), _) => DetectorSource::Replay(path),
        (None, Some(path)) => DetectorSource::Model(path),
        (None, None) => DetectorSource::Model(config.detector.model_path.clone()),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(threshold) = args.threshold {
        config.detector.options.score_threshold = threshold;
    }
    if let Some(max) = args.max_results {
        config.detector.options.max_results = max;
    }
    if args.font.is_some() {
        config.overlay.font_path = args.font;
    }

    match args.command {
        Command::Render { image, detections, model, view, out, display_list } => {
            let job = render::RenderJob {
                image,
                detector: detector_source(detections, model, &config),
                view: view.unwrap_or((config.view.width, config.view.height)),
                out,
                display_list,
            };
            let outcome = render::run(&job, &config)?;
            log::info!("{} detection(s) drawn", outcome.detections);
            println!("{}", outcome.summary);
        }
        Command::Live { stills, detections, model } => {
            let source = detector_source(detections, model, &config);
            run_live(config, stills, source)?;
        }
    }
    Ok(())
}

#[cfg(feature = "display")]
fn run_live(config: AppConfig, stills: Option<PathBuf>, source: DetectorSource) -> Result<()> {
    let detector = pipeline::build_detector(&source, &config.detector)?;
    live::run(config, stills, detector)
}

#[cfg(not(feature = "display"))]
fn run_live(_config: AppConfig, _stills: Option<PathBuf>, _source: DetectorSource) -> Result<()> {
    bail!("`live` needs a build with the `display` feature")
}
