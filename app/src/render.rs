use anyhow::{Context, Result};
use image::RgbaImage;
use log::info;
use objscope_detect::summarize;
use objscope_overlay::{fit_frame, load_font, DisplayList, ImageCanvas, OverlayRenderer};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::pipeline::{build_detector, DetectorSource};

/// Inputs of a single headless render.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub image: PathBuf,
    pub detector: DetectorSource,
    pub view: (u32, u32),
    pub out: PathBuf,
    pub display_list: Option<PathBuf>,
}

/// What a render produced, for the caller to report.
#[derive(Debug)]
pub struct RenderOutcome {
    pub summary: String,
    pub detections: usize,
}

pub fn run(job: &RenderJob, config: &AppConfig) -> Result<RenderOutcome> {
    let frame = image::open(&job.image)
        .with_context(|| format!("opening image {}", job.image.display()))?
        .to_rgb8();
    let mut detector = build_detector(&job.detector, &config.detector)?;
    let detections = detector.detect(&frame).context("running detector")?;
    let summary = summarize(&detections);

    let (view_w, view_h) = job.view;
    let mut overlay = OverlayRenderer::new(config.overlay.style.clone());
    overlay.set_view_size(view_w, view_h);
    overlay.update_detections(detections, frame.width(), frame.height());

    let mut view = fit_frame(&frame, view_w, view_h);
    paint_view(&overlay, &mut view, config.overlay.font_path.as_deref())?;
    view.save(&job.out).with_context(|| format!("writing {}", job.out.display()))?;
    info!("wrote {}x{} overlay to {}", view_w, view_h, job.out.display());

    if let Some(path) = &job.display_list {
        let mut list = DisplayList::new(config.overlay.style.text_size);
        overlay.paint(&mut list);
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &list)
            .with_context(|| format!("writing display list {}", path.display()))?;
    }

    Ok(RenderOutcome { summary, detections: overlay.detections().len() })
}

/// Paint the overlay onto an already letterboxed view.
pub fn paint_view(overlay: &OverlayRenderer, view: &mut RgbaImage, font_path: Option<&Path>) -> Result<()> {
    let text_size = overlay.style().text_size;
    match font_path {
        Some(path) => {
            let font = load_font(path)?;
            overlay.paint(&mut ImageCanvas::new(view, text_size).with_font(&font));
        }
        None => overlay.paint(&mut ImageCanvas::new(view, text_size)),
    }
    Ok(())
}

/// Parse `WIDTHxHEIGHT`.
pub fn parse_view(s: &str) -> std::result::Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{s}`"))?;
    let w = w.trim().parse().map_err(|e| format!("bad width `{w}`: {e}"))?;
    let h = h.trim().parse().map_err(|e| format!("bad height `{h}`: {e}"))?;
    Ok((w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_sizes_parse() {
        assert_eq!(parse_view("1080x1920"), Ok((1080, 1920)));
        assert_eq!(parse_view("640X480"), Ok((640, 480)));
        assert!(parse_view("1080").is_err());
        assert!(parse_view("axb").is_err());
    }
}
