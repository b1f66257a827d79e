use crate::{DetectError, Detection, Detector, DetectorOptions, Result};
use image::RgbImage;
use log::{debug, info};
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum Recording {
    /// One batch per frame, replayed in a loop.
    Frames(Vec<Vec<Detection>>),
    /// The same batch for every frame.
    Single(Vec<Detection>),
}

/// Plays back detections recorded as JSON instead of running a model.
///
/// Accepts either a single array of detections or an array of per-frame
/// arrays. Output passes through the same [`DetectorOptions`] filter a
/// live model would.
#[derive(Debug, Clone)]
pub struct ReplayDetector {
    frames: Vec<Vec<Detection>>,
    next: usize,
    options: Option<DetectorOptions>,
}

impl ReplayDetector {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DetectError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let this = Self::from_json(&text)?;
        info!("replaying {} recorded frame(s) from {}", this.frames.len(), path.display());
        Ok(this)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let frames = match serde_json::from_str::<Recording>(text)? {
            Recording::Frames(frames) => frames,
            Recording::Single(batch) => vec![batch],
        };
        Ok(Self::new(frames))
    }

    pub fn new(frames: Vec<Vec<Detection>>) -> Self {
        Self { frames, next: 0, options: None }
    }

    /// Filter replayed batches like a live detector would.
    pub fn with_options(mut self, options: DetectorOptions) -> Self {
        self.options = Some(options);
        self
    }
}

impl Detector for ReplayDetector {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>> {
        if self.frames.is_empty() {
            return Ok(Vec::new());
        }
        let batch = self.frames[self.next].clone();
        self.next = (self.next + 1) % self.frames.len();
        debug!("replay: {} detection(s) for {}x{} frame", batch.len(), image.width(), image.height());

        Ok(match &self.options {
            Some(options) => options.apply(batch),
            None => batch,
        })
    }
}
