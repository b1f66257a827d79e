// objscope-detect/src/lib.rs
// ============================================================
// objscope-detect  –  Object-detection stage
// Wraps a pre-built detector behind one trait and normalises
// its output into image-space Detections.
// ------------------------------------------------------------
// Pipeline: RgbImage → Vec<Detection>
// ------------------------------------------------------------
// Public API
//   * Detector::detect(image)    – returns Vec<Detection>
//   * OnnxDetector::new(..)      – ONNX Runtime backend (feature `onnx`)
//   * ReplayDetector::open(path) – detections recorded as JSON
//   * DetectorOptions::apply     – threshold + max-results filter
//   * LabelMap / summarize       – class names and status text
// ============================================================

//! objscope – detection layer
//!
//! The model itself is a black box. This crate owns what surrounds it:
//! the [`Detection`] data model shared with the overlay, the [`Detector`]
//! trait, result filtering ([`DetectorOptions`]), class names
//! ([`LabelMap`]) and the one‑line status text ([`summarize`]).
//!
//! Every detector reports boxes in the pixel space of the image it was
//! given, never in model‑input space and never in view space.

use image::RgbImage;
use std::path::PathBuf;
use thiserror::Error;

mod detection;
mod labels;
mod nms;
#[cfg(feature = "onnx")]
mod onnx;
mod options;
mod replay;
mod summary;

pub use detection::{BoundingBox, Category, Detection};
pub use labels::LabelMap;
pub use nms::non_max_suppression;
#[cfg(feature = "onnx")]
pub use onnx::OnnxDetector;
pub use options::DetectorOptions;
pub use replay::ReplayDetector;
pub use summary::{summarize, NO_OBJECT};

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("Model load or inference error: {0}")]
    Ort(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid output shape: expected [1, 4 + classes, N], got {0:?}")]
    InvalidOutputShape(Vec<i64>),
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed detection file: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DetectError>;

/// Trait for object detectors.
pub trait Detector {
    /// Run detection on one decoded frame. Boxes are in `image` pixels.
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>>;
}

impl<D: Detector + ?Sized> Detector for Box<D> {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>> {
        (**self).detect(image)
    }
}
