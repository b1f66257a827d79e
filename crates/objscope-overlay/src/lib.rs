// objscope-overlay/src/lib.rs
// ============================================================
// objscope-overlay  –  Detection overlay renderer
// Image-space boxes → letterboxed view space → boxes + labels
// ------------------------------------------------------------
// Public API
//   * OverlayRenderer::update_detections(dets, iw, ih)
//   * OverlayRenderer::paint(canvas)
//   * ViewTransform::letterbox(vw, vh, iw, ih)
//   * color_for_index(i)
//   * Canvas / DisplayList / ImageCanvas – paint targets
//   * fit_frame(frame, vw, vh) – letterboxed camera preview
// ============================================================

//! objscope – overlay layer
//!
//! Detections arrive in the pixel space of the analysed image. The view
//! shows that image scaled uniformly to fit (letterboxed, never cropped)
//! and centred. [`OverlayRenderer`] keeps the one scale + offset that maps
//! between the two and paints every detection through a [`Canvas`].
//!
//! ```
//! use objscope_detect::{BoundingBox, Category, Detection};
//! use objscope_overlay::{DisplayList, OverlayRenderer, OverlayStyle};
//!
//! let mut overlay = OverlayRenderer::new(OverlayStyle::default());
//! overlay.set_view_size(1080, 1920);
//! overlay.update_detections(
//!     vec![Detection::new(
//!         BoundingBox::new(100.0, 50.0, 200.0, 150.0),
//!         vec![Category::new("car", 0.92, 2)],
//!     )],
//!     640,
//!     480,
//! );
//!
//! let mut list = DisplayList::new(30.0);
//! overlay.paint(&mut list);
//! assert_eq!(list.ops().len(), 3);
//! ```

use std::path::PathBuf;
use thiserror::Error;

mod canvas;
mod image_canvas;
mod palette;
mod preview;
mod renderer;
mod transform;

pub use canvas::{Canvas, DisplayList, DrawOp};
pub use image_canvas::{load_font, ImageCanvas};
pub use palette::{color_for_index, Color, PALETTE, TEXT_COLOR};
pub use preview::fit_frame;
pub use renderer::{label_text, OverlayRenderer, OverlayStyle, Repaint};
pub use transform::ViewTransform;

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("Failed to read font {}: {source}", .path.display())]
    FontIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Not a usable font: {}", .0.display())]
    InvalidFont(PathBuf),
}

pub type Result<T> = std::result::Result<T, OverlayError>;
