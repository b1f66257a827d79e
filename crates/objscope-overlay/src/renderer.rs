use crate::{color_for_index, Canvas, Color, ViewTransform};
use crossbeam_channel::{Sender, TrySendError};
use image::Rgba;
use objscope_detect::{BoundingBox, Category, Detection};
use serde::{Deserialize, Serialize};

/// Horizontal padding around label text, each side.
const LABEL_PAD: f32 = 4.0;

/// "Please repaint" signal sent to the surface the renderer is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Repaint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub stroke_width: f32,
    pub text_size: f32,
    pub text_color: [u8; 4],
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            stroke_width: 4.0,
            text_size: 30.0,
            text_color: crate::TEXT_COLOR.0,
        }
    }
}

/// `"<label> <percent>%"` for the top category, percent rounded.
pub fn label_text(category: &Category) -> String {
    format!("{} {}%", category.label, (category.score * 100.0).round() as i64)
}

/// Holds the latest detection batch and the image→view mapping for it.
///
/// State is only replaced through [`update_detections`](Self::update_detections),
/// so a [`paint`](Self::paint) always sees one consistent batch.
#[derive(Debug)]
pub struct OverlayRenderer {
    view_width: u32,
    view_height: u32,
    detections: Vec<Detection>,
    transform: ViewTransform,
    style: OverlayStyle,
    surface: Option<Sender<Repaint>>,
}

impl OverlayRenderer {
    pub fn new(style: OverlayStyle) -> Self {
        Self {
            view_width: 0,
            view_height: 0,
            detections: Vec::new(),
            transform: ViewTransform::default(),
            style,
            surface: None,
        }
    }

    /// Record the current view size. Takes effect on the next update.
    pub fn set_view_size(&mut self, width: u32, height: u32) {
        self.view_width = width;
        self.view_height = height;
    }

    pub fn view_size(&self) -> (u32, u32) {
        (self.view_width, self.view_height)
    }

    /// Route repaint requests to `surface`.
    pub fn attach(&mut self, surface: Sender<Repaint>) {
        self.surface = Some(surface);
    }

    pub fn detach(&mut self) {
        self.surface = None;
    }

    pub fn is_attached(&self) -> bool {
        self.surface.is_some()
    }

    /// Replace the whole batch with `detections` found in an
    /// `image_width`×`image_height` image, and ask for one repaint.
    pub fn update_detections(&mut self, detections: Vec<Detection>, image_width: u32, image_height: u32) {
        self.transform = ViewTransform::letterbox(self.view_width, self.view_height, image_width, image_height);

        let malformed = detections.iter().filter(|d| d.categories.is_empty()).count();
        if malformed > 0 {
            log::warn!("{malformed} detection(s) without categories will not be drawn");
        }
        log::debug!(
            "overlay: {} detections, {}x{} → {}x{}, scale {:.4}",
            detections.len(),
            image_width,
            image_height,
            self.view_width,
            self.view_height,
            self.transform.scale
        );
        self.detections = detections;
        self.request_repaint();
    }

    fn request_repaint(&mut self) {
        let Some(surface) = &self.surface else {
            return;
        };
        match surface.try_send(Repaint) {
            // a repaint is already pending, it will pick up this batch
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => {
                log::debug!("overlay surface went away, detaching");
                self.surface = None;
            }
        }
    }

    /// Paint the current batch: stroked box, then a filled label patch
    /// sitting on the box's top-left corner, then the label text.
    pub fn paint<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        let text_color = Rgba(self.style.text_color);
        let line_height = canvas.line_height();

        for (i, det) in self.detections.iter().enumerate() {
            let Some(top) = det.top() else {
                continue;
            };
            let color: Color = color_for_index(i);
            let rect = self.transform.map_rect(&det.bounding_box);
            canvas.stroke_rect(rect, color, self.style.stroke_width);

            let text = label_text(top);
            let text_width = canvas.measure_text(&text);
            let patch = BoundingBox::new(
                rect.left,
                rect.top - line_height,
                rect.left + text_width + 2.0 * LABEL_PAD,
                rect.top,
            );
            canvas.fill_rect(patch, color);
            canvas.draw_text(&text, rect.left + LABEL_PAD, rect.top - LABEL_PAD, text_color);
        }
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new(OverlayStyle::default())
    }
}
