use crate::Color;
use objscope_detect::BoundingBox;
use serde::Serialize;

/// A surface the overlay can paint on. Coordinates are view pixels.
pub trait Canvas {
    /// Outline `rect` with a stroke of `width` pixels centred on its edges.
    fn stroke_rect(&mut self, rect: BoundingBox, color: Color, width: f32);
    fn fill_rect(&mut self, rect: BoundingBox, color: Color);
    /// Draw `text` starting at `x` with its baseline at `baseline`.
    fn draw_text(&mut self, text: &str, x: f32, baseline: f32, color: Color);
    /// Advance width of `text` in pixels.
    fn measure_text(&self, text: &str) -> f32;
    /// Height of one line of text.
    fn line_height(&self) -> f32;
}

/// One recorded paint call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    StrokeRect { rect: BoundingBox, color: [u8; 4], width: f32 },
    FillRect { rect: BoundingBox, color: [u8; 4] },
    Text { text: String, x: f32, baseline: f32, color: [u8; 4] },
}

/// Canvas that records paint calls instead of rasterising them.
///
/// Text is measured as fixed-advance glyphs half as wide as they are tall.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DisplayList {
    text_size: f32,
    ops: Vec<DrawOp>,
}

impl DisplayList {
    pub fn new(text_size: f32) -> Self {
        Self { text_size, ops: Vec::new() }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Colours of every stroked rectangle, in paint order.
    pub fn stroke_colors(&self) -> Vec<[u8; 4]> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::StrokeRect { color, .. } => Some(*color),
                _ => None,
            })
            .collect()
    }

    /// Every text string, in paint order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for DisplayList {
    fn stroke_rect(&mut self, rect: BoundingBox, color: Color, width: f32) {
        self.ops.push(DrawOp::StrokeRect { rect, color: color.0, width });
    }

    fn fill_rect(&mut self, rect: BoundingBox, color: Color) {
        self.ops.push(DrawOp::FillRect { rect, color: color.0 });
    }

    fn draw_text(&mut self, text: &str, x: f32, baseline: f32, color: Color) {
        self.ops.push(DrawOp::Text { text: text.to_string(), x, baseline, color: color.0 });
    }

    fn measure_text(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.text_size * 0.5
    }

    fn line_height(&self) -> f32 {
        self.text_size
    }
}
