use crate::{Canvas, Color, OverlayError, Result};
use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::RgbaImage;
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use objscope_detect::BoundingBox;
use std::path::Path;

/// Load a TrueType / OpenType font for label text.
pub fn load_font<P: AsRef<Path>>(path: P) -> Result<FontArc> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| OverlayError::FontIo {
        path: path.to_path_buf(),
        source,
    })?;
    FontArc::try_from_vec(bytes).map_err(|_| OverlayError::InvalidFont(path.to_path_buf()))
}

/// Paints straight into an RGBA frame buffer.
///
/// Without a font, labels keep their background patch (sized by a
/// fixed-advance estimate) but the glyphs themselves are skipped.
pub struct ImageCanvas<'a> {
    image: &'a mut RgbaImage,
    font: Option<&'a FontArc>,
    text_size: f32,
}

impl<'a> ImageCanvas<'a> {
    pub fn new(image: &'a mut RgbaImage, text_size: f32) -> Self {
        Self { image, font: None, text_size }
    }

    pub fn with_font(mut self, font: &'a FontArc) -> Self {
        self.font = Some(font);
        self
    }

    fn scale(&self) -> PxScale {
        PxScale::from(self.text_size)
    }
}

/// Integer pixel rect covering `[left, right) × [top, bottom)`, or `None`
/// when it has no area.
///
/// Edges are clamped to one pixel outside a `width`×`height` image first,
/// so far off-screen boxes keep their off-screen edges undrawn.
fn pixel_rect(left: f32, top: f32, right: f32, bottom: f32, (width, height): (u32, u32)) -> Option<Rect> {
    let cx = |x: f32| x.round().clamp(-1.0, width as f32 + 1.0) as i64;
    let cy = |y: f32| y.round().clamp(-1.0, height as f32 + 1.0) as i64;
    let (l, t, r, b) = (cx(left), cy(top), cx(right), cy(bottom));
    if r <= l || b <= t {
        return None;
    }
    Some(Rect::at(l as i32, t as i32).of_size((r - l) as u32, (b - t) as u32))
}

impl Canvas for ImageCanvas<'_> {
    fn stroke_rect(&mut self, rect: BoundingBox, color: Color, width: f32) {
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return;
        }
        let bounds = self.image.dimensions();
        // centred stroke: half inside, half outside the edge
        let lines = width.round().max(1.0) as i32;
        let outset = lines / 2;
        for k in 0..lines {
            let d = (outset - k) as f32;
            let edges = (rect.left - d, rect.top - d, rect.right + d, rect.bottom + d);
            if let Some(r) = pixel_rect(edges.0, edges.1, edges.2, edges.3, bounds) {
                draw_hollow_rect_mut(&mut *self.image, r, color);
            }
        }
    }

    fn fill_rect(&mut self, rect: BoundingBox, color: Color) {
        if let Some(r) = pixel_rect(rect.left, rect.top, rect.right, rect.bottom, self.image.dimensions()) {
            draw_filled_rect_mut(&mut *self.image, r, color);
        }
    }

    fn draw_text(&mut self, text: &str, x: f32, baseline: f32, color: Color) {
        let Some(font) = self.font else {
            return;
        };
        let scale = self.scale();
        let ascent = font.as_scaled(scale).ascent();
        let top = (baseline - ascent).round() as i32;
        draw_text_mut(&mut *self.image, color, x.round() as i32, top, scale, font, text);
    }

    fn measure_text(&self, text: &str) -> f32 {
        match self.font {
            Some(font) => text_size(self.scale(), font, text).0 as f32,
            None => text.chars().count() as f32 * self.text_size * 0.5,
        }
    }

    fn line_height(&self) -> f32 {
        self.text_size
    }
}
