use crate::ViewTransform;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbImage, RgbaImage};

/// Letterbox `frame` into a `view_w`×`view_h` canvas with black bars,
/// using the same fit the overlay uses for its boxes.
pub fn fit_frame(frame: &RgbImage, view_w: u32, view_h: u32) -> RgbaImage {
    let mut view = RgbaImage::from_pixel(view_w, view_h, Rgba([0, 0, 0, 255]));
    let t = ViewTransform::letterbox(view_w, view_h, frame.width(), frame.height());
    let (sw, sh) = t.scaled_size(frame.width(), frame.height());
    let (sw, sh) = (sw.round() as u32, sh.round() as u32);
    if sw == 0 || sh == 0 {
        return view;
    }

    let rgba = DynamicImage::ImageRgb8(frame.clone()).into_rgba8();
    let scaled = if (sw, sh) == rgba.dimensions() {
        rgba
    } else {
        imageops::resize(&rgba, sw, sh, FilterType::Triangle)
    };
    imageops::overlay(&mut view, &scaled, t.offset_x.round() as i64, t.offset_y.round() as i64);
    view
}
