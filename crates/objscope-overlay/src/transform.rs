use objscope_detect::BoundingBox;

/// Uniform scale followed by a translation, image space → view space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewTransform {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl ViewTransform {
    /// Fit an `image_w`×`image_h` image entirely inside the view, keeping
    /// its aspect ratio, and centre it.
    ///
    /// A zero-sized view yields scale 0 and everything collapses to a
    /// point. A zero-sized image has no meaningful fit and also gets 0.
    pub fn letterbox(view_w: u32, view_h: u32, image_w: u32, image_h: u32) -> Self {
        if image_w == 0 || image_h == 0 {
            return Self::default();
        }
        let (vw, vh) = (view_w as f32, view_h as f32);
        let (iw, ih) = (image_w as f32, image_h as f32);

        let scale = (vw / iw).min(vh / ih);
        Self {
            scale,
            offset_x: (vw - iw * scale) / 2.0,
            offset_y: (vh - ih * scale) / 2.0,
        }
    }

    pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.scale + self.offset_x, y * self.scale + self.offset_y)
    }

    pub fn map_rect(&self, rect: &BoundingBox) -> BoundingBox {
        let (left, top) = self.map_point(rect.left, rect.top);
        let (right, bottom) = self.map_point(rect.right, rect.bottom);
        BoundingBox::new(left, top, right, bottom)
    }

    /// Size the image occupies in the view.
    pub fn scaled_size(&self, image_w: u32, image_h: u32) -> (f32, f32) {
        (image_w as f32 * self.scale, image_h as f32 * self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn portrait_view_landscape_image() {
        let t = ViewTransform::letterbox(1080, 1920, 640, 480);
        assert!(close(t.scale, 1.6875));
        assert!(close(t.offset_x, 0.0));
        assert!(close(t.offset_y, 555.0));

        let r = t.map_rect(&BoundingBox::new(100.0, 50.0, 200.0, 150.0));
        assert!(close(r.left, 168.75));
        assert!(close(r.top, 639.375));
        assert!(close(r.right, 337.5));
        assert!(close(r.bottom, 808.125));
    }

    #[test]
    fn fits_and_centres_for_assorted_sizes() {
        let views = [(1080, 1920), (1920, 1080), (500, 500), (333, 777), (1, 1)];
        let images = [(640, 480), (480, 640), (224, 224), (1280, 720), (3, 1000)];
        for &(vw, vh) in &views {
            for &(iw, ih) in &images {
                let t = ViewTransform::letterbox(vw, vh, iw, ih);
                let (sw, sh) = t.scaled_size(iw, ih);
                let tol = 1e-3 * (vw.max(vh) as f32);
                assert!(sw <= vw as f32 + tol && sh <= vh as f32 + tol, "{vw}x{vh} / {iw}x{ih}");
                // one axis is filled exactly
                assert!((sw - vw as f32).abs() < tol || (sh - vh as f32).abs() < tol);
                assert!((2.0 * t.offset_x + sw - vw as f32).abs() < tol);
                assert!((2.0 * t.offset_y + sh - vh as f32).abs() < tol);
                assert!(t.offset_x >= -tol && t.offset_y >= -tol);
            }
        }
    }

    #[test]
    fn zero_view_collapses_geometry() {
        let t = ViewTransform::letterbox(0, 1920, 640, 480);
        assert_eq!(t.scale, 0.0);
        let r = t.map_rect(&BoundingBox::new(100.0, 50.0, 200.0, 150.0));
        assert_eq!(r.width(), 0.0);
        assert_eq!(r.height(), 0.0);
    }

    #[test]
    fn zero_image_is_not_a_panic() {
        assert_eq!(ViewTransform::letterbox(100, 100, 0, 10), ViewTransform::default());
    }
}
