//! objscope‑preprocess – camera frames → RGB images → model input tensors.
//!
//! Three steps sit between the sensor and the detector:
//! 1. repack three‑plane YUV 4:2:0 into NV21 ([`yuv420_to_nv21`]),
//! 2. convert NV12 / NV21 / RGB frames into an [`RgbImage`] ([`frame_to_rgb`]),
//! 3. resize + normalise into an `H×W×3` `f32` tensor ([`Preprocessor`]).

use anyhow::{anyhow, bail, Context, Result};
use image::RgbImage;
use log::debug;
use ndarray::{Array3, Array4, Axis};
use objscope_camera::{FrameBacking, PixelFormat, VideoFrame};
use std::time::Duration;
use resize::{new, Pixel, Type};
use rgb::FromSlice;

/// Borrowed YUV 4:2:0 planes as a camera HAL hands them out.
///
/// Chroma planes may be planar (`uv_pixel_stride == 1`) or views into an
/// interleaved buffer (`uv_pixel_stride == 2`).
pub struct Yuv420Planes<'a> {
    pub y: &'a [u8],
    pub u: &'a [u8],
    pub v: &'a [u8],
    pub width: usize,
    pub height: usize,
    pub y_row_stride: usize,
    pub uv_row_stride: usize,
    pub uv_pixel_stride: usize,
}

/// Pack three YUV planes into one tight NV21 buffer (Y, then interleaved
/// V/U). Entry point for capture backends that hand out separate planes
/// (Android-style `YUV_420_888`, GStreamer `I420`).
pub fn yuv420_to_nv21(planes: &Yuv420Planes) -> Result<Vec<u8>> {
    let (w, h) = (planes.width, planes.height);
    let (cw, ch) = (w.div_ceil(2), h.div_ceil(2));
    let mut out = Vec::with_capacity(w * h + 2 * cw * ch);

    for row in 0..h {
        let start = row * planes.y_row_stride;
        let line = planes
            .y
            .get(start..start + w)
            .ok_or_else(|| anyhow!("Y plane too short at row {row}"))?;
        out.extend_from_slice(line);
    }

    for row in 0..ch {
        for col in 0..cw {
            let idx = row * planes.uv_row_stride + col * planes.uv_pixel_stride;
            let (v, u) = match (planes.v.get(idx), planes.u.get(idx)) {
                (Some(&v), Some(&u)) => (v, u),
                _ => bail!("chroma plane too short at ({col}, {row})"),
            };
            out.push(v);
            out.push(u);
        }
    }
    Ok(out)
}

/// [`yuv420_to_nv21`] wrapped as an NV21 [`VideoFrame`] ready for
/// [`frame_to_rgb`].
pub fn yuv420_to_frame(planes: &Yuv420Planes, pts: Duration) -> Result<VideoFrame> {
    let bytes = yuv420_to_nv21(planes)?;
    let width = u32::try_from(planes.width).context("frame too wide")?;
    let height = u32::try_from(planes.height).context("frame too tall")?;
    Ok(VideoFrame {
        backing: FrameBacking::Cpu(bytes),
        format: PixelFormat::Nv21,
        width,
        height,
        stride: width,
        pts,
    })
}

/// Decode a frame into packed RGB, honouring its row stride.
pub fn frame_to_rgb(frame: &VideoFrame) -> Result<RgbImage> {
    let bytes = frame.bytes();
    let (w, h) = (frame.width as usize, frame.height as usize);
    let stride = frame.stride as usize;
    if w == 0 || h == 0 {
        return Ok(RgbImage::new(frame.width, frame.height));
    }

    let expected = frame
        .format
        .strided_len(frame.width, frame.height, frame.stride)
        .ok_or_else(|| anyhow!("{:?} stride {} is shorter than a {}-pixel row", frame.format, stride, w))?;
    if bytes.len() < expected {
        bail!(
            "{:?} frame {}x{} (stride {}) needs {} bytes, got {}",
            frame.format, w, h, stride, expected, bytes.len()
        );
    }

    let rgb = match frame.format {
        PixelFormat::Rgb8 => {
            let row = w * 3;
            let mut rgb = Vec::with_capacity(row * h);
            for j in 0..h {
                rgb.extend_from_slice(&bytes[j * stride..j * stride + row]);
            }
            rgb
        }
        PixelFormat::Nv12 | PixelFormat::Nv21 => {
            let mut rgb = vec![0u8; w * h * 3];
            let (y_plane, uv_plane) = bytes.split_at(stride * h);
            semi_planar_to_rgb(y_plane, uv_plane, w, h, stride, frame.format == PixelFormat::Nv21, &mut rgb);
            rgb
        }
    };

    RgbImage::from_raw(frame.width, frame.height, rgb)
        .context("RGB buffer does not match frame dimensions")
}

/// 4:2:0 semi‑planar → RGB24 (BT.601, full range).
/// Both planes use `stride` bytes per row; `vu_order` selects NV21
/// (V first) over NV12 (U first).
fn semi_planar_to_rgb(y: &[u8], uv: &[u8], w: usize, h: usize, stride: usize, vu_order: bool, out: &mut [u8]) {
    for j in 0..h {
        for i in 0..w {
            let y_val = y[j * stride + i] as f32;
            let uv_idx = (j / 2) * stride + (i & !1);
            let (first, second) = (uv[uv_idx] as f32 - 128.0, uv[uv_idx + 1] as f32 - 128.0);
            let (u, v) = if vu_order { (second, first) } else { (first, second) };

            let r = (y_val + 1.402 * v).clamp(0.0, 255.0);
            let g = (y_val - 0.344_13 * u - 0.714_14 * v).clamp(0.0, 255.0);
            let b = (y_val + 1.772 * u).clamp(0.0, 255.0);

            let base = (j * w + i) * 3;
            out[base]     = r as u8;
            out[base + 1] = g as u8;
            out[base + 2] = b as u8;
        }
    }
}

#[derive(Clone, Debug)]
pub struct Preprocessor {
    dst_w: u32,
    dst_h: u32,
}

impl Preprocessor {
    /// Create a pre‑processor that outputs W×H RGB (0‑1.0f32).
    pub fn new(dst_w: u32, dst_h: u32) -> Self {
        Self { dst_w, dst_h }
    }

    pub fn dims(&self) -> (u32, u32) {
        (self.dst_w, self.dst_h)
    }

    /// Resize with Lanczos3 and normalise into an `(H, W, C)` tensor.
    pub fn run(&self, image: &RgbImage) -> Result<Array3<f32>> {
        let (w, h) = (image.width() as usize, image.height() as usize);
        let (dw, dh) = (self.dst_w as usize, self.dst_h as usize);
        if w == 0 || h == 0 {
            bail!("cannot preprocess an empty {w}x{h} image");
        }

        let mut dst = vec![0u8; dw * dh * 3];
        if (w, h) == (dw, dh) {
            dst.copy_from_slice(image.as_raw());
        } else {
            let mut resizer = new(w, h, dw, dh, Pixel::RGB8, Type::Lanczos3)
                .context("building resizer")?;
            resizer
                .resize(image.as_raw().as_rgb(), dst.as_rgb_mut())
                .context("resizing frame")?;
        }
        debug!("preprocessed {w}x{h} -> {dw}x{dh}");

        let data: Vec<f32> = dst.iter().map(|&px| px as f32 / 255.0).collect();
        Ok(Array3::from_shape_vec((dh, dw, 3), data)?)
    }

    /// Same as [`run`](Self::run) but laid out `(1, C, H, W)` for ONNX models.
    pub fn run_nchw(&self, image: &RgbImage) -> Result<Array4<f32>> {
        Ok(hwc_to_nchw(self.run(image)?))
    }
}

/// `(H, W, C)` → `(1, C, H, W)`, contiguous.
pub fn hwc_to_nchw(hwc: Array3<f32>) -> Array4<f32> {
    hwc.permuted_axes([2, 0, 1])
        .insert_axis(Axis(0))
        .as_standard_layout()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yuv_frame(format: PixelFormat, w: u32, h: u32, y: u8, first: u8, second: u8) -> VideoFrame {
        let px = (w * h) as usize;
        let mut bytes = vec![y; px];
        for _ in 0..px / 4 {
            bytes.push(first);
            bytes.push(second);
        }
        VideoFrame {
            backing: FrameBacking::Cpu(bytes),
            format,
            width: w,
            height: h,
            stride: w,
            pts: Duration::ZERO,
        }
    }

    #[test]
    fn neutral_chroma_is_grey() {
        let frame = yuv_frame(PixelFormat::Nv12, 4, 4, 100, 128, 128);
        let rgb = frame_to_rgb(&frame).unwrap();
        assert_eq!(rgb.get_pixel(3, 3).0, [100, 100, 100]);
    }

    #[test]
    fn nv21_swaps_chroma_order() {
        // strong V (red) in NV12 order is strong U (blue) in NV21 order
        let nv12 = frame_to_rgb(&yuv_frame(PixelFormat::Nv12, 2, 2, 128, 128, 255)).unwrap();
        let nv21 = frame_to_rgb(&yuv_frame(PixelFormat::Nv21, 2, 2, 128, 255, 128)).unwrap();
        assert_eq!(nv12.get_pixel(0, 0), nv21.get_pixel(0, 0));
        assert!(nv12.get_pixel(0, 0).0[0] > 250);
    }

    #[test]
    fn padded_rows_are_skipped() {
        // 2x2 NV12, rows padded to 4 bytes with junk
        let bytes = vec![200, 200, 9, 9, 200, 200, 9, 9, 128, 128, 9, 9];
        let frame = VideoFrame {
            backing: FrameBacking::Cpu(bytes),
            format: PixelFormat::Nv12,
            width: 2,
            height: 2,
            stride: 4,
            pts: Duration::ZERO,
        };
        let rgb = frame_to_rgb(&frame).unwrap();
        assert!(rgb.pixels().all(|p| p.0 == [200, 200, 200]), "{:?}", rgb.as_raw());
    }

    #[test]
    fn padded_rgb_rows_are_cropped() {
        let bytes = vec![1, 2, 3, 0, 4, 5, 6, 0];
        let frame = VideoFrame {
            backing: FrameBacking::Cpu(bytes),
            format: PixelFormat::Rgb8,
            width: 1,
            height: 2,
            stride: 4,
            pts: Duration::ZERO,
        };
        assert_eq!(frame_to_rgb(&frame).unwrap().into_raw(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn stride_shorter_than_row_is_rejected() {
        let mut frame = yuv_frame(PixelFormat::Nv12, 4, 4, 0, 128, 128);
        frame.stride = 3;
        assert!(frame_to_rgb(&frame).is_err());
    }

    #[test]
    fn padded_buffer_too_short_for_its_stride_is_rejected() {
        // big enough for a tight 4x4 frame, not for 8-byte rows
        let mut frame = yuv_frame(PixelFormat::Nv12, 4, 4, 0, 128, 128);
        frame.stride = 8;
        assert!(frame_to_rgb(&frame).is_err());
    }

    #[test]
    fn planar_yuv_decodes_through_nv21() {
        let y = [90u8; 4];
        let (u, v) = ([128u8], [128u8]);
        let planes = Yuv420Planes {
            y: &y,
            u: &u,
            v: &v,
            width: 2,
            height: 2,
            y_row_stride: 2,
            uv_row_stride: 1,
            uv_pixel_stride: 1,
        };
        let frame = yuv420_to_frame(&planes, Duration::ZERO).unwrap();
        assert_eq!(frame.format, PixelFormat::Nv21);
        let rgb = frame_to_rgb(&frame).unwrap();
        assert!(rgb.pixels().all(|p| p.0 == [90, 90, 90]));
    }

    #[test]
    fn short_buffer_is_rejected() {
        let mut frame = yuv_frame(PixelFormat::Nv12, 4, 4, 0, 128, 128);
        frame.backing = FrameBacking::Cpu(vec![0; 10]);
        assert!(frame_to_rgb(&frame).is_err());
    }

    #[test]
    fn interleaved_planes_pack_as_vu() {
        // 2x2 image, chroma views into one interleaved U/V buffer
        let y = [1u8, 2, 3, 4];
        let uv = [50u8, 60];
        let planes = Yuv420Planes {
            y: &y,
            u: &uv[0..],
            v: &uv[1..],
            width: 2,
            height: 2,
            y_row_stride: 2,
            uv_row_stride: 2,
            uv_pixel_stride: 2,
        };
        assert_eq!(yuv420_to_nv21(&planes).unwrap(), vec![1, 2, 3, 4, 60, 50]);
    }

    #[test]
    fn padded_luma_rows_are_cropped() {
        let y = [1u8, 2, 0xFF, 3, 4, 0xFF];
        let u = [7u8];
        let v = [8u8];
        let planes = Yuv420Planes {
            y: &y,
            u: &u,
            v: &v,
            width: 2,
            height: 2,
            y_row_stride: 3,
            uv_row_stride: 1,
            uv_pixel_stride: 1,
        };
        assert_eq!(yuv420_to_nv21(&planes).unwrap(), vec![1, 2, 3, 4, 8, 7]);
    }

    #[test]
    fn nchw_moves_channels_first() {
        let mut hwc = Array3::<f32>::zeros((2, 3, 3));
        hwc[(1, 2, 0)] = 0.5;
        let nchw = hwc_to_nchw(hwc);
        assert_eq!(nchw.shape(), &[1, 3, 2, 3]);
        assert_eq!(nchw[(0, 0, 1, 2)], 0.5);
        assert!(nchw.is_standard_layout());
    }
}
