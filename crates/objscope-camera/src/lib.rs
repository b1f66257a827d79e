// objscope-camera/src/lib.rs
// ============================================================
// Camera capture crate for objscope
// Delivers frames one at a time to a single analyzer, dropping
// stale frames when the analyzer falls behind.
// ------------------------------------------------------------
// Public API:
//   * FrameSource          – anything that yields VideoFrames
//   * Camera::new()        – GStreamer live capture (feature `gstreamer`)
//   * StillSource::open()  – image file / directory replay
//   * spawn_capture()      – keep-latest capture thread
// ------------------------------------------------------------
// Build notes
//   * Default build is pure Rust; `--features gstreamer` pulls in
//     the GStreamer stack for real devices.
// ============================================================

//! objscope – camera capture layer
//!
//! Frames are delivered as [`VideoFrame`], which owns its pixels (a heap
//! copy or a mapped GStreamer buffer) plus metadata (format, width,
//! height, stride, timestamp). Sources implement [`FrameSource`];
//! [`spawn_capture`] runs one on its own thread and hands frames to the
//! consumer with keep‑only‑latest backpressure.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[cfg(feature = "gstreamer")]
mod gst_camera;
mod still;
mod stream;

#[cfg(feature = "gstreamer")]
pub use gst_camera::Camera;
pub use still::StillSource;
pub use stream::{spawn_capture, LatestFrame};

#[derive(Error, Debug)]
pub enum CameraError {
    #[cfg(feature = "gstreamer")]
    #[error("GStreamer init failed: {0}")]
    GstInit(#[source] gst::glib::Error),
    #[cfg(feature = "gstreamer")]
    #[error("Failed to parse pipeline: {0}")]
    ParsePipeline(#[source] gst::glib::Error),
    #[cfg(feature = "gstreamer")]
    #[error("Pipeline is not a gst::Pipeline")]
    NotPipeline,
    #[cfg(feature = "gstreamer")]
    #[error("AppSink element not found")]
    AppSinkNotFound,
    #[cfg(feature = "gstreamer")]
    #[error("AppSink element downcast failed")]
    AppSinkDowncastFailed,
    #[cfg(feature = "gstreamer")]
    #[error("Failed to set pipeline to Playing: {0}")]
    StateChange(#[source] gst::StateChangeError),
    #[cfg(feature = "gstreamer")]
    #[error("Failed to pull sample: {0}")]
    PullSample(#[source] gst::glib::BoolError),
    #[cfg(feature = "gstreamer")]
    #[error("Sample has no buffer")]
    MissingBuffer,
    #[cfg(feature = "gstreamer")]
    #[error("Sample has no caps")]
    MissingCaps,
    #[cfg(feature = "gstreamer")]
    #[error("Unusable video caps: {0}")]
    FieldError(String),
    #[cfg(feature = "gstreamer")]
    #[error("Buffer map failed: {0}")]
    BufferMap(String),
    #[error("No image files found at {}", .0.display())]
    NoFrames(PathBuf),
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub type Result<T> = std::result::Result<T, CameraError>;

/// Pixel layout of a frame's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Y plane followed by interleaved U/V, 4:2:0.
    Nv12,
    /// Y plane followed by interleaved V/U, 4:2:0.
    Nv21,
    /// Packed 8‑bit RGB.
    Rgb8,
}

impl PixelFormat {
    /// Bytes one tightly packed row of the first plane needs.
    pub fn row_bytes(self, width: u32) -> usize {
        match self {
            PixelFormat::Nv12 | PixelFormat::Nv21 => width as usize,
            PixelFormat::Rgb8 => width as usize * 3,
        }
    }

    /// Number of bytes a tightly packed `width`×`height` frame occupies.
    pub fn frame_len(self, width: u32, height: u32) -> usize {
        let (w, h) = (width as usize, height as usize);
        let px = w * h;
        match self {
            // chroma is subsampled 2x2, rounding odd edges up
            PixelFormat::Nv12 | PixelFormat::Nv21 => px + 2 * w.div_ceil(2) * h.div_ceil(2),
            PixelFormat::Rgb8 => px * 3,
        }
    }

    /// Smallest buffer holding a `width`×`height` frame whose rows are
    /// `stride` bytes apart. For 4:2:0 formats the chroma plane starts at
    /// `stride * height` and uses the same stride. Trailing padding after
    /// the last row of each plane is not required.
    ///
    /// `None` when `stride` is shorter than a row.
    pub fn strided_len(self, width: u32, height: u32, stride: u32) -> Option<usize> {
        let (stride, h) = (stride as usize, height as usize);
        let row = self.row_bytes(width);
        if stride < row {
            return None;
        }
        if h == 0 || row == 0 {
            return Some(0);
        }
        Some(match self {
            PixelFormat::Nv12 | PixelFormat::Nv21 => {
                let chroma_rows = h.div_ceil(2);
                let chroma_row = 2 * (width as usize).div_ceil(2);
                stride * h + stride * (chroma_rows - 1) + chroma_row
            }
            PixelFormat::Rgb8 => stride * (h - 1) + row,
        })
    }
}

/// Where a frame's pixels live.
///
/// * `Cpu(bytes)`  – heap copy (still images, repacked camera frames)
/// * `Mapped(buf)` – a GStreamer buffer mapped readable; the frame owns
///   the buffer, so DMA‑Buf memory stays valid until the frame drops
pub enum FrameBacking {
    Cpu(Vec<u8>),
    #[cfg(feature = "gstreamer")]
    Mapped(gst::MappedBuffer<gst::buffer::Readable>),
}

impl FrameBacking {
    pub fn as_slice(&self) -> &[u8] {
        match self {
            FrameBacking::Cpu(bytes) => bytes,
            #[cfg(feature = "gstreamer")]
            FrameBacking::Mapped(buf) => buf.as_slice(),
        }
    }
}

impl std::fmt::Debug for FrameBacking {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameBacking::Cpu(bytes) => write!(f, "Cpu({} bytes)", bytes.len()),
            #[cfg(feature = "gstreamer")]
            FrameBacking::Mapped(buf) => write!(f, "Mapped({} bytes)", buf.as_slice().len()),
        }
    }
}

/// Metadata + pixels for a single captured frame.
#[derive(Debug)]
pub struct VideoFrame {
    pub backing: FrameBacking,
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    /// Bytes per row, shared by the luma and chroma planes of 4:2:0 frames.
    pub stride: u32,
    pub pts: Duration,
}

impl VideoFrame {
    /// Wrap packed RGB bytes.
    pub fn from_rgb(bytes: Vec<u8>, width: u32, height: u32, pts: Duration) -> Self {
        Self {
            backing: FrameBacking::Cpu(bytes),
            format: PixelFormat::Rgb8,
            width,
            height,
            stride: width * 3,
            pts,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        self.backing.as_slice()
    }
}

/// Which physical camera to capture from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    #[default]
    Back,
    Front,
}

impl Facing {
    pub fn toggled(self) -> Self {
        match self {
            Facing::Back => Facing::Front,
            Facing::Front => Facing::Back,
        }
    }
}

/// Capture settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub facing: Facing,
    pub back_device: String,
    pub front_device: String,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 30,
            facing: Facing::Back,
            back_device: "/dev/video0".to_string(),
            front_device: "/dev/video1".to_string(),
        }
    }
}

impl CameraConfig {
    /// Device node for the given facing.
    pub fn device_for(&self, facing: Facing) -> &str {
        match facing {
            Facing::Back => &self.back_device,
            Facing::Front => &self.front_device,
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }
}

/// Anything that produces frames on demand.
pub trait FrameSource {
    /// Block until the next frame is available.
    fn next_frame_blocking(&mut self) -> Result<VideoFrame>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame_blocking(&mut self) -> Result<VideoFrame> {
        (**self).next_frame_blocking()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_toggles_both_ways() {
        assert_eq!(Facing::Back.toggled(), Facing::Front);
        assert_eq!(Facing::Front.toggled(), Facing::Back);
    }

    #[test]
    fn device_follows_facing() {
        let cfg = CameraConfig::default();
        assert_eq!(cfg.device_for(Facing::Back), "/dev/video0");
        assert_eq!(cfg.device_for(Facing::Front), "/dev/video1");
    }

    #[test]
    fn yuv_frames_are_one_and_a_half_bytes_per_pixel() {
        assert_eq!(PixelFormat::Nv12.frame_len(640, 480), 640 * 480 * 3 / 2);
        assert_eq!(PixelFormat::Rgb8.frame_len(4, 2), 24);
    }

    #[test]
    fn padded_rows_need_stride_sized_planes() {
        // 2x2 NV12 with 4-byte rows: two luma rows, then one chroma pair
        assert_eq!(PixelFormat::Nv12.strided_len(2, 2, 4), Some(4 * 2 + 2));
        assert_eq!(PixelFormat::Nv12.strided_len(640, 480, 640), Some(PixelFormat::Nv12.frame_len(640, 480)));
        assert_eq!(PixelFormat::Rgb8.strided_len(4, 2, 16), Some(16 + 12));
        assert_eq!(PixelFormat::Rgb8.strided_len(4, 2, 11), None);
        assert_eq!(PixelFormat::Nv21.strided_len(5, 3, 4), None);
    }

    #[test]
    fn config_reads_partial_json() {
        let cfg: CameraConfig = serde_json::from_str(r#"{ "facing": "front", "fps": 15 }"#).unwrap();
        assert_eq!(cfg.facing, Facing::Front);
        assert_eq!(cfg.fps, 15);
        assert_eq!(cfg.width, 640);
        assert_eq!(cfg.device_for(cfg.facing), "/dev/video1");

        let back = serde_json::to_value(Facing::Back).unwrap();
        assert_eq!(back, "back");
    }

    #[test]
    fn zero_fps_does_not_divide_by_zero() {
        let cfg = CameraConfig { fps: 0, ..Default::default() };
        assert_eq!(cfg.frame_interval(), Duration::from_secs(1));
    }
}
