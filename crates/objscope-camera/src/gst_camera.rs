// objscope-camera/src/gst_camera.rs
use crate::{CameraConfig, CameraError, Facing, FrameBacking, FrameSource, PixelFormat, Result, VideoFrame};
use gst::prelude::*;
use log::{debug, info};
use std::time::Duration;

/// Camera handle – owns the pipeline and *appsink*.
pub struct Camera {
    pipeline: gst::Pipeline,
    appsink: gst_app::AppSink,
    facing: Facing,
}

impl Camera {
    /// Build and start a pipeline that delivers NV12 frames from the
    /// device mapped to `facing`.
    ///
    /// ```no_run
    /// use objscope_camera::{Camera, CameraConfig, Facing, FrameSource};
    /// let mut cam = Camera::new(&CameraConfig::default(), Facing::Back).unwrap();
    /// let frame = cam.next_frame_blocking().unwrap();
    /// println!("{}×{}", frame.width, frame.height);
    /// ```
    pub fn new(config: &CameraConfig, facing: Facing) -> Result<Self> {
        gst::init().map_err(CameraError::GstInit)?;

        let device = config.device_for(facing);
        let src = if facing == Facing::Back && gst::ElementFactory::find("libcamerasrc").is_some() {
            // Pi (libcamera) stack
            "libcamerasrc".to_string()
        } else {
            format!("v4l2src device={device} io-mode=4")
        };

        // leaky queue of one: the appsink only ever holds the newest frame
        let pipe_str = format!(
            "{src} ! videoconvert ! video/x-raw,format=NV12,width={w},height={h},framerate={f}/1 \
            ! queue leaky=2 max-size-buffers=1 ! appsink name=sink emit-signals=true sync=false \
            max-buffers=1 drop=true",
            src = src, w = config.width, h = config.height, f = config.fps
        );

        let pipeline = gst::parse::launch(&pipe_str)
            .map_err(CameraError::ParsePipeline)?
            .downcast::<gst::Pipeline>()
            .map_err(|_| CameraError::NotPipeline)?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or(CameraError::AppSinkNotFound)?
            .downcast::<gst_app::AppSink>()
            .map_err(|_| CameraError::AppSinkDowncastFailed)?;

        pipeline
            .set_state(gst::State::Playing)
            .map_err(CameraError::StateChange)?;

        info!("camera {:?} streaming {}x{}@{} from {}", facing, config.width, config.height, config.fps, src);
        Ok(Self { pipeline, appsink, facing })
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Convert a `gst::Sample` into our [`VideoFrame`] wrapper.
    ///
    /// The buffer is mapped readable (DMA‑Buf memory included) and moved
    /// into the frame. Plane layout comes from the buffer's `VideoMeta`
    /// when present, else from the caps.
    fn sample_to_frame(sample: gst::Sample) -> Result<VideoFrame> {
        let caps = sample.caps().ok_or(CameraError::MissingCaps)?;
        let info = gst_video::VideoInfo::from_caps(caps).map_err(|e| CameraError::FieldError(e.to_string()))?;
        let buffer = sample.buffer_owned().ok_or(CameraError::MissingBuffer)?;
        let (width, height) = (info.width(), info.height());

        let (stride, uv_offset) = match buffer.meta::<gst_video::VideoMeta>() {
            Some(meta) => (meta.stride()[0], meta.offset()[1]),
            None => (info.stride()[0], info.offset()[1]),
        };
        let stride = u32::try_from(stride)
            .ok()
            .filter(|&s| s >= width)
            .ok_or_else(|| CameraError::FieldError(format!("unusable NV12 stride {stride} for width {width}")))?;

        let pts = buffer
            .pts()
            .map(|t| Duration::from_nanos(t.nseconds()))
            .unwrap_or(Duration::ZERO);

        let mapped = buffer
            .into_mapped_buffer_readable()
            .map_err(|_| CameraError::BufferMap("buffer is not readable".into()))?;

        let luma_len = stride as usize * height as usize;
        let backing = if uv_offset == luma_len {
            FrameBacking::Mapped(mapped)
        } else {
            // chroma plane not directly after luma: repack so it is
            let bytes = mapped.as_slice();
            let chroma_len = stride as usize * (height as usize).div_ceil(2);
            let end = (uv_offset + chroma_len).min(bytes.len());
            let (luma, chroma) = match (bytes.get(..luma_len), bytes.get(uv_offset..end)) {
                (Some(l), Some(c)) => (l, c),
                _ => return Err(CameraError::BufferMap(format!("{} byte buffer too short for NV12 planes", bytes.len()))),
            };
            debug!("repacking NV12 frame: chroma at {uv_offset}, expected {luma_len}");
            let mut packed = Vec::with_capacity(luma_len + chroma.len());
            packed.extend_from_slice(luma);
            packed.extend_from_slice(chroma);
            FrameBacking::Cpu(packed)
        };

        Ok(VideoFrame {
            backing,
            format: PixelFormat::Nv12,
            width,
            height,
            stride,
            pts,
        })
    }
}

impl FrameSource for Camera {
    fn next_frame_blocking(&mut self) -> Result<VideoFrame> {
        let sample = self
            .appsink
            .pull_sample()
            .map_err(CameraError::PullSample)?;

        Self::sample_to_frame(sample)
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        let _ = self.pipeline.set_state(gst::State::Null);
    }
}
