use anyhow::{bail, Context, Result};
use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use image::RgbImage;
use log::{debug, info, warn};
use objscope_camera::{spawn_capture, CameraConfig, Facing, FrameSource, LatestFrame, StillSource};
use objscope_detect::{summarize, Detection, Detector, ReplayDetector};
use objscope_preprocess::frame_to_rgb;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::{AppConfig, DetectorConfig};

pub type BoxedDetector = Box<dyn Detector + Send>;
pub type BoxedSource = Box<dyn FrameSource + Send>;

/// Where detections come from.
#[derive(Debug, Clone)]
pub enum DetectorSource {
    /// Detections recorded in a JSON file.
    Replay(PathBuf),
    /// An ONNX model.
    Model(PathBuf),
}

pub fn build_detector(source: &DetectorSource, config: &DetectorConfig) -> Result<BoxedDetector> {
    match source {
        DetectorSource::Replay(path) => {
            let replay = ReplayDetector::open(path)
                .with_context(|| format!("opening detections {}", path.display()))?
                .with_options(config.options);
            Ok(Box::new(replay))
        }
        DetectorSource::Model(path) => build_model(path, config),
    }
}

#[cfg(feature = "onnx")]
fn build_model(path: &Path, config: &DetectorConfig) -> Result<BoxedDetector> {
    let detector = objscope_detect::OnnxDetector::new(path, config.input_size, config.labels()?, config.options)
        .with_context(|| format!("loading model {}", path.display()))?;
    Ok(Box::new(detector))
}

#[cfg(not(feature = "onnx"))]
fn build_model(path: &Path, _config: &DetectorConfig) -> Result<BoxedDetector> {
    bail!("cannot load {}: built without the `onnx` feature", path.display())
}

/// Open the frame source for `facing`: still images when `stills` is set,
/// otherwise the live camera.
pub fn open_source(config: &CameraConfig, facing: Facing, stills: Option<&Path>) -> Result<BoxedSource> {
    if let Some(path) = stills {
        let source = StillSource::open(path)
            .with_context(|| format!("opening stills {}", path.display()))?
            .with_interval(config.frame_interval());
        return Ok(Box::new(source));
    }
    open_camera(config, facing)
}

#[cfg(feature = "camera")]
fn open_camera(config: &CameraConfig, facing: Facing) -> Result<BoxedSource> {
    let camera = objscope_camera::Camera::new(config, facing).with_context(|| format!("opening {facing:?} camera"))?;
    Ok(Box::new(camera))
}

#[cfg(not(feature = "camera"))]
fn open_camera(_config: &CameraConfig, _facing: Facing) -> Result<BoxedSource> {
    bail!("built without the `camera` feature; pass --stills <dir> instead")
}

/// One analysed frame.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub frame: RgbImage,
    pub detections: Vec<Detection>,
}

impl Analysis {
    /// Status line for this frame, safe to hand to C string APIs.
    pub fn status(&self) -> String {
        summarize(&self.detections).replace('\0', "")
    }
}

/// Requests from the UI thread to the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    SwitchCamera,
}

/// Convert one frame and run the detector on it.
pub fn analyze(detector: &mut dyn Detector, frame: &objscope_camera::VideoFrame) -> Result<Analysis> {
    let rgb = frame_to_rgb(frame).context("converting frame")?;
    let detections = detector.detect(&rgb).context("running detector")?;
    Ok(Analysis { frame: rgb, detections })
}

const POLL: Duration = Duration::from_millis(50);

/// Spawn the single analyzer thread. It owns the capture stream, so a
/// camera switch tears it down and starts a new one.
///
/// The thread ends when `control` or `results` disconnects, or when the
/// source fails.
pub fn spawn_analyzer(
    config: AppConfig,
    stills: Option<PathBuf>,
    mut detector: BoxedDetector,
    control: Receiver<Control>,
    results: Sender<Analysis>,
) -> Result<JoinHandle<()>> {
    let mut facing = config.camera.facing;
    let mut frames: LatestFrame = spawn_capture(open_source(&config.camera, facing, stills.as_deref())?);

    let handle = thread::Builder::new()
        .name("analyzer".into())
        .spawn(move || {
            let mut analysed: u64 = 0;
            loop {
                match control.try_recv() {
                    Ok(Control::SwitchCamera) => {
                        let next = facing.toggled();
                        match open_source(&config.camera, next, stills.as_deref()) {
                            Ok(source) => {
                                info!("switching camera {facing:?} -> {next:?}");
                                facing = next;
                                frames = spawn_capture(source);
                            }
                            Err(e) => warn!("camera switch failed, staying on {facing:?}: {e:#}"),
                        }
                    }
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => break,
                }

                let frame = match frames.recv_timeout(POLL) {
                    Some(Ok(frame)) => frame,
                    Some(Err(e)) => {
                        warn!("capture stopped: {e}");
                        break;
                    }
                    None if frames.is_finished() => break,
                    None => continue,
                };

                let analysis = match analyze(detector.as_mut(), &frame) {
                    Ok(a) => a,
                    Err(e) => {
                        warn!("skipping frame: {e:#}");
                        continue;
                    }
                };
                analysed += 1;
                debug!("frame {analysed}: {} detection(s)", analysis.detections.len());

                match results.try_send(analysis) {
                    // the UI is behind; it will take the next one
                    Ok(()) | Err(TrySendError::Full(_)) => {}
                    Err(TrySendError::Disconnected(_)) => break,
                }
            }
            info!("analyzer shutting down after {analysed} frame(s), {} dropped at capture", frames.dropped());
        })
        .context("spawning analyzer thread")?;
    Ok(handle)
}
