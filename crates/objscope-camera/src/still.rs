// objscope-camera/src/still.rs
use crate::{CameraError, FrameSource, Result, VideoFrame};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Replays image files as RGB frames, looping forever.
///
/// Stands in for a camera on machines without one. An optional interval
/// paces delivery like a real sensor would.
pub struct StillSource {
    files: Vec<PathBuf>,
    next: usize,
    interval: Option<Duration>,
    last: Option<Instant>,
    delivered: u64,
}

impl StillSource {
    /// Open a single image, or every png/jpeg in a directory (sorted by name).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let files = if path.is_dir() {
            let entries = std::fs::read_dir(path).map_err(|source| CameraError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let mut files: Vec<PathBuf> = entries
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| is_image(p))
                .collect();
            files.sort();
            files
        } else if path.is_file() {
            vec![path.to_path_buf()]
        } else {
            Vec::new()
        };

        if files.is_empty() {
            return Err(CameraError::NoFrames(path.to_path_buf()));
        }
        info!("still source: {} image(s) from {}", files.len(), path.display());

        Ok(Self {
            files,
            next: 0,
            interval: None,
            last: None,
            delivered: 0,
        })
    }

    /// Sleep between frames so delivery never exceeds one per `interval`.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn pace(&mut self) {
        if let (Some(interval), Some(last)) = (self.interval, self.last) {
            let elapsed = last.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }
}

impl FrameSource for StillSource {
    fn next_frame_blocking(&mut self) -> Result<VideoFrame> {
        self.pace();

        let path = &self.files[self.next];
        let rgb = image::open(path)
            .map_err(|source| CameraError::Decode {
                path: path.clone(),
                source,
            })?
            .to_rgb8();
        debug!("still frame {} from {}", self.delivered, path.display());

        self.next = (self.next + 1) % self.files.len();
        let pts = self.interval.unwrap_or_default() * self.delivered as u32;
        self.delivered += 1;

        let (w, h) = rgb.dimensions();
        Ok(VideoFrame::from_rgb(rgb.into_raw(), w, h, pts))
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
