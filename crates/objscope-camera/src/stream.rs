// objscope-camera/src/stream.rs
use crate::{FrameSource, Result, VideoFrame};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

// keep-latest: one slot, a newer frame evicts the undelivered one
const DEPTH: usize = 1;

/// Consumer end of a capture thread.
///
/// Holds at most one pending frame. Dropping it stops the capture thread
/// after its current read returns.
pub struct LatestFrame {
    rx: Receiver<Result<VideoFrame>>,
    stop: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    dropped: Arc<AtomicU64>,
}

impl LatestFrame {
    /// Block for the next frame. `None` once the capture thread has ended.
    pub fn recv(&self) -> Option<Result<VideoFrame>> {
        self.rx.recv().ok()
    }

    /// Like [`recv`](Self::recv) but gives up after `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Result<VideoFrame>> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// True once the capture thread has exited and nothing is pending.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire) && self.rx.is_empty()
    }

    /// Frames replaced before anyone picked them up.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for LatestFrame {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

/// Run `source` on a dedicated thread and hand out only the newest frame.
///
/// A source error is delivered once and ends the thread.
pub fn spawn_capture<S>(mut source: S) -> LatestFrame
where
    S: FrameSource + Send + 'static,
{
    let (tx, rx) = bounded(DEPTH);
    let evict = rx.clone();
    let stop = Arc::new(AtomicBool::new(false));
    let finished = Arc::new(AtomicBool::new(false));
    let dropped = Arc::new(AtomicU64::new(0));

    let thread_stop = stop.clone();
    let thread_finished = finished.clone();
    let thread_dropped = dropped.clone();
    std::thread::spawn(move || {
        while !thread_stop.load(Ordering::Relaxed) {
            let item = source.next_frame_blocking();
            let failed = item.is_err();
            if let Err(e) = &item {
                warn!("capture failed: {e}");
            }
            offer(&tx, &evict, item, &thread_dropped);
            if failed {
                break;
            }
        }
        thread_finished.store(true, Ordering::Release);
        info!("capture thread shutting down.");
    });

    LatestFrame { rx, stop, finished, dropped }
}

fn offer(
    tx: &Sender<Result<VideoFrame>>,
    evict: &Receiver<Result<VideoFrame>>,
    item: Result<VideoFrame>,
    dropped: &AtomicU64,
) {
    match tx.try_send(item) {
        Ok(()) => {}
        Err(TrySendError::Full(item)) => {
            if evict.try_recv().is_ok() {
                dropped.fetch_add(1, Ordering::Relaxed);
                debug!("analyzer busy, dropped stale frame");
            }
            // only this thread sends, so the slot is free now
            let _ = tx.try_send(item);
        }
        Err(TrySendError::Disconnected(_)) => {}
    }
}
