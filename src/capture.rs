//! Background capture thread.
//!
//! The thread opens the frame source itself, then loops: blocking read, run the
//! hand detector, send one [`FrameReport`] per good frame. The channel holds at
//! most [`REPORT_QUEUE`] reports; while it is full new frames are dropped, so the
//! camera side never waits on the window and a stalled window cannot pile up
//! frames. Dropping the
//! [`Capture`] handle raises the shutdown flag and joins the thread, which in
//! turn drops (and releases) the source.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use image::RgbImage;

use crate::camera::FrameSource;
use crate::error::Error;
use crate::fingers::{Detection, HandDetector};

/// Pause after a failed read so a wedged device does not spin the core.
const READ_ERROR_PAUSE: Duration = Duration::from_millis(10);

/// Reports waiting for the window before new frames are dropped.
pub const REPORT_QUEUE: usize = 4;

/// One captured frame and what the detector made of it. Owned by the receiver.
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub frame: RgbImage,
    pub detection: Detection,
    pub captured_at: Instant,
}

/// Handle to the running capture thread.
pub struct Capture {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Capture {
    /// Spawn the capture thread. `open` runs on that thread; if it fails the error is
    /// logged and the thread exits, leaving the receiver disconnected.
    pub fn spawn<S, F>(open: F, detector: HandDetector) -> Result<(Self, Receiver<FrameReport>), Error>
    where
        S: FrameSource + 'static,
        F: FnOnce() -> Result<S, Error> + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded(REPORT_QUEUE);
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("capture".into())
            .spawn(move || {
                log::trace!("capture thread starting");
                match open() {
                    Ok(mut source) => run(&mut source, &detector, &tx, &flag),
                    Err(e) => log::error!("{e}; capture stopped, no retry"),
                }
                log::trace!("capture thread exiting");
            })
            .map_err(|source| Error::Thread {
                name: "capture",
                source,
            })?;

        Ok((
            Self {
                shutdown,
                handle: Some(handle),
            },
            rx,
        ))
    }

    /// Shared flag; setting it asks the thread to stop after the current read.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop and join.
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("capture thread panicked");
            }
        }
    }
}

impl Drop for Capture {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}

fn run<S: FrameSource>(
    source: &mut S,
    detector: &HandDetector,
    tx: &Sender<FrameReport>,
    shutdown: &AtomicBool,
) {
    while !shutdown.load(Ordering::Acquire) {
        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("skipping frame: {e}");
                thread::sleep(READ_ERROR_PAUSE);
                continue;
            }
        };
        let captured_at = Instant::now();
        let detection = detector.detect(&frame);
        let report = FrameReport {
            frame,
            detection,
            captured_at,
        };
        match tx.try_send(report) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => log::trace!("report queue full; frame dropped"),
            Err(TrySendError::Disconnected(_)) => {
                log::debug!("frame receiver dropped");
                break;
            }
        }
    }
}
