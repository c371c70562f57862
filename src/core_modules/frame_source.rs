// THEORY:
// The `FrameSource` owns the camera and keeps the `FrameBuffer` fresh. It runs on its
// own schedule, as fast as the device delivers, so the rate at which frames are
// acquired is decoupled from the rate at which anyone asks for a position or a
// video frame.
//
// Key architectural principles:
// 1.  **Device Ownership**: the device moves into the acquisition task and is dropped
//     when that task ends, on every exit path including a panic. Devices release the
//     hardware in `Drop`.
// 2.  **Transient Failures**: a failed read skips the iteration, waits the retry
//     delay and tries again. Failures are never surfaced to position queries.
// 3.  **Explicit Lifecycle**: `spawn` returns an `AcquisitionHandle`. `shutdown`
//     raises the stop signal and joins the task; dropping the handle raises the
//     signal too.

use crate::core_modules::frame::{FlipMode, Frame};
use crate::core_modules::frame_buffer::FrameBuffer;
use crate::error::CaptureError;
use image::RgbImage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

const FAILURE_WARN_INTERVAL: u64 = 100;

/// A camera, or anything else that yields RGB frames on demand.
pub trait CaptureDevice: Send + 'static {
    /// Blocks until the next frame is available.
    fn read_frame(&mut self) -> Result<RgbImage, CaptureError>;

    fn describe(&self) -> String {
        String::from("capture device")
    }
}

/// Counters reported when the acquisition loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcquisitionStats {
    pub frames_published: u64,
    pub failed_reads: u64,
}

pub struct FrameSource<D: CaptureDevice> {
    device: D,
    buffer: Arc<FrameBuffer>,
    flip: FlipMode,
    retry_delay: Duration,
    next_frame_id: u64,
    consecutive_failures: u64,
    stats: AcquisitionStats,
}

impl<D: CaptureDevice> FrameSource<D> {
    pub fn new(device: D, buffer: Arc<FrameBuffer>, flip: FlipMode, retry_delay: Duration) -> Self {
        Self {
            device,
            buffer,
            flip,
            retry_delay,
            next_frame_id: 0,
            consecutive_failures: 0,
            stats: AcquisitionStats::default(),
        }
    }

    /// Reads, orients and publishes one frame. Returns `false` if the read failed.
    pub fn acquire_once(&mut self) -> bool {
        match self.device.read_frame() {
            Ok(mut image) => {
                self.flip.apply(&mut image);
                self.buffer.publish(Frame::new(image, self.next_frame_id));
                self.next_frame_id += 1;
                self.stats.frames_published += 1;
                self.consecutive_failures = 0;
                true
            }
            Err(e) => {
                self.stats.failed_reads += 1;
                self.consecutive_failures += 1;
                if self.consecutive_failures % FAILURE_WARN_INTERVAL == 0 {
                    warn!(
                        failures = self.consecutive_failures,
                        "{} keeps failing to deliver frames: {e}",
                        self.device.describe()
                    );
                } else {
                    debug!("frame read failed, retrying: {e}");
                }
                false
            }
        }
    }

    /// Acquires frames until `stop` reads `true` or its sender is gone.
    pub fn acquire_loop(mut self, stop: watch::Receiver<bool>) -> AcquisitionStats {
        info!("acquisition started on {}", self.device.describe());
        while !*stop.borrow() && stop.has_changed().is_ok() {
            if !self.acquire_once() {
                std::thread::sleep(self.retry_delay);
            }
        }
        info!(
            frames = self.stats.frames_published,
            failed_reads = self.stats.failed_reads,
            "acquisition stopped, releasing {}",
            self.device.describe()
        );
        self.stats
    }

    /// Runs `acquire_loop` on the blocking pool of the current tokio runtime.
    pub fn spawn(self) -> AcquisitionHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::task::spawn_blocking(move || self.acquire_loop(stop_rx));
        AcquisitionHandle {
            stop_tx,
            task: Some(task),
        }
    }
}

/// Controls a running acquisition task.
pub struct AcquisitionHandle {
    stop_tx: watch::Sender<bool>,
    task: Option<tokio::task::JoinHandle<AcquisitionStats>>,
}

impl AcquisitionHandle {
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|task| task.is_finished())
    }

    /// Stops the loop and waits for it, which also guarantees the device has been released.
    pub async fn shutdown(mut self) -> Result<AcquisitionStats, CaptureError> {
        self.stop_tx.send_replace(true);
        match self.task.take() {
            Some(task) => Ok(task.await?),
            None => Ok(AcquisitionStats::default()),
        }
    }
}

impl Drop for AcquisitionHandle {
    fn drop(&mut self) {
        // Best effort stop; the task releases the device on its own once it sees the flag.
        self.stop_tx.send_replace(true);
    }
}
