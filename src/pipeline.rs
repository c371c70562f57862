// THEORY:
// The `pipeline` module is the top-level API of the laser tracking engine. A
// `LaserTracker` owns every piece of process-wide state (the frame slot, the
// calibration and the smoothing window) and exposes the small set of calls an
// outer I/O layer needs: ask for the position, reset the calibration, fetch
// frames for streaming.
//
// Stages of a position query:
// 1.  **Snapshot**: copy the newest frame out of the `FrameBuffer`.
// 2.  **Detection**: find the raw pixel position of the dot, if any.
// 3.  **Mapping**: convert it into target coordinates with the active calibration.
// 4.  **Smoothing**: push the result into the window and report the window's mean.
//
// Stages 2 and 3 run on the caller's private copy with no lock held; only stage 4
// takes the smoother lock, and only for the push and the average.

use crate::config::TrackerConfig;
use crate::core_modules::calibration::{CalibrationMapper, CalibrationRecord, CalibrationStore};
use crate::core_modules::frame::Frame;
use crate::core_modules::frame_buffer::FrameBuffer;
use crate::core_modules::frame_source::{AcquisitionHandle, CaptureDevice, FrameSource};
use crate::core_modules::laser_detector::LaserDetector;
use crate::core_modules::smoother::TemporalSmoother;
use crate::core_modules::utils::image_helper::image_helper;
use crate::error::{CalibrationError, ConfigError};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

// Re-export key data structures for the public API.
pub use crate::core_modules::blob::Point;
pub use crate::core_modules::smoother::TrackingState;

/// The externally reported position: `{"x": int|null, "y": int|null}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LaserPosition {
    pub x: Option<i32>,
    pub y: Option<i32>,
}

impl LaserPosition {
    pub const NONE: LaserPosition = LaserPosition { x: None, y: None };

    pub fn point(&self) -> Option<Point> {
        Some(Point::new(self.x?, self.y?))
    }
}

impl From<Option<Point>> for LaserPosition {
    fn from(point: Option<Point>) -> Self {
        match point {
            Some(p) => Self { x: Some(p.x), y: Some(p.y) },
            None => Self::NONE,
        }
    }
}

/// The laser tracking engine.
pub struct LaserTracker {
    config: TrackerConfig,
    frames: Arc<FrameBuffer>,
    detector: LaserDetector,
    mapper: CalibrationMapper,
    smoother: Mutex<TemporalSmoother>,
}

impl LaserTracker {
    pub fn new(config: TrackerConfig, store: Box<dyn CalibrationStore>) -> Result<Self, ConfigError> {
        config.validate()?;
        let mapper = CalibrationMapper::new(config.capture.width, config.capture.height, store);
        Ok(Self {
            frames: Arc::new(FrameBuffer::new()),
            detector: LaserDetector::new(config.detector.clone()),
            smoother: Mutex::new(TemporalSmoother::new(config.smoothing_window)),
            mapper,
            config,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Starts the background acquisition loop feeding this tracker's frame buffer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_acquisition<D: CaptureDevice>(&self, device: D) -> AcquisitionHandle {
        FrameSource::new(
            device,
            Arc::clone(&self.frames),
            self.config.capture.flip,
            Duration::from_millis(self.config.capture.retry_delay_ms),
        )
        .spawn()
    }

    /// The detection query: runs one detection cycle on the newest frame.
    ///
    /// Before the first frame arrives this reports no position and leaves the window alone.
    pub fn locate(&self) -> LaserPosition {
        match self.frames.snapshot() {
            Some(frame) => self.process_frame(&frame),
            None => LaserPosition::NONE,
        }
    }

    /// Runs one detection cycle on `frame`.
    pub fn process_frame(&self, frame: &Frame) -> LaserPosition {
        let mapped = self.detector.detect(&frame.image).map(|raw| self.mapper.map(raw));
        let mut smoother = self.smoother.lock().unwrap_or_else(PoisonError::into_inner);
        smoother.observe(mapped);
        smoother.current_estimate().into()
    }

    /// The smoothed position as of the last detection cycle, without running a new one.
    pub fn last_position(&self) -> LaserPosition {
        self.smoother
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current_estimate()
            .into()
    }

    pub fn tracking_state(&self) -> TrackingState {
        self.smoother.lock().unwrap_or_else(PoisonError::into_inner).state()
    }

    /// Resets to the full-frame calibration. Returns once the record is durable.
    ///
    /// Positions mapped with the previous calibration are dropped from the window.
    pub fn reset_calibration(&self) -> Result<CalibrationRecord, CalibrationError> {
        let record = self.mapper.reset_to_default()?;
        self.forget_positions();
        Ok(record)
    }

    pub fn apply_calibration(&self, record: CalibrationRecord) -> Result<CalibrationRecord, CalibrationError> {
        let record = self.mapper.apply(record)?;
        self.forget_positions();
        Ok(record)
    }

    fn forget_positions(&self) {
        self.smoother.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn calibration(&self) -> CalibrationRecord {
        self.mapper.record()
    }

    /// A private copy of the newest frame, for streaming.
    pub fn snapshot_frame(&self) -> Option<Frame> {
        self.frames.snapshot()
    }

    pub fn subscribe_frames(&self) -> watch::Receiver<Option<Frame>> {
        self.frames.subscribe()
    }

    pub fn frame_buffer(&self) -> Arc<FrameBuffer> {
        Arc::clone(&self.frames)
    }

    /// JPEG bytes of the newest frame, or `None` before the first frame.
    pub fn encode_latest_jpeg(&self, quality: u8) -> Option<Result<Vec<u8>, image::ImageError>> {
        let frame = self.frames.snapshot()?;
        Some(image_helper::encode_jpeg(&frame.image, quality))
    }
}
