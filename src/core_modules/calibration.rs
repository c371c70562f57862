// THEORY:
// The `CalibrationMapper` converts a raw sensor pixel into the target coordinate space
// the rest of the world cares about (a projected screen, a whiteboard, a game field).
//
// Key architectural principles:
// 1.  **Axis-Aligned Mapping**: the record stores four named corners, but the mapping
//     is rectangle-to-rectangle: x is interpolated from [0, frame_width] onto
//     [top_left.x, top_right.x] and y from [0, frame_height] onto
//     [top_left.y, bottom_left.y]. Results are truncated toward zero. Inputs outside
//     the frame extrapolate along the same lines; nothing is clamped.
// 2.  **Durable Before Active**: every calibration change is written to the
//     `CalibrationStore` first and installed only once the store reports success.
//     A failed write leaves the old record active, so what is in memory always
//     matches what is on disk.
// 3.  **Serialized Changes**: a writer lock is held across the store write and the
//     install, so concurrent calibrations apply in a single order. The record lock is
//     taken only to copy the record out or to assign it, so mapping never waits on
//     the disk.

use crate::core_modules::blob::Point;
use crate::error::{CalibrationError, StoreError};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

/// The four corners of the sensing rectangle, in target coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub bottom_right: Point,
}

impl CalibrationRecord {
    /// The identity calibration: the full frame, corner to corner.
    pub fn full_frame(width: u32, height: u32) -> Self {
        let (w, h) = (width as i32, height as i32);
        Self {
            top_left: Point::new(0, 0),
            top_right: Point::new(w, 0),
            bottom_left: Point::new(0, h),
            bottom_right: Point::new(w, h),
        }
    }

    /// Checks the axis-aligned rectangle invariant.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        if self.top_left.x > self.top_right.x {
            return Err(CalibrationError::InvalidRecord(format!(
                "top_left.x {} is right of top_right.x {}",
                self.top_left.x, self.top_right.x
            )));
        }
        if self.top_left.y > self.bottom_left.y {
            return Err(CalibrationError::InvalidRecord(format!(
                "top_left.y {} is below bottom_left.y {}",
                self.top_left.y, self.bottom_left.y
            )));
        }
        let expected = Point::new(self.top_right.x, self.bottom_left.y);
        if self.bottom_right != expected {
            // TODO: accept skewed quadrilaterals once mapping moves to a full homography.
            return Err(CalibrationError::InvalidRecord(format!(
                "bottom_right {:?} does not close the rectangle, expected {:?}",
                self.bottom_right, expected
            )));
        }
        Ok(())
    }
}

/// Durable home of the calibration record.
pub trait CalibrationStore: Send + Sync {
    /// The persisted record, or `None` if nothing was saved yet.
    fn load(&self) -> Result<Option<CalibrationRecord>, StoreError>;

    /// Persists `record`. Returning `Ok` means the record survives a crash.
    fn save(&self, record: &CalibrationRecord) -> Result<(), StoreError>;
}

impl<S: CalibrationStore + ?Sized> CalibrationStore for Arc<S> {
    fn load(&self) -> Result<Option<CalibrationRecord>, StoreError> {
        (**self).load()
    }

    fn save(&self, record: &CalibrationRecord) -> Result<(), StoreError> {
        (**self).save(record)
    }
}

/// Stores the record as a small JSON document on disk.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CalibrationStore for JsonFileStore {
    fn load(&self) -> Result<Option<CalibrationRecord>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, record: &CalibrationRecord) -> Result<(), StoreError> {
        let json = serde_json::to_vec(record)?;
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        let mut file = std::fs::File::create(&staging)?;
        file.write_all(&json)?;
        file.sync_all()?;
        std::fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

/// Keeps the record in memory only.
#[derive(Default)]
pub struct MemoryStore {
    record: Mutex<Option<CalibrationRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: CalibrationRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
        }
    }
}

impl CalibrationStore for MemoryStore {
    fn load(&self) -> Result<Option<CalibrationRecord>, StoreError> {
        Ok(*self.record.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn save(&self, record: &CalibrationRecord) -> Result<(), StoreError> {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = Some(*record);
        Ok(())
    }
}

/// Maps sensor pixels into target coordinates and owns the active calibration.
pub struct CalibrationMapper {
    frame_width: u32,
    frame_height: u32,
    record: Mutex<CalibrationRecord>,
    writer: Mutex<()>,
    store: Box<dyn CalibrationStore>,
}

impl CalibrationMapper {
    /// Starts from the stored record when there is a valid one, otherwise from the full frame.
    pub fn new(frame_width: u32, frame_height: u32, store: Box<dyn CalibrationStore>) -> Self {
        let default = CalibrationRecord::full_frame(frame_width, frame_height);
        let record = match store.load() {
            Ok(Some(stored)) => match stored.validate() {
                Ok(()) => {
                    info!(?stored, "loaded calibration");
                    stored
                }
                Err(e) => {
                    warn!("ignoring stored calibration: {e}");
                    default
                }
            },
            Ok(None) => default,
            Err(e) => {
                warn!("could not load stored calibration, using full frame: {e}");
                default
            }
        };
        Self {
            frame_width,
            frame_height,
            record: Mutex::new(record),
            writer: Mutex::new(()),
            store,
        }
    }

    pub fn record(&self) -> CalibrationRecord {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Maps a raw pixel position into target coordinates.
    ///
    /// Not clamped: a position outside the frame lands outside the calibrated rectangle
    /// instead of sticking to its nearest edge.
    pub fn map(&self, raw: Point) -> Point {
        let record = self.record();
        let x = interpolate(
            raw.x as f64,
            self.frame_width as f64,
            record.top_left.x as f64,
            record.top_right.x as f64,
        );
        let y = interpolate(
            raw.y as f64,
            self.frame_height as f64,
            record.top_left.y as f64,
            record.bottom_left.y as f64,
        );
        Point::new(x as i32, y as i32)
    }

    /// Restores the full-frame calibration and persists it.
    pub fn reset_to_default(&self) -> Result<CalibrationRecord, CalibrationError> {
        self.install(CalibrationRecord::full_frame(self.frame_width, self.frame_height))
    }

    /// Validates, persists and activates an explicit calibration.
    pub fn apply(&self, record: CalibrationRecord) -> Result<CalibrationRecord, CalibrationError> {
        record.validate()?;
        self.install(record)
    }

    fn install(&self, record: CalibrationRecord) -> Result<CalibrationRecord, CalibrationError> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.store.save(&record).map_err(CalibrationError::Persist)?;
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = record;
        info!(?record, "calibration updated");
        Ok(record)
    }
}

/// Linear map of `value` from [0, span] onto [from, to].
fn interpolate(value: f64, span: f64, from: f64, to: f64) -> f64 {
    from + (value / span) * (to - from)
}
