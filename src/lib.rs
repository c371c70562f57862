// THEORY:
// This file is the main entry point for the `laser_vision` library crate.
// The public face of the engine is the `LaserTracker` in `pipeline`, together with
// its configuration (`config`) and error types (`error`). The stages it is built
// from live in `core_modules` and stay public so a host can drive them directly,
// e.g. to run the detector on still images or plug in its own capture device.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use config::TrackerConfig;
pub use core_modules::calibration::{CalibrationRecord, CalibrationStore, JsonFileStore, MemoryStore};
pub use core_modules::frame_source::{AcquisitionHandle, CaptureDevice};
pub use pipeline::{LaserPosition, LaserTracker, Point, TrackingState};
