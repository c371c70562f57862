// THEORY:
// Each concern of the engine owns one error enum. Acquisition errors never reach
// a position query (the acquisition loop swallows and retries them), calibration
// errors are returned to whoever asked for the calibration change, and
// configuration errors only ever surface at startup.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of a capture device or of the acquisition task that drives it.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture device {0} could not be opened")]
    DeviceUnavailable(String),
    #[error("capture device returned no frame")]
    EmptyFrame,
    #[error("frame of {actual} bytes does not fit {width}x{height} RGB")]
    FrameSize { width: u32, height: u32, actual: usize },
    #[cfg(feature = "camera")]
    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
    #[error("acquisition task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Failures of a `CalibrationStore` backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("calibration store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("calibration record is malformed: {0}")]
    Format(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("invalid calibration record: {0}")]
    InvalidRecord(String),
    /// The store rejected the record. The previously active record is still in effect.
    #[error("calibration was not persisted, previous calibration kept: {0}")]
    Persist(#[source] StoreError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}
