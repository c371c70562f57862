// THEORY:
// `TrackerConfig` gathers every tunable of the engine in one serde-friendly tree.
// Every field has a default, so a config file only needs to name what it changes.
// The defaults reproduce the reference camera setup: a 1280x720 sensor mirrored
// horizontally, red/green/pink pointers, a 4 px² minimum blob and a 3-frame
// smoothing window.

use crate::core_modules::frame::FlipMode;
use crate::core_modules::pixel::pixel::Hsv;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_FRAME_WIDTH: u32 = 1280;
pub const DEFAULT_FRAME_HEIGHT: u32 = 720;
pub const DEFAULT_MIN_BLOB_AREA: f64 = 4.0;
pub const DEFAULT_SMOOTHING_WINDOW: usize = 3;

/// Top-level configuration for the `LaserTracker`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub capture: CaptureConfig,
    pub detector: DetectorConfig,
    /// Number of recent detection cycles averaged into the reported position.
    pub smoothing_window: usize,
    /// Where the calibration record is persisted.
    pub calibration_path: PathBuf,
}

/// Camera-facing settings. The resolution is also the pixel space the calibration maps from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub camera_index: i32,
    pub width: u32,
    pub height: u32,
    pub flip: FlipMode,
    /// Pause after a failed read before the next attempt.
    pub retry_delay_ms: u64,
}

/// Thresholds of the color segmentation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Gaussian blur sigma applied before segmentation. Zero or less disables the blur.
    pub blur_sigma: f32,
    /// Minimum HSV value (0-255) for the "bright" half of the base mask.
    pub bright_threshold: u8,
    /// Minimum HSV saturation (0-255) for the "saturated" half of the base mask.
    pub saturation_threshold: u8,
    /// Smallest contour area, in px², that can be reported as the laser dot.
    pub min_blob_area: f64,
    /// Accepted pointer colors. A pixel must fall inside at least one.
    pub colors: Vec<ColorRange>,
}

/// A band of the hue wheel plus the saturation/value floor a pointer of that color reaches.
///
/// When `hue_min > hue_max` the band wraps through 0°, which is how red is expressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRange {
    pub name: String,
    pub hue_min: f32,
    pub hue_max: f32,
    pub saturation_min: u8,
    pub value_min: u8,
}

impl ColorRange {
    pub fn new(name: &str, hue_min: f32, hue_max: f32, saturation_min: u8, value_min: u8) -> Self {
        Self {
            name: name.to_string(),
            hue_min,
            hue_max,
            saturation_min,
            value_min,
        }
    }

    pub fn wraps(&self) -> bool {
        self.hue_min > self.hue_max
    }

    pub fn contains(&self, hsv: &Hsv) -> bool {
        let hue_ok = if self.wraps() {
            hsv.hue >= self.hue_min || hsv.hue <= self.hue_max
        } else {
            hsv.hue >= self.hue_min && hsv.hue <= self.hue_max
        };
        hue_ok && hsv.saturation >= self.saturation_min && hsv.value >= self.value_min
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            camera_index: 0,
            width: DEFAULT_FRAME_WIDTH,
            height: DEFAULT_FRAME_HEIGHT,
            flip: FlipMode::Horizontal,
            retry_delay_ms: 10,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            // Sigma of a 5x5 Gaussian kernel.
            blur_sigma: 1.1,
            bright_threshold: 240,
            saturation_threshold: 120,
            min_blob_area: DEFAULT_MIN_BLOB_AREA,
            // Bands of the 8-bit hue scale (red 0-10 and 160-180, green 35-90, pink
            // 140-165) in degrees. A half-degree byte rounds, so each band reaches one
            // degree past twice its limits.
            colors: vec![
                ColorRange::new("red", 319.0, 21.0, 120, 200),
                ColorRange::new("green", 69.0, 181.0, 120, 200),
                ColorRange::new("pink", 279.0, 331.0, 80, 200),
            ],
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::default(),
            detector: DetectorConfig::default(),
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            calibration_path: PathBuf::from("calibration.json"),
        }
    }
}

impl TrackerConfig {
    /// Reads a JSON config file. Fields missing from the file keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capture.width == 0 || self.capture.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "capture resolution {}x{} has a zero dimension",
                self.capture.width, self.capture.height
            )));
        }
        if self.smoothing_window == 0 {
            return Err(ConfigError::Invalid("smoothing_window must be at least 1".into()));
        }
        self.detector.validate()
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.blur_sigma.is_finite() {
            return Err(ConfigError::Invalid("blur_sigma must be finite".into()));
        }
        if !(self.min_blob_area.is_finite() && self.min_blob_area >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "min_blob_area {} must be a non-negative number",
                self.min_blob_area
            )));
        }
        if self.colors.is_empty() {
            return Err(ConfigError::Invalid("at least one pointer color is required".into()));
        }
        for color in &self.colors {
            for bound in [color.hue_min, color.hue_max] {
                if !(0.0..=360.0).contains(&bound) {
                    return Err(ConfigError::Invalid(format!(
                        "hue bound {bound} of color '{}' is outside 0..=360",
                        color.name
                    )));
                }
            }
        }
        Ok(())
    }
}
