// THEORY:
// A `Frame` is one image as it left the camera: an RGB pixel grid, the sequence
// number the acquisition loop gave it, and the instant it was captured. Frames are
// never mutated after publication; whoever needs one gets their own copy.

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// A captured RGB frame plus its place in the acquisition sequence.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbImage,
    /// Arrival order within one acquisition run, starting at 0.
    pub frame_id: u64,
    pub captured_at: Instant,
}

impl Frame {
    pub fn new(image: RgbImage, frame_id: u64) -> Self {
        Self {
            image,
            frame_id,
            captured_at: Instant::now(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Fixed orientation correction applied to every captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlipMode {
    None,
    /// Mirror left/right (flip around the vertical axis).
    #[default]
    Horizontal,
    /// Mirror top/bottom (flip around the horizontal axis).
    Vertical,
    /// Both mirrors, i.e. a 180° rotation.
    Both,
}

impl FlipMode {
    pub fn apply(self, image: &mut RgbImage) {
        use image::imageops;
        match self {
            FlipMode::None => {}
            FlipMode::Horizontal => imageops::flip_horizontal_in_place(image),
            FlipMode::Vertical => imageops::flip_vertical_in_place(image),
            FlipMode::Both => imageops::rotate180_in_place(image),
        }
    }
}
