pub mod blob;
pub mod blob_detector;
pub mod calibration;
#[cfg(feature = "camera")]
pub mod camera;
pub mod enclosing_circle;
pub mod frame;
pub mod frame_buffer;
pub mod frame_source;
pub mod laser_detector;
pub mod pixel;
pub mod smoother;
pub mod utils;
