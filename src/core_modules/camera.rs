// THEORY:
// `OpenCvCamera` is the production `CaptureDevice`: a V4L2/DirectShow/AVFoundation
// camera opened through OpenCV's videoio backend. It converts the backend's BGR
// frames into the RGB images the engine works on and releases the device when it
// is dropped.

use crate::core_modules::frame_source::CaptureDevice;
use crate::error::CaptureError;
use image::RgbImage;
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};
use tracing::{info, warn};

pub struct OpenCvCamera {
    capture: VideoCapture,
    index: i32,
    bgr: Mat,
    rgb: Mat,
}

impl OpenCvCamera {
    /// Opens camera `index` and requests the given resolution.
    pub fn open(index: i32, width: u32, height: u32) -> Result<Self, CaptureError> {
        let mut capture = VideoCapture::new(index, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(CaptureError::DeviceUnavailable(format!("camera {index}")));
        }
        capture.set(videoio::CAP_PROP_FRAME_WIDTH, width as f64)?;
        capture.set(videoio::CAP_PROP_FRAME_HEIGHT, height as f64)?;

        let actual_width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let actual_height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
        if (actual_width, actual_height) != (width, height) {
            warn!(
                "camera {index} delivers {actual_width}x{actual_height} instead of the requested {width}x{height}"
            );
        }
        info!("opened camera {index} at {actual_width}x{actual_height}");

        Ok(Self {
            capture,
            index,
            bgr: Mat::default(),
            rgb: Mat::default(),
        })
    }
}

impl CaptureDevice for OpenCvCamera {
    fn read_frame(&mut self) -> Result<RgbImage, CaptureError> {
        if !self.capture.read(&mut self.bgr)? || self.bgr.empty() {
            return Err(CaptureError::EmptyFrame);
        }
        imgproc::cvt_color(&self.bgr, &mut self.rgb, imgproc::COLOR_BGR2RGB, 0)?;

        let width = self.rgb.cols() as u32;
        let height = self.rgb.rows() as u32;
        let bytes = self.rgb.data_bytes()?.to_vec();
        let actual = bytes.len();
        RgbImage::from_raw(width, height, bytes).ok_or(CaptureError::FrameSize { width, height, actual })
    }

    fn describe(&self) -> String {
        format!("camera {}", self.index)
    }
}

impl Drop for OpenCvCamera {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            warn!("camera {} did not release cleanly: {e}", self.index);
        }
    }
}
