// THEORY:
// The `LaserDetector` answers one question per frame: where, if anywhere, is the laser
// dot? It is a stateless function of the frame and the detector thresholds.
//
// Stages:
// 1.  **Blur**: a small Gaussian blur suppresses single-pixel sensor noise so that
//     isolated hot pixels cannot survive the brightness threshold.
// 2.  **Base Mask**: a pixel must be both very bright (HSV value) and clearly colored
//     (HSV saturation). Overexposed white areas and dim colored surfaces both fail.
// 3.  **Color Mask**: the pixel's hue must fall into one of the configured pointer
//     colors. Red is a single range wrapping through 0°, next to green and pink, so
//     several pointer colors are tracked at once without choosing one per session.
// 4.  **Blob Selection**: external regions of the combined mask are measured and the
//     largest one above the minimum area is chosen (see `blob_detector`).
// 5.  **Center**: the center of the selected region's minimal enclosing circle,
//     truncated to whole pixels, is the raw detection.

use crate::config::DetectorConfig;
use crate::core_modules::blob::{Blob, Point};
use crate::core_modules::blob_detector::blob_detector;
use crate::core_modules::enclosing_circle::min_enclosing_circle;
use crate::core_modules::pixel::pixel::Hsv;
use image::{GrayImage, Luma, RgbImage};
use tracing::trace;

const MASK_ON: Luma<u8> = Luma([255]);

pub struct LaserDetector {
    config: DetectorConfig,
}

impl LaserDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Raw pixel position of the laser dot in `frame`, or `None` if nothing qualifies.
    pub fn detect(&self, frame: &RgbImage) -> Option<Point> {
        let blobs = self.find_blobs(frame);
        let chosen = blob_detector::select_largest(&blobs, self.config.min_blob_area)?;
        let position = Self::blob_center(chosen)?;
        trace!(
            candidates = blobs.len(),
            area = chosen.area,
            x = position.x,
            y = position.y,
            "laser candidate selected"
        );
        Some(position)
    }

    /// Binary mask (0 or 255) of pixels that look like laser light.
    pub fn candidate_mask(&self, frame: &RgbImage) -> GrayImage {
        let blurred;
        let source = if self.config.blur_sigma > 0.0 {
            blurred = imageproc::filter::gaussian_blur_f32(frame, self.config.blur_sigma);
            &blurred
        } else {
            frame
        };

        let mut mask = GrayImage::new(source.width(), source.height());
        for (x, y, pixel) in source.enumerate_pixels() {
            if self.is_laser_colored(&Hsv::from(pixel)) {
                mask.put_pixel(x, y, MASK_ON);
            }
        }
        mask
    }

    /// All external blobs of the candidate mask, in raster-scan order.
    pub fn find_blobs(&self, frame: &RgbImage) -> Vec<Blob> {
        blob_detector::find_blobs(&self.candidate_mask(frame))
    }

    fn is_laser_colored(&self, hsv: &Hsv) -> bool {
        let bright_and_saturated =
            hsv.value >= self.config.bright_threshold && hsv.saturation >= self.config.saturation_threshold;
        bright_and_saturated && self.config.colors.iter().any(|color| color.contains(hsv))
    }

    fn blob_center(blob: &Blob) -> Option<Point> {
        let circle = min_enclosing_circle(&blob.contour)?;
        Some(Point::new(circle.center.0 as i32, circle.center.1 as i32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const RED: Rgb<u8> = Rgb([255, 0, 0]);
    const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
    const PINK: Rgb<u8> = Rgb([255, 0, 200]);
    const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn paint(frame: &mut RgbImage, x0: u32, y0: u32, size: u32, color: Rgb<u8>) {
        for y in y0..y0 + size {
            for x in x0..x0 + size {
                frame.put_pixel(x, y, color);
            }
        }
    }

    fn detector() -> LaserDetector {
        LaserDetector::new(DetectorConfig::default())
    }

    fn unblurred() -> LaserDetector {
        LaserDetector::new(DetectorConfig {
            blur_sigma: 0.0,
            ..DetectorConfig::default()
        })
    }

    #[test]
    fn dark_frame_has_no_detection() {
        let frame = RgbImage::new(64, 48);
        assert_eq!(detector().detect(&frame), None);
    }

    #[test]
    fn out_of_range_colors_are_ignored() {
        let mut frame = RgbImage::from_pixel(64, 48, Rgb([30, 30, 30]));
        paint(&mut frame, 5, 5, 14, WHITE);
        paint(&mut frame, 30, 20, 14, BLUE);
        paint(&mut frame, 45, 2, 10, Rgb([180, 0, 0]));
        assert_eq!(detector().detect(&frame), None);
    }

    #[test]
    fn single_red_blob_is_found_inside_its_bounds() {
        let mut frame = RgbImage::new(64, 48);
        paint(&mut frame, 20, 10, 12, RED);
        let position = detector().detect(&frame).expect("detection");
        assert!((20..32).contains(&position.x), "x = {}", position.x);
        assert!((10..22).contains(&position.y), "y = {}", position.y);
    }

    #[test]
    fn green_and_pink_pointers_are_supported() {
        for color in [GREEN, PINK] {
            let mut frame = RgbImage::new(64, 48);
            paint(&mut frame, 30, 20, 12, color);
            let position = detector().detect(&frame).expect("detection");
            assert!((30..42).contains(&position.x));
            assert!((20..32).contains(&position.y));
        }
    }

    #[test]
    fn larger_blob_wins_in_either_position() {
        let mut frame = RgbImage::new(96, 48);
        paint(&mut frame, 4, 4, 10, RED);
        paint(&mut frame, 50, 20, 18, GREEN);
        let position = detector().detect(&frame).expect("detection");
        assert!((50..68).contains(&position.x));

        let mut frame = RgbImage::new(96, 48);
        paint(&mut frame, 4, 4, 18, RED);
        paint(&mut frame, 60, 20, 10, GREEN);
        let position = detector().detect(&frame).expect("detection");
        assert!((4..22).contains(&position.x));
    }

    #[test]
    fn equal_blobs_resolve_to_first_in_scan_order() {
        let mut frame = RgbImage::new(96, 48);
        paint(&mut frame, 60, 10, 12, RED);
        paint(&mut frame, 10, 10, 12, RED);
        let position = detector().detect(&frame).expect("detection");
        assert!((10..22).contains(&position.x), "x = {}", position.x);
    }

    #[test]
    fn speckle_below_min_area_is_rejected() {
        let mut frame = RgbImage::new(32, 32);
        paint(&mut frame, 10, 10, 2, RED);
        assert_eq!(unblurred().detect(&frame), None);

        paint(&mut frame, 20, 20, 4, RED);
        let position = unblurred().detect(&frame).expect("detection");
        assert_eq!((position.x, position.y), (21, 21));
    }

    #[test]
    fn blur_removes_isolated_hot_pixels() {
        let mut frame = RgbImage::new(32, 32);
        paint(&mut frame, 10, 10, 3, RED);
        assert_eq!(detector().detect(&frame), None);
    }

    #[test]
    fn mask_marks_only_candidate_pixels() {
        let mut frame = RgbImage::new(16, 16);
        frame.put_pixel(3, 4, RED);
        frame.put_pixel(5, 5, WHITE);
        let mask = unblurred().candidate_mask(&frame);
        assert_eq!(mask.get_pixel(3, 4), &Luma([255]));
        assert_eq!(mask.get_pixel(5, 5), &Luma([0]));
        assert_eq!(mask.pixels().filter(|p| p.0[0] == 255).count(), 1);
    }

    #[test]
    fn dot_in_top_left_corner_is_found() {
        let mut frame = RgbImage::new(64, 48);
        paint(&mut frame, 0, 0, 10, RED);
        assert_eq!(unblurred().find_blobs(&frame).len(), 1);
        assert_eq!(unblurred().detect(&frame), Some(Point::new(4, 4)));

        let mut frame = RgbImage::new(64, 48);
        paint(&mut frame, 0, 0, 12, RED);
        let position = detector().detect(&frame).expect("detection");
        assert!((0..12).contains(&position.x), "x = {}", position.x);
        assert!((0..12).contains(&position.y), "y = {}", position.y);
    }

    #[test]
    fn dot_flush_with_bottom_right_edge_is_found() {
        let mut frame = RgbImage::new(64, 48);
        paint(&mut frame, 54, 38, 10, GREEN);
        assert_eq!(unblurred().find_blobs(&frame).len(), 1);
        assert_eq!(unblurred().detect(&frame), Some(Point::new(58, 42)));
    }

    #[test]
    fn frame_entirely_in_range_is_one_blob() {
        let frame = RgbImage::from_pixel(64, 48, RED);
        for detector in [unblurred(), detector()] {
            assert_eq!(detector.find_blobs(&frame).len(), 1);
            let position = detector.detect(&frame).expect("detection");
            assert!((0..64).contains(&position.x), "x = {}", position.x);
            assert!((0..48).contains(&position.y), "y = {}", position.y);
        }
    }

    #[test]
    fn orange_red_at_the_band_edge_counts_as_red() {
        let mut frame = RgbImage::new(32, 32);
        paint(&mut frame, 8, 8, 8, Rgb([255, 87, 0]));
        assert!(unblurred().detect(&frame).is_some());
    }
}
