// THEORY:
// The `BlobDetector` is the spatial grouping stage of the laser pipeline. It takes the
// binary candidate mask of one frame and turns it into a list of `Blob`s, then picks
// the one most likely to be the laser dot.
//
// Algorithm steps:
// 1.  **External Contours**: border following over the mask yields every region's
//     outer border. Only outermost borders are kept; a region sitting inside a hole
//     of another region is part of that region's story, not a separate candidate.
// 2.  **Area**: each border is measured as a polygon (shoelace over its pixel
//     centers). Thin slivers and lone pixels measure close to zero, which is what
//     makes the minimum-area filter reject sensor speckle.
// 3.  **Selection**: the largest area wins. Equal areas keep the blob discovered
//     first in raster-scan order (top-to-bottom, left-to-right), so the choice is
//     reproducible. The winner is only reported if it reaches the minimum area.
// 4.  **Stateless Utility**: no memory of previous frames lives here.

use crate::core_modules::blob::{Blob, Point};

pub mod blob_detector {
    use super::*;
    use image::GrayImage;
    use imageproc::contours::{BorderType, find_contours};

    /// Finds every external region of non-zero pixels in `mask`, in raster-scan order.
    pub fn find_blobs(mask: &GrayImage) -> Vec<Blob> {
        // Border following only reports a region as an outer border when a background
        // pixel separates it from the image edge, so trace on a one-pixel zero frame.
        let padded = with_zero_border(mask);
        find_contours::<i32>(&padded)
            .into_iter()
            .filter(|contour| matches!(contour.border_type, BorderType::Outer) && contour.parent.is_none())
            .enumerate()
            .map(|(id, contour)| {
                let points = contour.points.iter().map(|p| Point::new(p.x - 1, p.y - 1)).collect();
                Blob::from_contour(id as u64, points)
            })
            .collect()
    }

    /// The largest blob, provided it covers at least `min_area` px².
    pub fn select_largest(blobs: &[Blob], min_area: f64) -> Option<&Blob> {
        let mut best: Option<&Blob> = None;
        for blob in blobs {
            // Strict comparison keeps the earliest blob on ties.
            if best.is_none_or(|current| blob.area > current.area) {
                best = Some(blob);
            }
        }
        best.filter(|blob| blob.area >= min_area)
    }

    fn with_zero_border(mask: &GrayImage) -> GrayImage {
        let mut padded = GrayImage::new(mask.width() + 2, mask.height() + 2);
        image::imageops::replace(&mut padded, mask, 1, 1);
        padded
    }
}

#[cfg(test)]
mod tests {
    use super::blob_detector::*;
    use super::*;
    use image::{GrayImage, Luma};

    fn fill(mask: &mut GrayImage, x0: u32, y0: u32, width: u32, height: u32) {
        for y in y0..y0 + height {
            for x in x0..x0 + width {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }

    #[test]
    fn empty_mask_has_no_blobs() {
        let mask = GrayImage::new(32, 32);
        assert!(find_blobs(&mask).is_empty());
    }

    #[test]
    fn rectangles_are_measured_by_border_polygon() {
        let mut mask = GrayImage::new(32, 32);
        fill(&mut mask, 4, 4, 4, 4);
        fill(&mut mask, 20, 10, 2, 2);
        let blobs = find_blobs(&mask);
        assert_eq!(blobs.len(), 2);
        assert_eq!(blobs[0].area, 9.0);
        assert_eq!(blobs[0].bounding_box, (Point::new(4, 4), Point::new(7, 7)));
        assert_eq!(blobs[1].area, 1.0);
    }

    #[test]
    fn ring_counts_as_one_external_blob() {
        let mut mask = GrayImage::new(32, 32);
        fill(&mut mask, 5, 5, 12, 12);
        for y in 8..14 {
            for x in 8..14 {
                mask.put_pixel(x, y, Luma([0]));
            }
        }
        // An island inside the hole is not an external contour.
        fill(&mut mask, 10, 10, 2, 2);
        let blobs = find_blobs(&mask);
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].area, 121.0);
    }

    #[test]
    fn largest_blob_wins_regardless_of_order() {
        let mut mask = GrayImage::new(64, 32);
        fill(&mut mask, 2, 2, 4, 4);
        fill(&mut mask, 30, 10, 8, 8);
        let blobs = find_blobs(&mask);
        let chosen = select_largest(&blobs, 4.0).expect("blob");
        assert_eq!(chosen.area, 49.0);

        let mut mask = GrayImage::new(64, 32);
        fill(&mut mask, 2, 2, 8, 8);
        fill(&mut mask, 30, 10, 4, 4);
        let blobs = find_blobs(&mask);
        let chosen = select_largest(&blobs, 4.0).expect("blob");
        assert_eq!(chosen.area, 49.0);
        assert_eq!(chosen.bounding_box.0, Point::new(2, 2));
    }

    #[test]
    fn equal_areas_keep_first_in_scan_order() {
        let mut mask = GrayImage::new(64, 32);
        fill(&mut mask, 40, 10, 5, 5);
        fill(&mut mask, 5, 10, 5, 5);
        let blobs = find_blobs(&mask);
        let chosen = select_largest(&blobs, 4.0).expect("blob");
        assert_eq!(chosen.id, 0);
        assert_eq!(chosen.bounding_box.0, Point::new(5, 10));
    }

    #[test]
    fn small_winner_is_rejected() {
        let mut mask = GrayImage::new(16, 16);
        fill(&mut mask, 3, 3, 2, 2);
        let blobs = find_blobs(&mask);
        assert!(select_largest(&blobs, 4.0).is_none());
        assert!(select_largest(&blobs, 1.0).is_some());
    }

    #[test]
    fn regions_touching_the_frame_edge_are_found() {
        let mut mask = GrayImage::new(20, 20);
        fill(&mut mask, 0, 0, 5, 5);
        fill(&mut mask, 10, 10, 4, 4);
        let blobs = find_blobs(&mask);
        assert_eq!(blobs.len(), 2);
        assert_eq!(blobs[0].bounding_box, (Point::new(0, 0), Point::new(4, 4)));
        assert_eq!(blobs[0].area, 16.0);
        assert_eq!(select_largest(&blobs, 4.0).expect("blob").id, 0);
    }

    #[test]
    fn region_flush_with_right_and_bottom_edges_is_found() {
        let mut mask = GrayImage::new(20, 16);
        fill(&mut mask, 14, 10, 6, 6);
        let blobs = find_blobs(&mask);
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].bounding_box, (Point::new(14, 10), Point::new(19, 15)));
        assert_eq!(blobs[0].area, 25.0);
    }

    #[test]
    fn fully_lit_mask_is_one_region() {
        let mask = GrayImage::from_pixel(12, 8, Luma([255]));
        let blobs = find_blobs(&mask);
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].bounding_box, (Point::new(0, 0), Point::new(11, 7)));
        assert_eq!(blobs[0].area, 77.0);
    }
}
