// THEORY:
// A `Blob` is one connected region of candidate pixels in a single frame's mask,
// summarized by its outer contour, the area that contour encloses and its bounding
// box. Blobs are stateless snapshots; nothing here remembers previous frames.
//
// `Point` doubles as the integer coordinate type of the whole engine: raw pixel
// detections, calibration corners and reported positions are all `Point`s.

use serde::{Deserialize, Serialize};

/// A 2D integer coordinate. Serialized as a JSON pair `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<[i32; 2]> for Point {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [i32; 2] {
    fn from(point: Point) -> Self {
        [point.x, point.y]
    }
}

/// A single connected region of the candidate mask.
#[derive(Debug, Clone)]
pub struct Blob {
    /// Position of this blob in raster-scan discovery order for the current frame only.
    pub id: u64,
    /// Top-left and bottom-right corners of the region, inclusive.
    pub bounding_box: (Point, Point),
    /// The outer border pixels, in traversal order.
    pub contour: Vec<Point>,
    /// Polygon area enclosed by `contour`, in px². A lone pixel or a one-pixel line has area 0.
    pub area: f64,
}

impl Blob {
    pub fn from_contour(id: u64, contour: Vec<Point>) -> Self {
        let mut min = Point::new(i32::MAX, i32::MAX);
        let mut max = Point::new(i32::MIN, i32::MIN);
        for point in &contour {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
        }
        let area = polygon_area(&contour);
        Self {
            id,
            bounding_box: (min, max),
            contour,
            area,
        }
    }
}

/// Shoelace area of a closed polygon.
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        twice_area += a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
    }
    twice_area.abs() as f64 / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_border_area() {
        // Border pixel centers of a filled 4x4 square.
        let contour = vec![
            Point::new(0, 0),
            Point::new(0, 1),
            Point::new(0, 2),
            Point::new(0, 3),
            Point::new(1, 3),
            Point::new(2, 3),
            Point::new(3, 3),
            Point::new(3, 2),
            Point::new(3, 1),
            Point::new(3, 0),
            Point::new(2, 0),
            Point::new(1, 0),
        ];
        let blob = Blob::from_contour(0, contour);
        assert_eq!(blob.area, 9.0);
        assert_eq!(blob.bounding_box, (Point::new(0, 0), Point::new(3, 3)));
    }

    #[test]
    fn degenerate_contours_have_no_area() {
        assert_eq!(polygon_area(&[Point::new(5, 5)]), 0.0);
        assert_eq!(polygon_area(&[Point::new(0, 0), Point::new(3, 0), Point::new(0, 0)]), 0.0);
    }

    #[test]
    fn point_serializes_as_pair() {
        let json = serde_json::to_string(&Point::new(1280, -3)).expect("serialize");
        assert_eq!(json, "[1280,-3]");
        let back: Point = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, Point::new(1280, -3));
    }
}
