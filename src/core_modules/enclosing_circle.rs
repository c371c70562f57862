// THEORY:
// The laser dot's reported pixel is the center of the smallest circle enclosing the
// selected blob's contour. For a round dot this is its center; for a smeared or
// clipped dot it is still the middle of the lit extent, and unlike a centroid it
// is not pulled around by ragged mask edges.
//
// The circle is found with Welzl's incremental algorithm over the contour's convex
// hull (only hull points can lie on the minimal circle).

use crate::core_modules::blob::Point;

const CONTAINMENT_EPSILON: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: (f64, f64),
    pub radius: f64,
}

impl Circle {
    fn around(point: (f64, f64)) -> Self {
        Self { center: point, radius: 0.0 }
    }

    fn contains(&self, point: (f64, f64)) -> bool {
        distance(self.center, point) <= self.radius + CONTAINMENT_EPSILON * self.radius.max(1.0)
    }
}

/// Smallest circle enclosing every point of `contour`, or `None` for an empty contour.
pub fn min_enclosing_circle(contour: &[Point]) -> Option<Circle> {
    let hull_input: Vec<imageproc::point::Point<i32>> = contour
        .iter()
        .map(|p| imageproc::point::Point::new(p.x, p.y))
        .collect();
    let hull = imageproc::geometry::convex_hull(hull_input.as_slice());
    let all_points: Vec<(f64, f64)> = contour.iter().map(|p| (p.x as f64, p.y as f64)).collect();
    let hull_points: Vec<(f64, f64)> = hull.iter().map(|p| (p.x as f64, p.y as f64)).collect();

    match welzl(&hull_points) {
        Some(circle) if all_points.iter().all(|&p| circle.contains(p)) => Some(circle),
        // Hull came back empty or lost an extreme point of a degenerate contour.
        _ => welzl(&all_points),
    }
}

/// Iterative Welzl over floating point coordinates.
pub fn welzl(points: &[(f64, f64)]) -> Option<Circle> {
    let first = *points.first()?;
    let mut circle = Circle::around(first);
    for i in 1..points.len() {
        if circle.contains(points[i]) {
            continue;
        }
        circle = Circle::around(points[i]);
        for j in 0..i {
            if circle.contains(points[j]) {
                continue;
            }
            circle = diameter_circle(points[i], points[j]);
            for k in 0..j {
                if !circle.contains(points[k]) {
                    circle = circumcircle(points[i], points[j], points[k]);
                }
            }
        }
    }
    Some(circle)
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

fn diameter_circle(a: (f64, f64), b: (f64, f64)) -> Circle {
    Circle {
        center: ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0),
        radius: distance(a, b) / 2.0,
    }
}

fn circumcircle(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> Circle {
    let (bx, by) = (b.0 - a.0, b.1 - a.1);
    let (cx, cy) = (c.0 - a.0, c.1 - a.1);
    let d = 2.0 * (bx * cy - by * cx);
    if d.abs() < f64::EPSILON {
        // Collinear: the farthest pair spans the circle.
        return [diameter_circle(a, b), diameter_circle(a, c), diameter_circle(b, c)]
            .into_iter()
            .fold(Circle::around(a), |best, candidate| {
                if candidate.radius > best.radius { candidate } else { best }
            });
    }
    let b_sq = bx * bx + by * by;
    let c_sq = cx * cx + cy * cy;
    let ux = (cy * b_sq - by * c_sq) / d;
    let uy = (bx * c_sq - cx * b_sq) / d;
    Circle {
        center: (a.0 + ux, a.1 + uy),
        radius: (ux * ux + uy * uy).sqrt(),
    }
}
