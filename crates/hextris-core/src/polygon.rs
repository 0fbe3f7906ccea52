//! Planar polygon helpers used for hexagon overlap and hit testing.
//!
//! All polygons handled here are convex (hexagons), which keeps clipping to a
//! single Sutherland-Hodgman pass.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A point in pixel space (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Shoelace area, positive for counter-clockwise winding in a y-up frame.
pub fn signed_area(polygon: &[Point]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let twice: f64 = polygon
        .iter()
        .zip(polygon.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum();
    twice / 2.0
}

/// Unsigned polygon area.
pub fn area(polygon: &[Point]) -> f64 {
    signed_area(polygon).abs()
}

/// Cross product of (b - a) x (p - a).
fn cross(a: Point, b: Point, p: Point) -> f64 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Intersection of segment `p -> q` with the infinite line through `a -> b`.
fn line_intersection(p: Point, q: Point, a: Point, b: Point) -> Point {
    let denom = (p.x - q.x) * (a.y - b.y) - (p.y - q.y) * (a.x - b.x);
    if denom.abs() < f64::EPSILON {
        // Parallel: the caller only asks when p and q straddle the line, so
        // this only happens for degenerate slivers.
        return q;
    }
    let t = ((p.x - a.x) * (a.y - b.y) - (p.y - a.y) * (a.x - b.x)) / denom;
    Point::new(p.x + t * (q.x - p.x), p.y + t * (q.y - p.y))
}

/// Clip `subject` against the convex polygon `clip` (Sutherland-Hodgman).
///
/// Returns the vertices of the overlapping region, or an empty list when the
/// polygons do not overlap. Works for either winding of `clip`.
pub fn clip_convex(subject: &[Point], clip: &[Point]) -> Vec<Point> {
    if subject.len() < 3 || clip.len() < 3 {
        return Vec::new();
    }
    let winding = if signed_area(clip) >= 0.0 { 1.0 } else { -1.0 };
    let mut output = subject.to_vec();

    for (i, &a) in clip.iter().enumerate() {
        let b = clip[(i + 1) % clip.len()];
        let input = std::mem::take(&mut output);
        if input.is_empty() {
            break;
        }
        let inside = |p: Point| winding * cross(a, b, p) >= 0.0;

        for (j, &current) in input.iter().enumerate() {
            let previous = input[(j + input.len() - 1) % input.len()];
            match (inside(previous), inside(current)) {
                (true, true) => output.push(current),
                (true, false) => output.push(line_intersection(previous, current, a, b)),
                (false, true) => {
                    output.push(line_intersection(previous, current, a, b));
                    output.push(current);
                }
                (false, false) => {}
            }
        }
    }

    output
}

/// Area of the overlap between two convex polygons.
pub fn intersection_area(a: &[Point], b: &[Point]) -> f64 {
    let overlap = clip_convex(a, b);
    if overlap.len() < 3 {
        0.0
    } else {
        area(&overlap)
    }
}

/// Point-in-convex-polygon test; points on the boundary count as inside.
pub fn contains(polygon: &[Point], point: Point) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let winding = if signed_area(polygon) >= 0.0 { 1.0 } else { -1.0 };
    polygon
        .iter()
        .zip(polygon.iter().cycle().skip(1))
        .all(|(&a, &b)| winding * cross(a, b, point) >= 0.0)
}
