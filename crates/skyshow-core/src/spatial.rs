//! Planar geometry primitives shared by the hull and geofence code.

use serde::{Deserialize, Serialize};

use crate::models::Position;

/// Tolerance for orientation and containment predicates, in meters².
pub const GEOMETRY_EPS: f64 = 1e-9;

/// Point on the show's ground plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<Position> for Point2 {
    fn from(position: Position) -> Self {
        Self::new(position.x, position.y)
    }
}

impl From<&Position> for Point2 {
    fn from(position: &Position) -> Self {
        Self::new(position.x, position.y)
    }
}

impl From<(f64, f64)> for Point2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Twice the signed area of triangle `(o, a, b)`; positive when the turn
/// `o → a → b` is counter-clockwise.
pub fn cross(o: Point2, a: Point2, b: Point2) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Signed area of a polygon ring (positive for counter-clockwise rings).
pub fn signed_area(ring: &[Point2]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (i, a) in ring.iter().enumerate() {
        let b = ring[(i + 1) % ring.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

/// Whether `p` lies inside or on the boundary of a counter-clockwise convex
/// ring, with `eps` meters of slack.
pub fn convex_contains(ring: &[Point2], p: Point2, eps: f64) -> bool {
    if ring.is_empty() {
        return false;
    }
    if ring.len() == 1 {
        return ring[0].distance(&p) <= eps;
    }
    if ring.len() == 2 {
        return distance_to_segment(p, ring[0], ring[1]) <= eps;
    }
    (0..ring.len()).all(|i| {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        let len = a.distance(&b);
        // Normalize so the slack is a distance, not an area.
        len <= f64::EPSILON || cross(a, b, p) / len >= -eps
    })
}

/// Distance from `p` to the closed segment `a`–`b`.
pub fn distance_to_segment(p: Point2, a: Point2, b: Point2) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        return p.distance(&a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(&Point2::new(a.x + t * dx, a.y + t * dy))
}

/// Intersection of the infinite lines `p + s·d` and `q + t·e`.
///
/// Returns `None` when the lines are parallel (within tolerance).
pub fn line_intersection(p: Point2, d: (f64, f64), q: Point2, e: (f64, f64)) -> Option<Point2> {
    let denom = d.0 * e.1 - d.1 * e.0;
    let scale = (d.0.hypot(d.1) * e.0.hypot(e.1)).max(f64::MIN_POSITIVE);
    if (denom / scale).abs() <= GEOMETRY_EPS {
        return None;
    }
    let s = ((q.x - p.x) * e.1 - (q.y - p.y) * e.0) / denom;
    Some(Point2::new(p.x + s * d.0, p.y + s * d.1))
}
