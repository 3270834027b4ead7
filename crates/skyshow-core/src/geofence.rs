//! Automatic geofence around the show's takeoff and landing positions.
//!
//! Pipeline: convex hull → outward edge offset → outward-only simplification
//! → altitude ceiling. The generator is stateless; every call recomputes the
//! polygon from scratch so a watcher can call it repeatedly and throw away
//! stale results.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::frame::LocalFrame;
use crate::hull::{convex_hull, ConvexHull};
use crate::models::Position;
use crate::settings::GeofenceSettings;
use crate::spatial::{convex_contains, cross, line_intersection, signed_area, Point2, GEOMETRY_EPS};

/// Neighbouring edges whose directions are closer to parallel than this
/// (as the sine of the angle between them) are not extended.
const CONVERGENCE_EPS: f64 = 1e-9;

/// Computed safety boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofencePolygon {
    /// Counter-clockwise ring, lowest-then-leftmost vertex first, not closed
    pub vertices: Vec<Point2>,
    pub altitude_ceiling_m: f64,
}

impl GeofencePolygon {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn area(&self) -> f64 {
        signed_area(&self.vertices)
    }

    pub fn contains(&self, p: Point2, eps: f64) -> bool {
        convex_contains(&self.vertices, p, eps)
    }

    /// Closed `[lat, lon]` ring for transmission to vehicles.
    pub fn to_geodetic(&self, frame: &LocalFrame) -> Vec<[f64; 2]> {
        let mut ring: Vec<[f64; 2]> = self
            .vertices
            .iter()
            .map(|p| {
                let (lat, lon) = frame.to_geodetic(*p);
                [lat, lon]
            })
            .collect();
        if let Some(first) = ring.first().copied() {
            ring.push(first);
        }
        ring
    }
}

/// Stateless geofence generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeofenceGenerator;

impl GeofenceGenerator {
    /// Build the geofence for a set of takeoff/landing positions.
    ///
    /// The hull uses the horizontal projection of `points`; the ceiling is
    /// the highest `z` plus the vertical margin.
    pub fn recompute(points: &[Position], settings: &GeofenceSettings) -> Result<GeofencePolygon> {
        settings.validate()?;
        if let Some(bad) = points.iter().find(|p| !p.is_finite()) {
            return Err(EngineError::InvalidSnapshot(format!(
                "boundary point {:?} has a non-finite coordinate",
                bad
            )));
        }

        let max_altitude = points
            .iter()
            .map(|p| p.z)
            .fold(f64::NEG_INFINITY, f64::max);
        let hull = convex_hull(points.iter());
        let polygon = Self::from_hull(&hull, max_altitude, settings)?;

        tracing::debug!(
            "Geofence recomputed: {} points, hull {} vertices, fence {} vertices, ceiling {:.1}m",
            points.len(),
            hull.len(),
            polygon.vertex_count(),
            polygon.altitude_ceiling_m
        );
        Ok(polygon)
    }

    /// Offset and simplify an existing hull.
    pub fn from_hull(
        hull: &ConvexHull,
        max_altitude_m: f64,
        settings: &GeofenceSettings,
    ) -> Result<GeofencePolygon> {
        settings.validate()?;
        let ring = hull.require_polygon()?;

        let mut vertices = offset_polygon(ring, settings.horizontal_margin_m);
        if vertices.len() > settings.max_vertex_count {
            if !settings.simplify {
                return Err(EngineError::InvalidSettings(format!(
                    "geofence needs {} vertices but at most {} are allowed \
                     and simplification is disabled",
                    vertices.len(),
                    settings.max_vertex_count
                )));
            }
            vertices = simplify_outward(vertices, settings.max_vertex_count);
        }
        rotate_to_canonical_start(&mut vertices);

        Ok(GeofencePolygon {
            vertices,
            altitude_ceiling_m: max_altitude_m + settings.vertical_margin_m,
        })
    }
}

/// Move every edge of a counter-clockwise convex ring outward by `margin`
/// and join consecutive edges at their intersection.
///
/// Joining offset edges (instead of pushing vertices along their bisectors)
/// keeps the result convex at sharp corners.
pub fn offset_polygon(ring: &[Point2], margin: f64) -> Vec<Point2> {
    let n = ring.len();
    if margin == 0.0 || n < 3 {
        return ring.to_vec();
    }

    // Offset line of edge i: passes through `anchors[i]` along `dirs[i]`.
    let mut anchors = Vec::with_capacity(n);
    let mut dirs = Vec::with_capacity(n);
    let mut normals = Vec::with_capacity(n);
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        let d = (b.x - a.x, b.y - a.y);
        let len = d.0.hypot(d.1).max(f64::MIN_POSITIVE);
        let normal = (d.1 / len, -d.0 / len);
        anchors.push(Point2::new(a.x + normal.0 * margin, a.y + normal.1 * margin));
        dirs.push(d);
        normals.push(normal);
    }

    (0..n)
        .map(|i| {
            let prev = (i + n - 1) % n;
            line_intersection(anchors[prev], dirs[prev], anchors[i], dirs[i]).unwrap_or_else(|| {
                // Collinear neighbours: plain normal push is exact.
                Point2::new(
                    ring[i].x + normals[i].0 * margin,
                    ring[i].y + normals[i].1 * margin,
                )
            })
        })
        .collect()
}

/// Reduce a counter-clockwise convex ring to at most `max_vertices` vertices
/// without giving up any area.
///
/// Each step removes one edge by extending its two neighbouring edges until
/// they meet, which adds the triangle between the edge and the meeting point.
/// The edge adding the least area wins, ties going to the lowest index. If no
/// neighbouring pair converges (a parallelogram) the ring is replaced by a
/// circumscribed triangle.
pub fn simplify_outward(mut ring: Vec<Point2>, max_vertices: usize) -> Vec<Point2> {
    let max_vertices = max_vertices.max(GeofenceSettings::MIN_VERTEX_COUNT);

    while ring.len() > max_vertices {
        let n = ring.len();
        let mut best: Option<(usize, Point2, f64)> = None;

        for i in 0..n {
            let Some((apex, added)) = edge_removal(&ring, i) else {
                continue;
            };
            if best.map(|(_, _, area)| added < area).unwrap_or(true) {
                best = Some((i, apex, added));
            }
        }

        match best {
            Some((i, apex, _)) => {
                let next = (i + 1) % n;
                ring[i] = apex;
                ring.remove(next);
            }
            None => {
                let triangle = circumscribed_triangle(&ring);
                return if triangle.len() <= max_vertices {
                    triangle
                } else {
                    ring
                };
            }
        }
    }

    ring
}

/// Meeting point of the edges around edge `i` (from vertex `i` to `i + 1`)
/// and the area that replacing the edge by that point adds.
fn edge_removal(ring: &[Point2], i: usize) -> Option<(Point2, f64)> {
    let n = ring.len();
    let prev = ring[(i + n - 1) % n];
    let a = ring[i];
    let b = ring[(i + 1) % n];
    let next = ring[(i + 2) % n];

    let d_prev = (a.x - prev.x, a.y - prev.y);
    let d_next = (next.x - b.x, next.y - b.y);
    let scale = d_prev.0.hypot(d_prev.1) * d_next.0.hypot(d_next.1);
    if scale <= f64::MIN_POSITIVE {
        return None;
    }
    let turn = (d_prev.0 * d_next.1 - d_prev.1 * d_next.0) / scale;
    if turn <= CONVERGENCE_EPS {
        return None;
    }

    let apex = line_intersection(a, d_prev, b, d_next)?;
    let added = cross(a, apex, b).abs() / 2.0;
    Some((apex, added))
}

/// Triangle bounded by three support lines whose outward normals are 120°
/// apart, starting from the normal of the longest edge.
fn circumscribed_triangle(ring: &[Point2]) -> Vec<Point2> {
    let n = ring.len();
    let mut longest = 0;
    let mut longest_len = -1.0;
    for i in 0..n {
        let len = ring[i].distance(&ring[(i + 1) % n]);
        if len > longest_len + GEOMETRY_EPS {
            longest = i;
            longest_len = len;
        }
    }
    let a = ring[longest];
    let b = ring[(longest + 1) % n];
    let base_angle = (-(b.x - a.x)).atan2(b.y - a.y);

    let lines: Vec<(Point2, (f64, f64))> = (0..3)
        .map(|k| {
            let angle = base_angle + k as f64 * 2.0 * PI / 3.0;
            let normal = (angle.cos(), angle.sin());
            let support = ring
                .iter()
                .map(|p| p.x * normal.0 + p.y * normal.1)
                .fold(f64::NEG_INFINITY, f64::max);
            let anchor = Point2::new(normal.0 * support, normal.1 * support);
            (anchor, (-normal.1, normal.0))
        })
        .collect();

    (0..3)
        .filter_map(|k| {
            let (p, d) = lines[k];
            let (q, e) = lines[(k + 1) % 3];
            line_intersection(p, d, q, e)
        })
        .collect()
}

fn rotate_to_canonical_start(ring: &mut [Point2]) {
    let start = ring
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)))
        .map(|(index, _)| index)
        .unwrap_or(0);
    ring.rotate_left(start);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_points() -> Vec<Position> {
        vec![
            Position::flat(0.0, 0.0),
            Position::flat(10.0, 0.0),
            Position::flat(10.0, 10.0),
            Position::flat(0.0, 10.0),
        ]
    }

    fn settings(margin: f64, max_vertex_count: usize) -> GeofenceSettings {
        GeofenceSettings {
            horizontal_margin_m: margin,
            vertical_margin_m: 0.0,
            simplify: true,
            max_vertex_count,
        }
    }

    fn assert_close(actual: &[Point2], expected: &[(f64, f64)]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?}");
        for (p, (x, y)) in actual.iter().zip(expected) {
            assert!(
                (p.x - x).abs() < 1e-9 && (p.y - y).abs() < 1e-9,
                "{actual:?} != {expected:?}"
            );
        }
    }

    fn circle(n: usize, radius: f64) -> Vec<Position> {
        (0..n)
            .map(|k| {
                let angle = 2.0 * PI * k as f64 / n as f64;
                Position::flat(radius * angle.cos(), radius * angle.sin())
            })
            .collect()
    }

    #[test]
    fn square_offset_by_margin() {
        let fence = GeofenceGenerator::recompute(&square_points(), &settings(5.0, 10)).unwrap();
        assert_close(
            &fence.vertices,
            &[(-5.0, -5.0), (15.0, -5.0), (15.0, 15.0), (-5.0, 15.0)],
        );
    }

    #[test]
    fn zero_margin_returns_hull() {
        let fence = GeofenceGenerator::recompute(&square_points(), &settings(0.0, 10)).unwrap();
        assert_close(
            &fence.vertices,
            &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)],
        );
    }

    #[test]
    fn sharp_corner_stays_convex() {
        // Thin sliver: a naive vertex push would fold the tip over.
        let points = vec![
            Position::flat(0.0, 0.0),
            Position::flat(100.0, 1.0),
            Position::flat(0.0, 2.0),
        ];
        let fence = GeofenceGenerator::recompute(&points, &settings(3.0, 10)).unwrap();
        assert_eq!(fence.vertex_count(), 3);
        assert!(fence.area() > 0.0);
        for i in 0..3 {
            let a = fence.vertices[i];
            let b = fence.vertices[(i + 1) % 3];
            let c = fence.vertices[(i + 2) % 3];
            assert!(cross(a, b, c) > 0.0);
        }
        for p in &points {
            assert!(fence.contains(Point2::from(p), 1e-9));
        }
    }

    #[test]
    fn simplification_respects_vertex_bound_and_grows_outward() {
        let points = circle(24, 50.0);
        let offset_only = GeofenceGenerator::recompute(&points, &settings(10.0, 100)).unwrap();
        assert_eq!(offset_only.vertex_count(), 24);

        for max in [3, 4, 5, 8, 12] {
            let fence = GeofenceGenerator::recompute(&points, &settings(10.0, max)).unwrap();
            assert!(fence.vertex_count() <= max, "max {max}: {}", fence.vertex_count());
            assert!(fence.area() >= offset_only.area() - 1e-6);
            for v in &offset_only.vertices {
                assert!(fence.contains(*v, 1e-6), "max {max}: {v:?} escaped");
            }
        }
    }

    #[test]
    fn rectangle_reduced_to_triangle() {
        let points = vec![
            Position::flat(0.0, 0.0),
            Position::flat(40.0, 0.0),
            Position::flat(40.0, 10.0),
            Position::flat(0.0, 10.0),
        ];
        let fence = GeofenceGenerator::recompute(&points, &settings(2.0, 3)).unwrap();
        assert_eq!(fence.vertex_count(), 3);
        for corner in [(-2.0, -2.0), (42.0, -2.0), (42.0, 12.0), (-2.0, 12.0)] {
            assert!(fence.contains(Point2::from(corner), 1e-6), "{corner:?} escaped");
        }
    }

    #[test]
    fn refuses_to_exceed_bound_without_simplification() {
        let mut s = settings(10.0, 4);
        s.simplify = false;
        let result = GeofenceGenerator::recompute(&circle(12, 30.0), &s);
        assert!(matches!(result, Err(EngineError::InvalidSettings(_))));

        // Within the bound the flag does not matter.
        assert!(GeofenceGenerator::recompute(&square_points(), &s).is_ok());
    }

    #[test]
    fn altitude_ceiling_adds_vertical_margin() {
        let mut points = square_points();
        points[2].z = 35.0;
        points[0].z = 80.0;
        let s = GeofenceSettings {
            vertical_margin_m: 12.5,
            ..settings(5.0, 10)
        };
        let fence = GeofenceGenerator::recompute(&points, &s).unwrap();
        assert_eq!(fence.altitude_ceiling_m, 92.5);
    }

    #[test]
    fn degenerate_and_invalid_inputs() {
        let line = vec![
            Position::flat(0.0, 0.0),
            Position::flat(1.0, 1.0),
            Position::flat(2.0, 2.0),
        ];
        assert!(matches!(
            GeofenceGenerator::recompute(&line, &settings(5.0, 10)),
            Err(EngineError::DegenerateGeometry(_))
        ));
        assert!(matches!(
            GeofenceGenerator::recompute(&[], &settings(5.0, 10)),
            Err(EngineError::DegenerateGeometry(_))
        ));
        assert!(matches!(
            GeofenceGenerator::recompute(&square_points(), &settings(5.0, 2)),
            Err(EngineError::InvalidSettings(_))
        ));

        let mut bad = square_points();
        bad[1].x = f64::INFINITY;
        assert!(matches!(
            GeofenceGenerator::recompute(&bad, &settings(5.0, 10)),
            Err(EngineError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn geodetic_ring_is_closed() {
        let fence = GeofenceGenerator::recompute(&square_points(), &settings(5.0, 10)).unwrap();
        let ring = fence.to_geodetic(&LocalFrame::new(33.68, -117.83));
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
        assert!(ring[0][0] < 33.68 && ring[0][1] < -117.83);
    }
}
