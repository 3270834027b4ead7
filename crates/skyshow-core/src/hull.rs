//! Convex hull of the show's ground footprint.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::spatial::{convex_contains, cross, Point2};

/// Convex hull as a counter-clockwise vertex ring.
///
/// Starts at the lowest (then leftmost) vertex so the same input set always
/// yields the same sequence. Fewer than three vertices means the input was
/// degenerate: a single point or a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvexHull {
    vertices: Vec<Point2>,
}

impl ConvexHull {
    pub fn vertices(&self) -> &[Point2] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn is_degenerate(&self) -> bool {
        self.vertices.len() < 3
    }

    /// The hull as a proper polygon, or `DegenerateGeometry`.
    pub fn require_polygon(&self) -> Result<&[Point2]> {
        if self.is_degenerate() {
            return Err(EngineError::DegenerateGeometry(format!(
                "need at least 3 non-collinear points, hull has {} vertices",
                self.vertices.len()
            )));
        }
        Ok(&self.vertices)
    }

    pub fn contains(&self, p: Point2, eps: f64) -> bool {
        convex_contains(&self.vertices, p, eps)
    }
}

/// Andrew's monotone chain, O(n log n).
///
/// Duplicate points are merged and collinear points on the boundary are
/// dropped. Non-finite points are ignored.
pub fn convex_hull<P>(points: impl IntoIterator<Item = P>) -> ConvexHull
where
    P: Into<Point2>,
{
    let mut pts: Vec<Point2> = points
        .into_iter()
        .map(Into::into)
        .filter(Point2::is_finite)
        .collect();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();

    if pts.len() < 3 {
        return ConvexHull { vertices: pts };
    }

    let mut lower: Vec<Point2> = Vec::with_capacity(pts.len());
    for &p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<Point2> = Vec::with_capacity(pts.len());
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    // Each chain ends where the other begins.
    lower.pop();
    upper.pop();
    lower.extend(upper);
    let mut vertices = lower;

    if vertices.len() < 3 {
        // All points collinear: keep the two extremes, in sorted order.
        vertices.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        vertices.dedup();
        return ConvexHull { vertices };
    }

    let start = vertices
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)))
        .map(|(index, _)| index)
        .unwrap_or(0);
    vertices.rotate_left(start);

    ConvexHull { vertices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::signed_area;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point2> {
        coords.iter().copied().map(Point2::from).collect()
    }

    #[test]
    fn square_with_interior_and_edge_points() {
        let hull = convex_hull(pts(&[
            (10.0, 10.0),
            (5.0, 5.0),
            (0.0, 0.0),
            (5.0, 0.0),
            (10.0, 0.0),
            (0.0, 10.0),
            (3.0, 7.0),
        ]));
        assert_eq!(
            hull.vertices(),
            pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]).as_slice()
        );
        assert!(signed_area(hull.vertices()) > 0.0);
    }

    #[test]
    fn starts_at_lowest_then_leftmost_vertex() {
        // Leftmost point is not the lowest one.
        let hull = convex_hull(pts(&[(0.0, 5.0), (5.0, 0.0), (10.0, 5.0), (5.0, 10.0)]));
        assert_eq!(hull.vertices()[0], Point2::new(5.0, 0.0));

        // Two points share the minimum y: pick the left one.
        let hull = convex_hull(pts(&[(4.0, 0.0), (1.0, 0.0), (2.0, 3.0)]));
        assert_eq!(hull.vertices()[0], Point2::new(1.0, 0.0));
    }

    #[test]
    fn output_ignores_input_order_and_duplicates() {
        let a = convex_hull(pts(&[(0.0, 0.0), (4.0, 1.0), (2.0, 5.0), (1.0, 1.0)]));
        let b = convex_hull(pts(&[
            (2.0, 5.0),
            (1.0, 1.0),
            (4.0, 1.0),
            (0.0, 0.0),
            (2.0, 5.0),
            (0.0, 0.0),
        ]));
        assert_eq!(a, b);
    }

    #[test]
    fn degenerate_inputs() {
        let single = convex_hull(pts(&[(1.0, 1.0), (1.0, 1.0)]));
        assert_eq!(single.vertices(), pts(&[(1.0, 1.0)]).as_slice());
        assert!(single.is_degenerate());

        let pair = convex_hull(pts(&[(3.0, 0.0), (1.0, 2.0)]));
        assert_eq!(pair.vertices(), pts(&[(1.0, 2.0), (3.0, 0.0)]).as_slice());

        let collinear = convex_hull(pts(&[(2.0, 2.0), (0.0, 0.0), (1.0, 1.0), (3.0, 3.0)]));
        assert_eq!(collinear.vertices(), pts(&[(0.0, 0.0), (3.0, 3.0)]).as_slice());
        assert!(matches!(
            collinear.require_polygon(),
            Err(EngineError::DegenerateGeometry(_))
        ));

        assert!(convex_hull(Vec::<Point2>::new()).is_empty());
    }

    #[test]
    fn every_input_point_is_contained() {
        let input = pts(&[
            (3.0, 1.0),
            (-2.0, 4.0),
            (7.5, -3.0),
            (0.0, 0.0),
            (1.0, 9.0),
            (6.0, 6.0),
            (2.0, 2.0),
        ]);
        let hull = convex_hull(input.clone());
        for p in input {
            assert!(hull.contains(p, 1e-9), "{p:?} outside hull");
        }
    }
}
