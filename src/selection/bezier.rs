//! Cubic Bezier fitting over a (simplified) polyline.
//!
//! Every polyline edge becomes one cubic segment whose anchors are the edge
//! endpoints, copied bit-for-bit. Control points sit on the vertex tangents
//! at `smoothness * edge_length` from their anchor.
//!
//! The tangent at a vertex is the normalized sum of the unit incoming and
//! unit outgoing chord directions (the angle bisector), so a short chord
//! weighs as much as a long one. Open ends use their only chord. When the
//! sum vanishes (a reversal) or a chord has zero length, the tangent falls
//! back to the direction of the edge being fitted.

use crate::error::{ensure_in_range, Result};
use crate::selection::geometry::{BezierSegment, Contour, Point2D};

/// Largest accepted smoothness; 0 gives straight chords.
pub const MAX_SMOOTHNESS: f64 = 0.5;

/// Typical smoothness for selection outlines.
pub const DEFAULT_SMOOTHNESS: f64 = 0.25;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Vec2 {
    x: f64,
    y: f64,
}

impl Vec2 {
    fn between(from: &Point2D, to: &Point2D) -> Self {
        Self {
            x: to.x - from.x,
            y: to.y - from.y,
        }
    }

    fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Unit vector, or `None` for a zero (or non-finite) vector.
    fn normalized(self) -> Option<Self> {
        let len = self.length();
        (len > 0.0 && len.is_finite()).then(|| Self {
            x: self.x / len,
            y: self.y / len,
        })
    }

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

/// Fit one cubic per edge: `n - 1` segments for open input, `n` for closed.
///
/// # Arguments
/// * `points` - Polyline vertices, typically already simplified
/// * `is_closed` - Whether the last vertex connects back to the first
/// * `smoothness` - Control-point reach as a fraction of edge length, `[0, 0.5]`
///
/// # Returns
/// One segment per edge; fewer than two points produce no segments.
/// Out-of-range smoothness is rejected, never clamped.
pub fn fit_beziers(points: &[Point2D], is_closed: bool, smoothness: f64) -> Result<Vec<BezierSegment>> {
    ensure_in_range("smoothness", smoothness, 0.0, MAX_SMOOTHNESS)?;

    let n = points.len();
    if n < 2 {
        return Ok(Vec::new());
    }

    let edge_count = if is_closed { n } else { n - 1 };
    let tangents: Vec<Option<Vec2>> = (0..n).map(|i| vertex_tangent(points, i, is_closed)).collect();

    let segments = (0..edge_count)
        .map(|i| {
            let j = (i + 1) % n;
            let p0 = points[i];
            let p3 = points[j];
            let edge = Vec2::between(&p0, &p3);
            let reach = smoothness * edge.length();
            let fallback = edge.normalized();

            let t0 = tangents[i].or(fallback);
            let t3 = tangents[j].or(fallback);

            let p1 = match t0 {
                Some(t) => Point2D::new(p0.x + t.x * reach, p0.y + t.y * reach),
                None => p0,
            };
            let p2 = match t3 {
                Some(t) => Point2D::new(p3.x - t.x * reach, p3.y - t.y * reach),
                None => p3,
            };

            BezierSegment::new(p0, p1, p2, p3)
        })
        .collect();

    Ok(segments)
}

/// Fit curves onto a contour in place, keeping its polyline.
pub fn fit_contour(contour: &mut Contour, smoothness: f64) -> Result<()> {
    let beziers = fit_beziers(&contour.points, contour.is_closed, smoothness)?;
    contour.beziers = Some(beziers);
    Ok(())
}

fn vertex_tangent(points: &[Point2D], i: usize, is_closed: bool) -> Option<Vec2> {
    let n = points.len();
    let prev = if i > 0 {
        Some(i - 1)
    } else if is_closed {
        Some(n - 1)
    } else {
        None
    };
    let next = if i + 1 < n {
        Some(i + 1)
    } else if is_closed {
        Some(0)
    } else {
        None
    };

    let incoming = prev.and_then(|p| Vec2::between(&points[p], &points[i]).normalized());
    let outgoing = next.and_then(|q| Vec2::between(&points[i], &points[q]).normalized());

    match (incoming, outgoing) {
        (Some(a), Some(b)) => a.add(b).normalized(),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point2D> {
        coords.iter().map(|&c| c.into()).collect()
    }

    #[test]
    fn test_segment_counts() {
        let points = pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        assert_eq!(fit_beziers(&points, false, 0.25).unwrap().len(), 3);
        assert_eq!(fit_beziers(&points, true, 0.25).unwrap().len(), 4);
        assert!(fit_beziers(&points[..1], true, 0.25).unwrap().is_empty());
    }

    #[test]
    fn test_anchors_are_exact() {
        let points = pts(&[(0.1, 0.2), (3.3, 1.7), (7.9, 0.4), (5.5, 6.6)]);
        let segs = fit_beziers(&points, true, 0.3).unwrap();
        for (i, seg) in segs.iter().enumerate() {
            assert_eq!(seg.p0, points[i]);
            assert_eq!(seg.p3, points[(i + 1) % points.len()]);
        }
    }

    #[test]
    fn test_zero_smoothness_degenerates_to_chords() {
        let points = pts(&[(0.0, 0.0), (4.0, 1.0), (8.0, 0.0)]);
        let segs = fit_beziers(&points, false, 0.0).unwrap();
        for seg in &segs {
            assert_eq!(seg.p1, seg.p0);
            assert_eq!(seg.p2, seg.p3);
        }
    }

    #[test]
    fn test_straight_line_controls_on_chord() {
        let points = pts(&[(0.0, 0.0), (10.0, 0.0)]);
        let seg = fit_beziers(&points, false, 0.5).unwrap()[0];
        assert_eq!(seg.p1, Point2D::new(5.0, 0.0));
        assert_eq!(seg.p2, Point2D::new(5.0, 0.0));
    }

    #[test]
    fn test_square_corner_tangent_is_bisector() {
        let points = pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        let segs = fit_beziers(&points, true, 0.5).unwrap();
        // At (10, 0) incoming is +x, outgoing +y: bisector (1, 1)/sqrt(2).
        let p1 = segs[1].p1;
        let expected = 5.0 / std::f64::consts::SQRT_2;
        assert!((p1.x - (10.0 + expected)).abs() < 1e-9);
        assert!((p1.y - expected).abs() < 1e-9);
    }

    #[test]
    fn test_reversal_falls_back_to_edge() {
        let points = pts(&[(0.0, 0.0), (10.0, 0.0), (0.0, 0.0)]);
        let segs = fit_beziers(&points, false, 0.2).unwrap();
        assert!(segs.iter().all(|s| s.p1.x.is_finite() && s.p2.y.is_finite()));
        assert_eq!(segs[1].p1, Point2D::new(8.0, 0.0));
    }

    #[test]
    fn test_smoothness_out_of_range_rejected() {
        let points = pts(&[(0.0, 0.0), (1.0, 1.0)]);
        assert!(fit_beziers(&points, false, 0.6).is_err());
        assert!(fit_beziers(&points, false, -0.1).is_err());
        assert!(fit_beziers(&points, false, f64::NAN).is_err());
    }

    #[test]
    fn test_fit_contour_keeps_polyline() {
        let mut contour = Contour::new(pts(&[(0.0, 0.0), (5.0, 0.0), (5.0, 5.0)]), true);
        fit_contour(&mut contour, DEFAULT_SMOOTHNESS).unwrap();
        assert_eq!(contour.points.len(), 3);
        assert_eq!(contour.beziers.as_ref().map(Vec::len), Some(3));
    }
}
