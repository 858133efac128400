//! Contour geometry types shared by the tracer, simplifier and curve fitter.

/// A 2D point with sub-pixel precision, in field pixel coordinates
/// (origin at the top-left corner of sample (0, 0)).
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Distance from this point to the segment `start..end`.
    ///
    /// A zero-length segment degenerates to point distance.
    pub fn distance_to_segment(&self, start: &Point2D, end: &Point2D) -> f64 {
        let dx = end.x - start.x;
        let dy = end.y - start.y;
        let length_sq = dx * dx + dy * dy;

        if length_sq == 0.0 {
            return self.distance_to(start);
        }

        let t = (((self.x - start.x) * dx + (self.y - start.y) * dy) / length_sq).clamp(0.0, 1.0);
        let proj = Point2D::new(start.x + t * dx, start.y + t * dy);
        self.distance_to(&proj)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A cubic Bezier segment: `p0`/`p3` are anchors, `p1`/`p2` controls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BezierSegment {
    pub p0: Point2D,
    pub p1: Point2D,
    pub p2: Point2D,
    pub p3: Point2D,
}

impl BezierSegment {
    pub const fn new(p0: Point2D, p1: Point2D, p2: Point2D, p3: Point2D) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Evaluate the curve at `t` in `0..=1`.
    pub fn evaluate(&self, t: f64) -> Point2D {
        let mt = 1.0 - t;
        let a = mt * mt * mt;
        let b = 3.0 * mt * mt * t;
        let c = 3.0 * mt * t * t;
        let d = t * t * t;

        Point2D::new(
            a * self.p0.x + b * self.p1.x + c * self.p2.x + d * self.p3.x,
            a * self.p0.y + b * self.p1.y + c * self.p2.y + d * self.p3.y,
        )
    }
}

/// One boundary component.
///
/// `beziers`, when present, carries curve data alongside the polyline; the
/// polyline stays valid as the low-fidelity representation. Closed contours
/// never repeat their first point at the end.
#[derive(Clone, Debug, PartialEq)]
pub struct Contour {
    pub points: Vec<Point2D>,
    pub is_closed: bool,
    pub beziers: Option<Vec<BezierSegment>>,
}

impl Contour {
    pub fn new(points: Vec<Point2D>, is_closed: bool) -> Self {
        Self {
            points,
            is_closed,
            beziers: None,
        }
    }

    pub fn with_beziers(mut self, beziers: Vec<BezierSegment>) -> Self {
        self.beziers = Some(beziers);
        self
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Shoelace area; positive when the points wind clockwise on screen
    /// (y pointing down). Zero for open contours.
    pub fn signed_area(&self) -> f64 {
        if !self.is_closed || self.points.len() < 3 {
            return 0.0;
        }
        let n = self.points.len();
        let twice: f64 = (0..n)
            .map(|i| {
                let a = self.points[i];
                let b = self.points[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum();
        twice / 2.0
    }

    /// Axis-aligned bounds as `(min, max)`; `None` for an empty contour.
    pub fn bounds(&self) -> Option<(Point2D, Point2D)> {
        let first = *self.points.first()?;
        Some(self.points.iter().fold((first, first), |(lo, hi), p| {
            (
                Point2D::new(lo.x.min(p.x), lo.y.min(p.y)),
                Point2D::new(hi.x.max(p.x), hi.y.max(p.y)),
            )
        }))
    }
}

/// Contours in tracer discovery order.
pub type ContourSet = Vec<Contour>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        let p1 = Point2D::new(0.0, 0.0);
        let p2 = Point2D::new(3.0, 4.0);
        assert!((p1.distance_to(&p2) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_point_to_segment_distance() {
        let p = Point2D::new(1.0, 1.0);
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(2.0, 0.0);
        assert!((p.distance_to_segment(&a, &b) - 1.0).abs() < 1e-12);
        // Beyond the end, distance is to the endpoint.
        let q = Point2D::new(5.0, 4.0);
        assert!((q.distance_to_segment(&a, &b) - 5.0).abs() < 1e-12);
        // Degenerate segment.
        assert!((q.distance_to_segment(&a, &a) - q.distance_to(&a)).abs() < 1e-12);
    }

    #[test]
    fn test_bezier_evaluate_endpoints() {
        let bez = BezierSegment::new(
            Point2D::new(0.0, 0.0),
            Point2D::new(0.0, 1.0),
            Point2D::new(1.0, 1.0),
            Point2D::new(1.0, 0.0),
        );
        assert_eq!(bez.evaluate(0.0), bez.p0);
        assert_eq!(bez.evaluate(1.0), bez.p3);
        let mid = bez.evaluate(0.5);
        assert!((mid.x - 0.5).abs() < 1e-12);
        assert!((mid.y - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_signed_area_and_bounds() {
        let square = Contour::new(
            vec![
                Point2D::new(0.0, 0.0),
                Point2D::new(2.0, 0.0),
                Point2D::new(2.0, 2.0),
                Point2D::new(0.0, 2.0),
            ],
            true,
        );
        assert!((square.signed_area() - 4.0).abs() < 1e-12);
        let (lo, hi) = square.bounds().unwrap();
        assert_eq!(lo, Point2D::new(0.0, 0.0));
        assert_eq!(hi, Point2D::new(2.0, 2.0));
    }
}
