//! Douglas-Peucker polyline simplification.
//!
//! A point survives if its distance to the chord between the two nearest
//! retained points exceeds `epsilon`. Chord endpoints (the anchors) are never
//! dropped. The split tree only depends on the input, so a larger epsilon
//! always yields a subset of the points kept by a smaller one.

use crate::error::{ensure_finite, GeometryError, Result};
use crate::selection::geometry::Point2D;

fn validate_epsilon(epsilon: f64) -> Result<()> {
    ensure_finite("epsilon", epsilon)?;
    if epsilon < 0.0 {
        return Err(GeometryError::invalid(
            "epsilon",
            format!("must be non-negative, got {epsilon}"),
        ));
    }
    Ok(())
}

/// Drop consecutive exact duplicates, keeping the first of each run.
fn dedup_consecutive(points: &[Point2D]) -> Vec<Point2D> {
    let mut out: Vec<Point2D> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    out
}

/// Simplify an open polyline anchored at its first and last points.
///
/// Inputs shorter than 3 points come back unchanged; `epsilon == 0` only
/// removes consecutive duplicates.
pub fn simplify_open(points: &[Point2D], epsilon: f64) -> Result<Vec<Point2D>> {
    validate_epsilon(epsilon)?;
    if points.len() < 3 {
        return Ok(points.to_vec());
    }

    let points = dedup_consecutive(points);
    if epsilon == 0.0 || points.len() < 3 {
        return Ok(points);
    }

    Ok(douglas_peucker(&points, epsilon))
}

/// Simplify a closed loop.
///
/// The anchor is the vertex farthest from the vertex centroid (first one on
/// ties); the result starts at that anchor and does not repeat it at the end.
pub fn simplify_closed(points: &[Point2D], epsilon: f64) -> Result<Vec<Point2D>> {
    validate_epsilon(epsilon)?;
    if points.len() < 3 {
        return Ok(points.to_vec());
    }

    let mut ring = dedup_consecutive(points);
    while ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    if epsilon == 0.0 || ring.len() < 3 {
        return Ok(ring);
    }

    let anchor = farthest_from_centroid(&ring);
    let mut rotated: Vec<Point2D> = Vec::with_capacity(ring.len() + 1);
    rotated.extend_from_slice(&ring[anchor..]);
    rotated.extend_from_slice(&ring[..anchor]);
    rotated.push(ring[anchor]);

    let mut simplified = douglas_peucker(&rotated, epsilon);
    simplified.pop();
    Ok(simplified)
}

/// Dispatch on `closed`.
pub fn simplify(points: &[Point2D], epsilon: f64, closed: bool) -> Result<Vec<Point2D>> {
    if closed {
        simplify_closed(points, epsilon)
    } else {
        simplify_open(points, epsilon)
    }
}

/// Simplify interleaved `x, y` coordinates.
pub fn simplify_interleaved(coords: &[f64], epsilon: f64, closed: bool) -> Result<Vec<f64>> {
    if coords.len() % 2 != 0 {
        return Err(GeometryError::invalid(
            "points",
            format!("interleaved coordinates need an even length, got {}", coords.len()),
        ));
    }
    let points: Vec<Point2D> = coords
        .chunks_exact(2)
        .map(|xy| Point2D::new(xy[0], xy[1]))
        .collect();
    let simplified = simplify(&points, epsilon, closed)?;
    Ok(simplified.iter().flat_map(|p| [p.x, p.y]).collect())
}

fn farthest_from_centroid(points: &[Point2D]) -> usize {
    let n = points.len() as f64;
    let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    let centroid = Point2D::new(sx / n, sy / n);

    let mut best = 0;
    let mut best_dist = f64::NEG_INFINITY;
    for (i, p) in points.iter().enumerate() {
        let d = p.distance_to(&centroid);
        if d > best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// Classic Douglas-Peucker over `points`, keeping both ends.
fn douglas_peucker(points: &[Point2D], epsilon: f64) -> Vec<Point2D> {
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;
    mark_retained(points, 0, points.len() - 1, epsilon, &mut keep);

    points
        .iter()
        .zip(&keep)
        .filter_map(|(p, &k)| k.then_some(*p))
        .collect()
}

fn mark_retained(points: &[Point2D], first: usize, last: usize, epsilon: f64, keep: &mut [bool]) {
    if last <= first + 1 {
        return;
    }

    let mut max_dist = 0.0f64;
    let mut max_idx = first;
    for i in first + 1..last {
        let dist = points[i].distance_to_segment(&points[first], &points[last]);
        if dist > max_dist {
            max_dist = dist;
            max_idx = i;
        }
    }

    if max_dist > epsilon {
        keep[max_idx] = true;
        mark_retained(points, first, max_idx, epsilon, keep);
        mark_retained(points, max_idx, last, epsilon, keep);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point2D> {
        coords.iter().map(|&c| c.into()).collect()
    }

    fn wobbly_line(n: usize) -> Vec<Point2D> {
        (0..n)
            .map(|i| {
                let x = i as f64;
                Point2D::new(x, (x * 0.7).sin() * 3.0 + (x * 0.13).cos() * 5.0)
            })
            .collect()
    }

    fn blob(n: usize) -> Vec<Point2D> {
        (0..n)
            .map(|i| {
                let a = i as f64 / n as f64 * std::f64::consts::TAU;
                let r = 20.0 + (a * 5.0).sin() * 3.0;
                Point2D::new(50.0 + r * a.cos(), 50.0 + r * a.sin())
            })
            .collect()
    }

    #[test]
    fn test_nearly_straight_middle_dropped() {
        let input = pts(&[(0.0, 0.0), (50.0, 0.01), (100.0, 0.0)]);
        let out = simplify_open(&input, 1.0).unwrap();
        assert_eq!(out, pts(&[(0.0, 0.0), (100.0, 0.0)]));
    }

    #[test]
    fn test_significant_middle_kept() {
        let input = pts(&[(0.0, 0.0), (50.0, 10.0), (100.0, 0.0)]);
        let out = simplify_open(&input, 1.0).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_zero_epsilon_only_dedups() {
        let input = pts(&[(0.0, 0.0), (0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (2.0, 0.0), (3.0, 1.0)]);
        let out = simplify_open(&input, 0.0).unwrap();
        assert_eq!(out, pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 1.0)]));
    }

    #[test]
    fn test_short_input_unchanged() {
        let input = pts(&[(0.0, 0.0), (0.0, 0.0)]);
        assert_eq!(simplify_open(&input, 5.0).unwrap(), input);
        assert_eq!(simplify_closed(&input, 5.0).unwrap(), input);
    }

    #[test]
    fn test_invalid_epsilon_rejected() {
        let input = wobbly_line(10);
        assert!(simplify_open(&input, -1.0).is_err());
        assert!(simplify_open(&input, f64::NAN).is_err());
        assert!(simplify_closed(&input, f64::INFINITY).is_err());
    }

    #[test]
    fn test_open_anchors_retained() {
        let input = wobbly_line(60);
        let out = simplify_open(&input, 4.0).unwrap();
        assert_eq!(out.first(), input.first());
        assert_eq!(out.last(), input.last());
    }

    #[test]
    fn test_open_deviation_bounded() {
        let input = wobbly_line(80);
        let epsilon = 1.5;
        let out = simplify_open(&input, epsilon).unwrap();
        for p in &input {
            let dev = out
                .windows(2)
                .map(|w| p.distance_to_segment(&w[0], &w[1]))
                .fold(f64::INFINITY, f64::min);
            assert!(dev <= epsilon + 1e-9, "deviation {dev}");
        }
    }

    #[test]
    fn test_length_monotonic_in_epsilon() {
        for (input, closed) in [(wobbly_line(120), false), (blob(150), true)] {
            let mut prev = input.len();
            for epsilon in [0.0, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 50.0] {
                let len = simplify(&input, epsilon, closed).unwrap().len();
                assert!(len <= prev, "epsilon {epsilon}: {len} > {prev}");
                prev = len;
            }
        }
    }

    #[test]
    fn test_closed_starts_at_farthest_point() {
        let square = pts(&[
            (1.0, 1.0),
            (2.0, 1.0),
            (3.0, 1.0),
            (3.0, 2.0),
            (3.0, 3.0),
            (2.0, 3.0),
            (1.0, 3.0),
            (1.0, 2.0),
        ]);
        let out = simplify_closed(&square, 0.1).unwrap();
        // Corners are equidistant from the centroid; the first corner wins.
        assert_eq!(out, pts(&[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)]));
        assert_ne!(out.first(), out.last());
    }

    #[test]
    fn test_closed_deviation_bounded() {
        let input = blob(200);
        let epsilon = 0.75;
        let out = simplify_closed(&input, epsilon).unwrap();
        assert!(out.len() < input.len());
        let n = out.len();
        for p in &input {
            let dev = (0..n)
                .map(|i| p.distance_to_segment(&out[i], &out[(i + 1) % n]))
                .fold(f64::INFINITY, f64::min);
            assert!(dev <= epsilon + 1e-9, "deviation {dev}");
        }
    }

    #[test]
    fn test_closed_drops_repeated_closing_point() {
        let input = pts(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (0.0, 0.0)]);
        let out = simplify_closed(&input, 0.0).unwrap();
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_interleaved_round() {
        let coords = [0.0, 0.0, 50.0, 0.01, 100.0, 0.0];
        assert_eq!(simplify_interleaved(&coords, 1.0, false).unwrap(), vec![0.0, 0.0, 100.0, 0.0]);
        assert!(simplify_interleaved(&coords[..5], 1.0, false).is_err());
    }
}
