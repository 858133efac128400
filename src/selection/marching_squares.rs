//! Marching Squares contour tracing with sub-pixel precision.
//!
//! The field is padded (conceptually) with one ring of background samples,
//! so every foreground region is bounded and every traced contour is closed.
//! Samples sit at pixel centres: sample `(x, y)` is at `(x + 0.5, y + 0.5)`.
//! Crossing points are linearly interpolated between the two samples of a
//! grid edge and clamped to the field rectangle `[0, W] x [0, H]`, so regions
//! touching the border are clipped against it.
//!
//! Each 2x2 block emits oriented segments with foreground on a fixed side;
//! outer boundaries wind counter-clockwise on screen (negative
//! [`Contour::signed_area`]) and holes clockwise. Segments are linked by
//! grid-edge identity rather than by comparing float coordinates.
//!
//! Saddle blocks (cases 5 and 10) are resolved with the average of the four
//! block samples: if it reaches the threshold, the two foreground corners are
//! joined, otherwise they stay separate.

use std::collections::HashMap;

use log::{trace, warn};
use rayon::prelude::*;

use crate::error::{ensure_in_range, GeometryError, Result};
use crate::field::{BinaryField, ScalarField};
use crate::selection::geometry::{Contour, ContourSet, Point2D};

/// Corner bits of a block, matching the classic case numbering.
const TOP_LEFT: u8 = 1;
const TOP_RIGHT: u8 = 2;
const BOTTOM_RIGHT: u8 = 4;
const BOTTOM_LEFT: u8 = 8;

/// Knobs for a tracing call.
#[derive(Clone, Copy, Debug)]
pub struct TraceOptions {
    /// Scan block rows on the rayon pool. Linking is always single-threaded.
    pub parallel: bool,
    /// Maximum total number of contour points.
    pub max_points: usize,
    /// Maximum number of contours.
    pub max_contours: usize,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            max_points: usize::MAX,
            max_contours: usize::MAX,
        }
    }
}

/// Extract every boundary of the `>= threshold` region of `field`.
pub fn trace(field: &ScalarField, threshold: f32) -> Result<ContourSet> {
    trace_with(field, threshold, &TraceOptions::default())
}

/// [`trace`] with explicit options.
///
/// # Arguments
/// * `field` - Coverage field to trace
/// * `threshold` - Iso-level in `[0, 1]`; samples `>= threshold` are foreground
/// * `options` - Parallel scan switch and point/contour ceilings
///
/// # Returns
/// Closed contours in row-major discovery order, or `ResourceExceeded` when a
/// ceiling is crossed
pub fn trace_with(field: &ScalarField, threshold: f32, options: &TraceOptions) -> Result<ContourSet> {
    ensure_in_range("threshold", threshold as f64, 0.0, 1.0)?;
    let bits = field.binarize(threshold)?;
    let source = Thresholded {
        field,
        bits: &bits,
        threshold,
    };
    trace_source(&source, options)
}

/// Trace an already binarized field. Without coverage values, every crossing
/// lands at the midpoint of its grid edge.
pub fn trace_binary(bits: &BinaryField, options: &TraceOptions) -> Result<ContourSet> {
    trace_source(bits, options)
}

/// What the tracer needs from a grid: classification and a value to
/// interpolate crossings with. Coordinates are in unpadded field space;
/// anything outside the field is background.
trait CornerSource: Sync {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn inside(&self, x: isize, y: isize) -> bool;
    fn value(&self, x: isize, y: isize) -> f32;
    fn threshold(&self) -> f32;
}

struct Thresholded<'a> {
    field: &'a ScalarField,
    bits: &'a BinaryField,
    threshold: f32,
}

impl CornerSource for Thresholded<'_> {
    fn width(&self) -> usize {
        self.field.width()
    }

    fn height(&self) -> usize {
        self.field.height()
    }

    #[inline]
    fn inside(&self, x: isize, y: isize) -> bool {
        self.bits.is_set(x, y)
    }

    #[inline]
    fn value(&self, x: isize, y: isize) -> f32 {
        self.field.sample_or_background(x, y)
    }

    fn threshold(&self) -> f32 {
        self.threshold
    }
}

impl CornerSource for BinaryField {
    fn width(&self) -> usize {
        BinaryField::width(self)
    }

    fn height(&self) -> usize {
        BinaryField::height(self)
    }

    #[inline]
    fn inside(&self, x: isize, y: isize) -> bool {
        self.is_set(x, y)
    }

    #[inline]
    fn value(&self, x: isize, y: isize) -> f32 {
        if self.is_set(x, y) {
            1.0
        } else {
            0.0
        }
    }

    fn threshold(&self) -> f32 {
        0.5
    }
}

/// Oriented boundary segment inside one block, from one grid edge to another.
#[derive(Clone, Copy, Debug)]
struct Segment {
    from: usize,
    to: usize,
    start: Point2D,
}

/// Block-local grid edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

/// Segments for a block case; saddles depend on the block-centre decision.
fn case_segments(case: u8, centre_inside: bool) -> &'static [(Side, Side)] {
    use Side::*;
    match case {
        1 => &[(Left, Top)],
        2 => &[(Top, Right)],
        3 => &[(Left, Right)],
        4 => &[(Right, Bottom)],
        5 if centre_inside => &[(Right, Top), (Left, Bottom)],
        5 => &[(Left, Top), (Right, Bottom)],
        6 => &[(Top, Bottom)],
        7 => &[(Left, Bottom)],
        8 => &[(Bottom, Left)],
        9 => &[(Bottom, Top)],
        10 if centre_inside => &[(Top, Left), (Bottom, Right)],
        10 => &[(Top, Right), (Bottom, Left)],
        11 => &[(Bottom, Right)],
        12 => &[(Right, Left)],
        13 => &[(Right, Top)],
        14 => &[(Top, Left)],
        _ => &[],
    }
}

/// Geometry of the padded sample lattice: `(W + 2) x (H + 2)` samples,
/// padded index `i` maps to field column `i - 1`.
struct Lattice<'a, S: CornerSource> {
    source: &'a S,
    padded_width: usize,
    max_x: f64,
    max_y: f64,
}

impl<'a, S: CornerSource> Lattice<'a, S> {
    fn new(source: &'a S) -> Self {
        Self {
            source,
            padded_width: source.width() + 2,
            max_x: source.width() as f64,
            max_y: source.height() as f64,
        }
    }

    #[inline]
    fn horizontal_edge(&self, i: usize, j: usize) -> usize {
        (j * self.padded_width + i) * 2
    }

    #[inline]
    fn vertical_edge(&self, i: usize, j: usize) -> usize {
        (j * self.padded_width + i) * 2 + 1
    }

    #[inline]
    fn inside(&self, i: usize, j: usize) -> bool {
        self.source.inside(i as isize - 1, j as isize - 1)
    }

    #[inline]
    fn value(&self, i: usize, j: usize) -> f32 {
        // Padding is always background, whatever the threshold.
        let (x, y) = (i as isize - 1, j as isize - 1);
        if x < 0 || y < 0 || x as usize >= self.source.width() || y as usize >= self.source.height() {
            0.0
        } else {
            self.source.value(x, y)
        }
    }

    /// Interpolated crossing between padded samples `a` and `b`.
    fn crossing(&self, a: (usize, usize), b: (usize, usize)) -> Point2D {
        let va = self.value(a.0, a.1) as f64;
        let vb = self.value(b.0, b.1) as f64;
        let threshold = self.source.threshold() as f64;

        let mut t = if vb != va { (threshold - va) / (vb - va) } else { 0.5 };
        if !t.is_finite() {
            t = 0.5;
        }
        let t = t.clamp(0.0, 1.0);

        // Padded index i has its centre at field x = i - 0.5.
        let ax = a.0 as f64 - 0.5;
        let ay = a.1 as f64 - 0.5;
        let bx = b.0 as f64 - 0.5;
        let by = b.1 as f64 - 0.5;

        Point2D::new(
            (ax + t * (bx - ax)).clamp(0.0, self.max_x),
            (ay + t * (by - ay)).clamp(0.0, self.max_y),
        )
    }

    /// Edge id and crossing point for one side of block `(i, j)`.
    fn side(&self, side: Side, i: usize, j: usize) -> (usize, Point2D) {
        match side {
            Side::Top => (self.horizontal_edge(i, j), self.crossing((i, j), (i + 1, j))),
            Side::Bottom => (
                self.horizontal_edge(i, j + 1),
                self.crossing((i, j + 1), (i + 1, j + 1)),
            ),
            Side::Left => (self.vertical_edge(i, j), self.crossing((i, j), (i, j + 1))),
            Side::Right => (
                self.vertical_edge(i + 1, j),
                self.crossing((i + 1, j), (i + 1, j + 1)),
            ),
        }
    }

    /// All segments of block row `j`, in column order.
    fn scan_row(&self, j: usize) -> Vec<Segment> {
        let mut segments = Vec::new();
        let threshold = self.source.threshold();

        for i in 0..self.padded_width - 1 {
            let case = (self.inside(i, j) as u8 * TOP_LEFT)
                | (self.inside(i + 1, j) as u8 * TOP_RIGHT)
                | (self.inside(i + 1, j + 1) as u8 * BOTTOM_RIGHT)
                | (self.inside(i, j + 1) as u8 * BOTTOM_LEFT);

            if case == 0 || case == 15 {
                continue;
            }

            let centre_inside = if case == 5 || case == 10 {
                let sum = self.value(i, j) + self.value(i + 1, j) + self.value(i + 1, j + 1) + self.value(i, j + 1);
                sum / 4.0 >= threshold
            } else {
                false
            };

            for &(from_side, to_side) in case_segments(case, centre_inside) {
                let (from, start) = self.side(from_side, i, j);
                let (to, _) = self.side(to_side, i, j);
                segments.push(Segment { from, to, start });
            }
        }

        segments
    }
}

fn trace_source<S: CornerSource>(source: &S, options: &TraceOptions) -> Result<ContourSet> {
    let lattice = Lattice::new(source);
    let block_rows = source.height() + 1;

    let rows: Vec<Vec<Segment>> = if options.parallel {
        (0..block_rows).into_par_iter().map(|j| lattice.scan_row(j)).collect()
    } else {
        (0..block_rows).map(|j| lattice.scan_row(j)).collect()
    };
    let segments: Vec<Segment> = rows.into_iter().flatten().collect();

    trace!(
        "marching squares: {}x{} field, {} segments",
        source.width(),
        source.height(),
        segments.len()
    );

    let chains = link_segments(&segments);

    // Counted after duplicate collapsing, before any `Contour` is built.
    let total_points: usize = chains.iter().map(|(points, _)| points.len()).sum();
    if total_points > options.max_points {
        return Err(GeometryError::ResourceExceeded {
            what: "contour points",
            requested: total_points,
            limit: options.max_points,
        });
    }
    if chains.len() > options.max_contours {
        return Err(GeometryError::ResourceExceeded {
            what: "contours",
            requested: chains.len(),
            limit: options.max_contours,
        });
    }

    Ok(chains
        .into_iter()
        .map(|(points, is_closed)| Contour::new(points, is_closed))
        .collect())
}

/// Chain segments into `(points, is_closed)` runs, starting each run at the
/// first unused segment in scan order.
fn link_segments(segments: &[Segment]) -> Vec<(Vec<Point2D>, bool)> {
    let mut by_start: HashMap<usize, usize> = HashMap::with_capacity(segments.len());
    for (idx, seg) in segments.iter().enumerate() {
        if by_start.insert(seg.from, idx).is_some() {
            warn!("marching squares: grid edge {} starts two segments", seg.from);
        }
    }

    let mut used = vec![false; segments.len()];
    let mut chains = Vec::new();

    for first in 0..segments.len() {
        if used[first] {
            continue;
        }

        let mut points = Vec::new();
        let mut current = first;
        let mut is_closed = false;

        loop {
            used[current] = true;
            let seg = segments[current];
            if points.last() != Some(&seg.start) {
                points.push(seg.start);
            }

            match by_start.get(&seg.to) {
                Some(&next) if next == first => {
                    is_closed = true;
                    break;
                }
                Some(&next) if !used[next] => current = next,
                _ => {
                    warn!("marching squares: chain starting at edge {} did not close", segments[first].from);
                    break;
                }
            }
        }

        if is_closed {
            while points.len() > 1 && points.first() == points.last() {
                points.pop();
            }
        }

        chains.push((points, is_closed));
    }

    chains
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_field(width: usize, height: usize, cells: &[(usize, usize)], value: f32) -> ScalarField {
        let mut samples = vec![0.0f32; width * height];
        for &(x, y) in cells {
            samples[y * width + x] = value;
        }
        ScalarField::new(width, height, samples).unwrap()
    }

    fn rect_cells(x0: usize, y0: usize, x1: usize, y1: usize) -> Vec<(usize, usize)> {
        (y0..y1).flat_map(|y| (x0..x1).map(move |x| (x, y))).collect()
    }

    #[test]
    fn test_empty_field_yields_nothing() {
        let field = ScalarField::filled(10, 10, 0.2).unwrap();
        assert!(trace(&field, 0.5).unwrap().is_empty());
    }

    #[test]
    fn test_square_block_scenario() {
        // 4x4, 2x2 block at [1,2]x[1,2]
        let field = block_field(4, 4, &rect_cells(1, 1, 3, 3), 1.0);
        let contours = trace(&field, 0.5).unwrap();
        assert_eq!(contours.len(), 1);

        let contour = &contours[0];
        assert!(contour.is_closed);
        assert_eq!(contour.points.len(), 8);
        let (lo, hi) = contour.bounds().unwrap();
        assert_eq!(lo, Point2D::new(1.0, 1.0));
        assert_eq!(hi, Point2D::new(3.0, 3.0));
        assert!(contour.points.contains(&Point2D::new(1.0, 1.5)));
        assert!(contour.points.contains(&Point2D::new(2.5, 3.0)));
        // Outer boundary winds counter-clockwise on screen.
        assert!(contour.signed_area() < 0.0);
    }

    #[test]
    fn test_first_point_not_repeated() {
        let field = block_field(5, 5, &rect_cells(1, 1, 4, 3), 1.0);
        let contour = &trace(&field, 0.5).unwrap()[0];
        assert_ne!(contour.points.first(), contour.points.last());
    }

    #[test]
    fn test_sub_pixel_interpolation() {
        // A single row of coverage: 0.3 next to 0.7 crosses 0.5 halfway.
        let field = ScalarField::new(4, 3, vec![
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.3, 0.7, 0.0,
            0.0, 0.0, 0.0, 0.0,
        ])
        .unwrap();
        let contours = trace(&field, 0.5).unwrap();
        assert_eq!(contours.len(), 1);
        // Crossing between (1,1) at x=1.5 and (2,1) at x=2.5, t = 0.5.
        assert!(contours[0].points.contains(&Point2D::new(2.0, 1.5)));
    }

    #[test]
    fn test_single_pixel_is_diamond() {
        let field = block_field(5, 5, &[(2, 2)], 1.0);
        let contours = trace(&field, 0.5).unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points.len(), 4);
        assert!(contours[0].points.contains(&Point2D::new(2.5, 2.0)));
    }

    #[test]
    fn test_full_field_traces_border() {
        let field = ScalarField::filled(6, 4, 1.0).unwrap();
        let contours = trace(&field, 0.5).unwrap();
        assert_eq!(contours.len(), 1);
        assert!(contours[0].is_closed);
        let (lo, hi) = contours[0].bounds().unwrap();
        assert_eq!(lo, Point2D::new(0.0, 0.0));
        assert_eq!(hi, Point2D::new(6.0, 4.0));
    }

    #[test]
    fn test_border_crossings_are_clipped() {
        // Low threshold would place crossings outside the field without clipping.
        let field = ScalarField::filled(3, 3, 1.0).unwrap();
        let contours = trace(&field, 0.1).unwrap();
        for p in &contours[0].points {
            assert!((0.0..=3.0).contains(&p.x) && (0.0..=3.0).contains(&p.y), "{p:?}");
        }
    }

    #[test]
    fn test_zero_threshold_keeps_padding_background() {
        let field = ScalarField::filled(3, 2, 0.0).unwrap();
        let contours = trace(&field, 0.0).unwrap();
        assert_eq!(contours.len(), 1);
        let (lo, hi) = contours[0].bounds().unwrap();
        assert_eq!(lo, Point2D::new(0.0, 0.0));
        assert_eq!(hi, Point2D::new(3.0, 2.0));
    }

    #[test]
    fn test_hole_produces_second_contour() {
        let mut cells = rect_cells(1, 1, 6, 6);
        cells.retain(|&c| c != (3, 3));
        let field = block_field(7, 7, &cells, 1.0);
        let contours = trace(&field, 0.5).unwrap();
        assert_eq!(contours.len(), 2);
        // Outer found first in scan order; hole winds the other way.
        assert!(contours[0].signed_area() < 0.0);
        assert!(contours[1].signed_area() > 0.0);
    }

    #[test]
    fn test_saddle_tie_break_uses_block_average() {
        // Diagonal pair: (1,1) and (2,2).
        let strong = block_field(4, 4, &[(1, 1), (2, 2)], 1.0);
        // Block average 0.5 >= 0.5 -> joined into one contour.
        assert_eq!(trace(&strong, 0.5).unwrap().len(), 1);

        let weak = block_field(4, 4, &[(1, 1), (2, 2)], 0.6);
        // Block average 0.3 < 0.5 -> two separate contours.
        assert_eq!(trace(&weak, 0.5).unwrap().len(), 2);
    }

    #[test]
    fn test_discovery_order_is_row_major() {
        let mut cells = rect_cells(6, 1, 8, 3);
        cells.extend(rect_cells(1, 5, 3, 7));
        let field = block_field(10, 10, &cells, 1.0);
        let contours = trace(&field, 0.5).unwrap();
        assert_eq!(contours.len(), 2);
        assert!(contours[0].bounds().unwrap().0.y < contours[1].bounds().unwrap().0.y);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut cells = rect_cells(2, 2, 9, 5);
        cells.extend(rect_cells(4, 8, 12, 13));
        cells.push((14, 1));
        let field = block_field(16, 16, &cells, 0.9);
        let seq = trace_with(&field, 0.5, &TraceOptions { parallel: false, ..Default::default() }).unwrap();
        let par = trace_with(&field, 0.5, &TraceOptions::default()).unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn test_point_limit() {
        let field = block_field(5, 5, &[(2, 2)], 1.0);
        let options = TraceOptions {
            max_points: 3,
            ..Default::default()
        };
        let err = trace_with(&field, 0.5, &options).unwrap_err();
        assert!(matches!(err, GeometryError::ResourceExceeded { requested: 4, limit: 3, .. }));
    }

    #[test]
    fn test_point_limit_counts_collapsed_points() {
        // Coverage exactly at threshold puts all four crossings on the pixel centre.
        let field = block_field(5, 5, &[(2, 2)], 0.5);
        let options = TraceOptions {
            max_points: 1,
            ..Default::default()
        };
        let contours = trace_with(&field, 0.5, &options).unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points, vec![Point2D::new(2.5, 2.5)]);
    }

    #[test]
    fn test_binary_trace_uses_midpoints() {
        let field = block_field(4, 4, &rect_cells(1, 1, 3, 3), 0.8);
        let bits = field.binarize(0.5).unwrap();
        let contours = trace_binary(&bits, &TraceOptions::default()).unwrap();
        assert_eq!(contours.len(), 1);
        assert!(contours[0].points.contains(&Point2D::new(1.0, 1.5)));
    }

    #[test]
    fn test_rejects_bad_threshold() {
        let field = ScalarField::filled(2, 2, 1.0).unwrap();
        assert!(trace(&field, 2.0).is_err());
    }
}
