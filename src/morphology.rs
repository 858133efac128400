//! Morphology: grow and shrink a coverage field.
//!
//! Both operations are separable extremum filters. Pass 1 slides a window
//! of half-width `r = ceil(|radius|)` along every row and keeps the max
//! (grow) or min (shrink); pass 2 does the same along every column of the
//! pass-1 output. The combined structuring element is the `(2r+1)²` square.
//!
//! Samples outside the field count as background (0.0), so shrinking pulls
//! coverage in from the field border as well as from interior edges.

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::error::{ensure_finite, Result};
use crate::field::ScalarField;

/// Coverage assumed outside the field.
const BACKGROUND: f32 = 0.0;

/// Which extremum the window keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MorphOp {
    /// Max filter.
    Dilate,
    /// Min filter.
    Erode,
}

impl MorphOp {
    #[inline]
    fn pick(self, a: f32, b: f32) -> f32 {
        match self {
            MorphOp::Dilate => a.max(b),
            MorphOp::Erode => a.min(b),
        }
    }

    /// True if `candidate` makes `incumbent` irrelevant for every later window.
    #[inline]
    fn dominates(self, candidate: f32, incumbent: f32) -> bool {
        match self {
            MorphOp::Dilate => candidate >= incumbent,
            MorphOp::Erode => candidate <= incumbent,
        }
    }
}

/// 1D sliding-window kernel used by both passes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtremumMethod {
    /// Rescan the whole window for every cell: O(r) per cell.
    Window,
    /// Monotonic deque of window candidates: O(1) amortized per cell.
    #[default]
    MonotonicDeque,
}

/// Grow (`radius > 0`) or shrink (`radius < 0`) a field.
///
/// `radius == 0` returns an exact copy. The output always has the input's
/// shape; radii larger than the field saturate.
///
/// # Arguments
/// * `field` - Coverage field, shape (height, width)
/// * `radius` - Signed radius in pixels; the window half-width is `ceil(|radius|)`
///
/// # Returns
/// The filtered field, or `InvalidParameter` for a non-finite radius
pub fn morph(field: &ScalarField, radius: f32) -> Result<ScalarField> {
    morph_with(field, radius, ExtremumMethod::default(), true)
}

/// [`morph`] with an explicit kernel and parallelism switch.
pub fn morph_with(
    field: &ScalarField,
    radius: f32,
    method: ExtremumMethod,
    parallel: bool,
) -> Result<ScalarField> {
    ensure_finite("radius", radius as f64)?;

    if radius == 0.0 {
        return Ok(field.clone());
    }

    let op = if radius > 0.0 { MorphOp::Dilate } else { MorphOp::Erode };
    let r = radius.abs().ceil() as usize;

    let rows = filter_rows(field.view().to_owned(), r, op, method, parallel);
    // Column pass: rows of the transpose are the columns of the field.
    let transposed = rows.t().as_standard_layout().into_owned();
    let columns = filter_rows(transposed, r, op, method, parallel);

    ScalarField::from_array(columns.t().as_standard_layout().into_owned())
}

/// Convenience wrapper: dilate by `radius`.
pub fn grow(field: &ScalarField, radius: f32) -> Result<ScalarField> {
    morph(field, radius.abs())
}

/// Convenience wrapper: erode by `radius`.
pub fn shrink(field: &ScalarField, radius: f32) -> Result<ScalarField> {
    morph(field, -radius.abs())
}

/// Apply the 1D filter to every row of a standard-layout array.
fn filter_rows(
    src: Array2<f32>,
    r: usize,
    op: MorphOp,
    method: ExtremumMethod,
    parallel: bool,
) -> Array2<f32> {
    let (height, width) = src.dim();
    let mut out = Array2::<f32>::zeros((height, width));
    let (Some(src_data), Some(out_data)) = (src.as_slice(), out.as_slice_mut()) else {
        unreachable!("filter_rows operates on freshly allocated standard-layout arrays");
    };

    let kernel = |(src_row, dst_row): (&[f32], &mut [f32])| match method {
        ExtremumMethod::Window => window_extremum(src_row, dst_row, r, op),
        ExtremumMethod::MonotonicDeque => deque_extremum(src_row, dst_row, r, op),
    };

    if parallel {
        src_data
            .par_chunks(width)
            .zip(out_data.par_chunks_mut(width))
            .for_each(kernel);
    } else {
        src_data
            .chunks(width)
            .zip(out_data.chunks_mut(width))
            .for_each(kernel);
    }

    out
}

/// Baseline kernel: scan `[x - r, x + r]` for each output cell.
fn window_extremum(src: &[f32], dst: &mut [f32], r: usize, op: MorphOp) {
    let n = src.len();
    // A window wider than the row always reaches past both ends.
    let r = r.min(n);

    for (x, out) in dst.iter_mut().enumerate() {
        let lo = x.saturating_sub(r);
        let hi = (x + r).min(n - 1);
        let mut acc = src[lo];
        for &v in &src[lo + 1..=hi] {
            acc = op.pick(acc, v);
        }
        if x < r || x + r >= n {
            acc = op.pick(acc, BACKGROUND);
        }
        *out = acc;
    }
}

/// Monotonic-deque kernel over the row padded with `r` background cells on
/// each side.
fn deque_extremum(src: &[f32], dst: &mut [f32], r: usize, op: MorphOp) {
    let n = src.len();
    let r = r.min(n);
    let value_at = |i: usize| -> f32 {
        // `i` indexes the padded row; the real row starts at `r`.
        if i < r || i - r >= n {
            BACKGROUND
        } else {
            src[i - r]
        }
    };

    let mut deque: VecDeque<(usize, f32)> = VecDeque::with_capacity(2 * r + 1);
    let window = 2 * r + 1;

    for i in 0..n + 2 * r {
        let v = value_at(i);
        while let Some(&(_, back)) = deque.back() {
            if op.dominates(v, back) {
                deque.pop_back();
            } else {
                break;
            }
        }
        deque.push_back((i, v));

        if i + 1 >= window {
            let start = i + 1 - window;
            while let Some(&(front_idx, _)) = deque.front() {
                if front_idx < start {
                    deque.pop_front();
                } else {
                    break;
                }
            }
            // The window ending at padded index `i` is centred on output `start`.
            if let Some(&(_, extremum)) = deque.front() {
                dst[start] = extremum;
            }
        }
    }
}
