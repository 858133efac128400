//! Flat `f32` transfer format for contour sets.
//!
//! Layout:
//!
//! ```text
//! [contour_count,
//!  is_closed, point_count, x0, y0, x1, y1, ...,
//!  has_beziers, (if has_beziers: bezier_count, p0x, p0y, p1x, p1y, p2x, p2y, p3x, p3y, ...),
//!  is_closed, point_count, ...]
//! ```
//!
//! Counts and flags are stored as floats. Producers only write integral
//! values; readers truncate toward zero.

use crate::config::Limits;
use crate::error::{GeometryError, Result};
use crate::selection::geometry::{BezierSegment, Contour, ContourSet, Point2D};

/// Largest count an `f32` carries exactly (2^24).
pub const MAX_EXACT_COUNT: usize = 1 << 24;

const FLOATS_PER_POINT: usize = 2;
const FLOATS_PER_BEZIER: usize = 8;

fn encode_count(what: &'static str, count: usize) -> Result<f32> {
    if count > MAX_EXACT_COUNT {
        return Err(GeometryError::ResourceExceeded {
            what,
            requested: count,
            limit: MAX_EXACT_COUNT,
        });
    }
    Ok(count as f32)
}

#[inline]
fn flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Number of floats [`encode`] will produce.
pub fn encoded_len(contours: &[Contour]) -> usize {
    1 + contours
        .iter()
        .map(|c| {
            2 + c.points.len() * FLOATS_PER_POINT
                + 1
                + c.beziers
                    .as_ref()
                    .map_or(0, |b| 1 + b.len() * FLOATS_PER_BEZIER)
        })
        .sum::<usize>()
}

/// Flatten contours into a transfer buffer.
///
/// # Arguments
/// * `contours` - Contours to encode; each must have at least one point
///
/// # Returns
/// The flat buffer, or `InvalidParameter` for an empty contour and
/// `ResourceExceeded` for a count above [`MAX_EXACT_COUNT`]
pub fn encode(contours: &[Contour]) -> Result<Vec<f32>> {
    if let Some(index) = contours.iter().position(|c| c.points.is_empty()) {
        return Err(GeometryError::invalid(
            "contours",
            format!("contour {index} has no points"),
        ));
    }

    let mut out = Vec::with_capacity(encoded_len(contours));
    out.push(encode_count("contour count", contours.len())?);

    for contour in contours {
        out.push(flag(contour.is_closed));
        out.push(encode_count("point count", contour.points.len())?);
        for p in &contour.points {
            out.push(p.x as f32);
            out.push(p.y as f32);
        }

        match &contour.beziers {
            Some(beziers) => {
                out.push(1.0);
                out.push(encode_count("bezier count", beziers.len())?);
                for b in beziers {
                    for p in [b.p0, b.p1, b.p2, b.p3] {
                        out.push(p.x as f32);
                        out.push(p.y as f32);
                    }
                }
            }
            None => out.push(0.0),
        }
    }

    Ok(out)
}

/// Bounds-checked reader over a transfer buffer.
pub struct Cursor<'a> {
    data: &'a [f32],
    offset: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [f32]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn read(&mut self) -> Result<f32> {
        let value = *self
            .data
            .get(self.offset)
            .ok_or_else(|| GeometryError::decode(self.offset, "unexpected end of buffer"))?;
        self.offset += 1;
        Ok(value)
    }

    /// Borrow the next `n` values.
    pub fn take(&mut self, n: usize) -> Result<&'a [f32]> {
        if n > self.remaining() {
            return Err(GeometryError::decode(
                self.offset,
                format!("need {n} values, only {} remain", self.remaining()),
            ));
        }
        let slice = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    /// Read a count, truncating toward zero.
    pub fn read_count(&mut self, what: &str) -> Result<usize> {
        let at = self.offset;
        let raw = self.read()?;
        if !raw.is_finite() || raw < 0.0 {
            return Err(GeometryError::decode(at, format!("{what} must be a non-negative number, got {raw}")));
        }
        Ok(raw.trunc() as usize)
    }

    /// Read a `0.0` / `1.0` flag.
    pub fn read_flag(&mut self, what: &str) -> Result<bool> {
        let at = self.offset;
        match self.read()? {
            v if v == 1.0 => Ok(true),
            v if v == 0.0 => Ok(false),
            v => Err(GeometryError::decode(at, format!("{what} must be 0 or 1, got {v}"))),
        }
    }

    /// Read a count of records of `stride` floats each, checking that they fit.
    fn read_sized_count(&mut self, what: &str, stride: usize) -> Result<usize> {
        let at = self.offset;
        let count = self.read_count(what)?;
        let needed = count.checked_mul(stride).unwrap_or(usize::MAX);
        if needed > self.remaining() {
            return Err(GeometryError::decode(
                at,
                format!("{what} {count} needs {needed} values, only {} remain", self.remaining()),
            ));
        }
        Ok(count)
    }
}

fn point_pairs(values: &[f32]) -> impl Iterator<Item = Point2D> + '_ {
    values
        .chunks_exact(2)
        .map(|xy| Point2D::new(xy[0] as f64, xy[1] as f64))
}

/// Rebuild a contour set from a transfer buffer.
///
/// # Arguments
/// * `buffer` - Flat buffer in the layout described at the top of this module
///
/// # Returns
/// The contour set, or `DecodeError` with the offset of the first bad value
pub fn decode(buffer: &[f32]) -> Result<ContourSet> {
    decode_bounded(buffer, usize::MAX, usize::MAX)
}

/// [`decode`] that enforces `limits.max_contours` and
/// `limits.max_contour_points` against the declared counts, before the
/// corresponding storage is allocated.
pub fn decode_within(buffer: &[f32], limits: &Limits) -> Result<ContourSet> {
    decode_bounded(buffer, limits.max_contours, limits.max_contour_points)
}

fn decode_bounded(buffer: &[f32], max_contours: usize, max_points: usize) -> Result<ContourSet> {
    let mut cursor = Cursor::new(buffer);
    // Smallest contour record: flag, count, one point, bezier flag.
    let contour_count = cursor.read_sized_count("contour count", 5)?;
    if contour_count > max_contours {
        return Err(GeometryError::ResourceExceeded {
            what: "contours",
            requested: contour_count,
            limit: max_contours,
        });
    }
    let mut contours = Vec::with_capacity(contour_count);
    let mut total_points = 0usize;

    for _ in 0..contour_count {
        let is_closed = cursor.read_flag("is_closed")?;

        let at = cursor.offset();
        let point_count = cursor.read_sized_count("point count", FLOATS_PER_POINT)?;
        if point_count == 0 {
            return Err(GeometryError::decode(at, "contour has no points"));
        }
        total_points = total_points.saturating_add(point_count);
        if total_points > max_points {
            return Err(GeometryError::ResourceExceeded {
                what: "contour points",
                requested: total_points,
                limit: max_points,
            });
        }
        let points: Vec<Point2D> = point_pairs(cursor.take(point_count * FLOATS_PER_POINT)?).collect();

        let beziers = if cursor.read_flag("has_beziers")? {
            let count = cursor.read_sized_count("bezier count", FLOATS_PER_BEZIER)?;
            let values = cursor.take(count * FLOATS_PER_BEZIER)?;
            let segments = values
                .chunks_exact(FLOATS_PER_BEZIER)
                .map(|v| {
                    let at = |k: usize| Point2D::new(v[2 * k] as f64, v[2 * k + 1] as f64);
                    BezierSegment::new(at(0), at(1), at(2), at(3))
                })
                .collect();
            Some(segments)
        } else {
            None
        };

        contours.push(Contour {
            points,
            is_closed,
            beziers,
        });
    }

    if cursor.remaining() != 0 {
        return Err(GeometryError::decode(
            cursor.offset(),
            format!("{} trailing values after last contour", cursor.remaining()),
        ));
    }

    Ok(contours)
}
