//! Coverage fields and binarization.
//!
//! A [`ScalarField`] is a `(height, width)` grid of coverage samples,
//! conventionally in `0.0..=1.0`. Every consumer treats samples outside the
//! grid as background (coverage 0), so no stage ever needs to read out of
//! bounds.

use ndarray::{Array2, ArrayView2};

use crate::error::{ensure_in_range, GeometryError, Result};

/// Coverage samples stored row-major as `(height, width)`.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarField {
    samples: Array2<f32>,
}

impl ScalarField {
    /// Wrap a flat row-major sample buffer.
    ///
    /// Fails if either dimension is zero or `samples.len() != width * height`.
    pub fn new(width: usize, height: usize, samples: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GeometryError::invalid(
                "dimensions",
                format!("width and height must be non-zero, got {width}x{height}"),
            ));
        }
        let expected = width.checked_mul(height).ok_or_else(|| {
            GeometryError::invalid("dimensions", format!("{width}x{height} overflows"))
        })?;
        if samples.len() != expected {
            return Err(GeometryError::invalid(
                "samples",
                format!("expected {expected} samples for {width}x{height}, got {}", samples.len()),
            ));
        }
        let samples = Array2::from_shape_vec((height, width), samples)
            .map_err(|e| GeometryError::invalid("samples", e.to_string()))?;
        Ok(Self { samples })
    }

    /// Wrap an existing `(height, width)` array.
    pub fn from_array(samples: Array2<f32>) -> Result<Self> {
        let (height, width) = samples.dim();
        if width == 0 || height == 0 {
            return Err(GeometryError::invalid(
                "dimensions",
                format!("width and height must be non-zero, got {width}x{height}"),
            ));
        }
        Ok(Self {
            samples: samples.as_standard_layout().into_owned(),
        })
    }

    /// Field of the given shape filled with one value.
    pub fn filled(width: usize, height: usize, value: f32) -> Result<Self> {
        Self::new(width, height, vec![value; width.saturating_mul(height)])
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.samples.ncols()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.samples.nrows()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample at `(x, y)`; `None` outside the grid.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        self.samples.get((y, x)).copied()
    }

    /// Sample at signed coordinates, with the background edge policy applied.
    #[inline]
    pub(crate) fn sample_or_background(&self, x: isize, y: isize) -> f32 {
        if x < 0 || y < 0 {
            return 0.0;
        }
        self.get(x as usize, y as usize).unwrap_or(0.0)
    }

    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.samples.view()
    }

    /// Row-major samples. Always contiguous.
    pub fn as_slice(&self) -> &[f32] {
        self.samples
            .as_slice()
            .expect("ScalarField is always stored in standard layout")
    }

    pub fn into_array(self) -> Array2<f32> {
        self.samples
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.samples.into_raw_vec_and_offset().0
    }

    /// Threshold into a [`BinaryField`] (`sample >= threshold` is foreground).
    pub fn binarize(&self, threshold: f32) -> Result<BinaryField> {
        binarize(self, threshold)
    }
}

/// Foreground/background grid derived from a [`ScalarField`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryField {
    bits: Array2<bool>,
}

impl BinaryField {
    pub fn from_array(bits: Array2<bool>) -> Self {
        Self { bits }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.bits.ncols()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.bits.nrows()
    }

    /// Foreground test with the background edge policy for out-of-range cells.
    #[inline]
    pub fn is_set(&self, x: isize, y: isize) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        self.bits.get((y as usize, x as usize)).copied().unwrap_or(false)
    }

    /// Number of foreground cells.
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    pub fn view(&self) -> ArrayView2<'_, bool> {
        self.bits.view()
    }

    /// Selection mask with 255 for foreground, 0 for background.
    pub fn to_mask_u8(&self) -> Vec<u8> {
        self.bits.iter().map(|&b| if b { 255 } else { 0 }).collect()
    }
}

/// Threshold a coverage field. No interpolation happens at this stage.
pub fn binarize(field: &ScalarField, threshold: f32) -> Result<BinaryField> {
    ensure_in_range("threshold", threshold as f64, 0.0, 1.0)?;
    Ok(BinaryField {
        bits: field.samples.mapv(|v| v >= threshold),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_length_mismatch() {
        let err = ScalarField::new(4, 4, vec![0.0; 15]).unwrap_err();
        assert!(matches!(err, GeometryError::InvalidParameter { name: "samples", .. }));
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        assert!(ScalarField::new(0, 4, Vec::new()).is_err());
        assert!(ScalarField::new(4, 0, Vec::new()).is_err());
    }

    #[test]
    fn test_binarize_is_inclusive() {
        let field = ScalarField::new(3, 1, vec![0.49, 0.5, 0.51]).unwrap();
        let bin = field.binarize(0.5).unwrap();
        assert!(!bin.is_set(0, 0));
        assert!(bin.is_set(1, 0));
        assert!(bin.is_set(2, 0));
        assert_eq!(bin.count(), 2);
    }

    #[test]
    fn test_binarize_rejects_bad_threshold() {
        let field = ScalarField::filled(2, 2, 1.0).unwrap();
        assert!(field.binarize(f32::NAN).is_err());
        assert!(field.binarize(-0.1).is_err());
        assert!(field.binarize(1.1).is_err());
    }

    #[test]
    fn test_out_of_bounds_is_background() {
        let field = ScalarField::filled(2, 2, 1.0).unwrap();
        let bin = field.binarize(0.5).unwrap();
        assert!(!bin.is_set(-1, 0));
        assert!(!bin.is_set(2, 1));
        assert_eq!(field.sample_or_background(0, -1), 0.0);
        assert_eq!(field.sample_or_background(1, 1), 1.0);
    }

    #[test]
    fn test_binary_field_mask_round_trip() {
        let bits = ndarray::array![[true, false, false], [false, true, true]];
        let field = BinaryField::from_array(bits.clone());
        assert_eq!(field.width(), 3);
        assert_eq!(field.height(), 2);
        assert_eq!(field.view(), bits.view());
        assert_eq!(field.to_mask_u8(), vec![255, 0, 0, 0, 255, 255]);

        let coverage = ScalarField::new(3, 2, vec![0.9, 0.1, 0.0, 0.2, 0.6, 1.0]).unwrap();
        assert_eq!(coverage.binarize(0.5).unwrap(), field);
    }

    #[test]
    fn test_row_major_layout() {
        let field = ScalarField::new(3, 2, vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5]).unwrap();
        assert_eq!(field.get(2, 0), Some(0.2));
        assert_eq!(field.get(0, 1), Some(0.3));
        assert_eq!(field.get(3, 0), None);
        assert_eq!(field.as_slice().len(), 6);
    }
}
