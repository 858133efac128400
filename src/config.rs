//! Engine configuration and per-call extraction options.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_in_range, GeometryError, Result};
use crate::morphology::ExtremumMethod;
use crate::selection::bezier::{DEFAULT_SMOOTHNESS, MAX_SMOOTHNESS};

/// Allocation ceilings checked before any stage allocates its output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Limits {
    /// Maximum `width * height` of an input field.
    pub max_field_pixels: usize,
    /// Maximum total number of traced contour points.
    pub max_contour_points: usize,
    /// Maximum number of traced contours.
    pub max_contours: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_field_pixels: 16_384 * 16_384,
            max_contour_points: 1 << 24,
            max_contours: 1 << 20,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub limits: Limits,
    /// Use the rayon pool for row/column passes and the tracer scan.
    pub parallel: bool,
    pub extremum_method: ExtremumMethod,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            parallel: true,
            extremum_method: ExtremumMethod::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| GeometryError::invalid("config", e.to_string()))
    }
}

/// Options for the full extraction pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Coverage threshold in `[0, 1]`.
    pub threshold: f32,
    /// Grow (> 0) or shrink (< 0) radius applied before tracing; 0 skips it.
    pub radius: f32,
    /// Douglas-Peucker tolerance in pixels; 0 skips simplification.
    pub simplify_epsilon: f64,
    pub fit_beziers: bool,
    /// Control-point reach as a fraction of edge length, `[0, 0.5]`.
    pub bezier_smoothness: f64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            radius: 0.0,
            simplify_epsilon: 0.0,
            fit_beziers: false,
            bezier_smoothness: DEFAULT_SMOOTHNESS,
        }
    }
}

impl ExtractOptions {
    /// Check every numeric field before any work starts.
    pub fn validate(&self) -> Result<()> {
        ensure_in_range("threshold", self.threshold as f64, 0.0, 1.0)?;
        if !self.radius.is_finite() {
            return Err(GeometryError::invalid("radius", format!("must be finite, got {}", self.radius)));
        }
        ensure_in_range("simplify_epsilon", self.simplify_epsilon, 0.0, f64::MAX)?;
        ensure_in_range("bezier_smoothness", self.bezier_smoothness, 0.0, MAX_SMOOTHNESS)?;
        Ok(())
    }
}
