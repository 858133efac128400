//! The caller-constructed engine that runs pipeline stages under one
//! configuration.
//!
//! `VectorEngine` owns no buffers and no mutable state; it is `Send + Sync`
//! and can be shared across threads. Each method validates its inputs and the
//! configured limits before allocating anything.

use std::time::Instant;

use log::debug;

use crate::config::{EngineConfig, ExtractOptions};
use crate::error::{GeometryError, Result};
use crate::field::{BinaryField, ScalarField};
use crate::morphology::morph_with;
use crate::selection::bezier::{fit_beziers, fit_contour};
use crate::selection::geometry::{BezierSegment, ContourSet, Point2D};
use crate::selection::marching_squares::{trace_with, TraceOptions};
use crate::selection::simplify::simplify;
use crate::transfer;

#[derive(Clone, Debug, Default)]
pub struct VectorEngine {
    config: EngineConfig,
}

impl VectorEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build a field from a flat row-major buffer, enforcing the pixel limit.
    pub fn field(&self, width: usize, height: usize, samples: Vec<f32>) -> Result<ScalarField> {
        self.check_field_size(width.saturating_mul(height))?;
        ScalarField::new(width, height, samples)
    }

    fn check_field_size(&self, pixels: usize) -> Result<()> {
        let limit = self.config.limits.max_field_pixels;
        if pixels > limit {
            return Err(GeometryError::ResourceExceeded {
                what: "field pixels",
                requested: pixels,
                limit,
            });
        }
        Ok(())
    }

    /// Grow (`radius > 0`) or shrink (`radius < 0`) a field.
    ///
    /// # Arguments
    /// * `field` - Coverage field; its pixel count must be within `max_field_pixels`
    /// * `radius` - Signed radius in pixels, rounded up in magnitude
    ///
    /// # Returns
    /// A field with the same dimensions as `field`
    pub fn morph(&self, field: &ScalarField, radius: f32) -> Result<ScalarField> {
        self.check_field_size(field.len())?;
        let started = Instant::now();
        let out = morph_with(field, radius, self.config.extremum_method, self.config.parallel)?;
        debug!(
            "morph: {}x{} radius {} ({:?}) in {:?}",
            field.width(),
            field.height(),
            radius,
            self.config.extremum_method,
            started.elapsed()
        );
        Ok(out)
    }

    pub fn binarize(&self, field: &ScalarField, threshold: f32) -> Result<BinaryField> {
        self.check_field_size(field.len())?;
        field.binarize(threshold)
    }

    /// Trace every boundary of the `>= threshold` region.
    pub fn trace(&self, field: &ScalarField, threshold: f32) -> Result<ContourSet> {
        self.check_field_size(field.len())?;
        let started = Instant::now();
        let contours = trace_with(field, threshold, &self.trace_options())?;
        debug!(
            "trace: {}x{} threshold {} -> {} contours, {} points in {:?}",
            field.width(),
            field.height(),
            threshold,
            contours.len(),
            contours.iter().map(|c| c.points.len()).sum::<usize>(),
            started.elapsed()
        );
        Ok(contours)
    }

    fn trace_options(&self) -> TraceOptions {
        TraceOptions {
            parallel: self.config.parallel,
            max_points: self.config.limits.max_contour_points,
            max_contours: self.config.limits.max_contours,
        }
    }

    pub fn simplify(&self, points: &[Point2D], epsilon: f64, closed: bool) -> Result<Vec<Point2D>> {
        simplify(points, epsilon, closed)
    }

    pub fn fit_beziers(&self, points: &[Point2D], closed: bool, smoothness: f64) -> Result<Vec<BezierSegment>> {
        fit_beziers(points, closed, smoothness)
    }

    /// Full pipeline: optional morphology, tracing, optional simplification
    /// and optional curve fitting.
    pub fn extract(&self, field: &ScalarField, options: &ExtractOptions) -> Result<ContourSet> {
        options.validate()?;
        self.check_field_size(field.len())?;

        let grown;
        let source = if options.radius != 0.0 {
            grown = self.morph(field, options.radius)?;
            &grown
        } else {
            field
        };

        let mut contours = self.trace(source, options.threshold)?;

        if options.simplify_epsilon > 0.0 || options.fit_beziers {
            let before: usize = contours.iter().map(|c| c.points.len()).sum();
            for contour in &mut contours {
                if options.simplify_epsilon > 0.0 {
                    contour.points = simplify(&contour.points, options.simplify_epsilon, contour.is_closed)?;
                }
                if options.fit_beziers {
                    fit_contour(contour, options.bezier_smoothness)?;
                }
            }
            let after: usize = contours.iter().map(|c| c.points.len()).sum();
            debug!(
                "extract: simplified {} -> {} points (epsilon {}), beziers: {}",
                before, after, options.simplify_epsilon, options.fit_beziers
            );
        }

        Ok(contours)
    }

    /// [`extract`](Self::extract) straight into a transfer buffer.
    pub fn extract_flat(&self, field: &ScalarField, options: &ExtractOptions) -> Result<Vec<f32>> {
        let contours = self.extract(field, options)?;
        self.encode(&contours)
    }

    pub fn encode(&self, contours: &ContourSet) -> Result<Vec<f32>> {
        transfer::encode(contours)
    }

    /// Decode a transfer buffer under the configured contour limits.
    ///
    /// Declared counts are checked before their storage is allocated.
    pub fn decode(&self, buffer: &[f32]) -> Result<ContourSet> {
        transfer::decode_within(buffer, &self.config.limits)
    }
}
