//! StagVector
//!
//! Raster-to-vector geometry for selection masks, implemented in Rust
//! with Python bindings via PyO3 and WASM bindings for JavaScript.
//!
//! ## Pipeline
//! 1. [`ScalarField`]: per-pixel coverage in `[0, 1]`, shape (height, width)
//! 2. [`morphology`]: separable grow/shrink by a radius in pixels
//! 3. [`selection::marching_squares`]: sub-pixel closed contours
//! 4. [`selection::simplify`]: Douglas-Peucker
//! 5. [`selection::bezier`]: cubic curves over the simplified outline
//! 6. [`transfer`] / [`selection::path`]: flat `f32` buffers and SVG paths
//!
//! [`VectorEngine`] runs the stages under one [`EngineConfig`].

pub mod config;
pub mod engine;
pub mod error;
pub mod field;
pub mod morphology;
pub mod selection;
pub mod transfer;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::{EngineConfig, ExtractOptions, Limits};
pub use engine::VectorEngine;
pub use error::{GeometryError, Result};
pub use field::{binarize, BinaryField, ScalarField};
pub use morphology::{grow, morph, shrink, ExtremumMethod};
pub use selection::{BezierSegment, Contour, ContourSet, Point2D};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{IntoPyArray, PyArray1, PyArray2, PyReadonlyArray1, PyReadonlyArray2};
    use pyo3::prelude::*;

    use crate::config::ExtractOptions;
    use crate::engine::VectorEngine;
    use crate::field::ScalarField;
    use crate::selection::path::{contours_to_svg as render_svg, SvgStyle};
    use crate::selection::simplify::simplify_interleaved;
    use crate::transfer;

    /// Grow (radius > 0) or shrink (radius < 0) a float coverage mask.
    ///
    /// Input and output are (height, width) float32 arrays in 0.0-1.0.
    #[pyfunction]
    pub fn grow_shrink_mask<'py>(
        py: Python<'py>,
        mask: PyReadonlyArray2<'py, f32>,
        radius: f32,
    ) -> PyResult<Bound<'py, PyArray2<f32>>> {
        let field = ScalarField::from_array(mask.as_array().to_owned())?;
        let engine = VectorEngine::default();
        let result = py.allow_threads(|| engine.morph(&field, radius))?;
        Ok(result.into_array().into_pyarray(py))
    }

    /// Extract contours from a coverage mask as a flat transfer buffer.
    ///
    /// Layout: `[count, is_closed, n, x0, y0, ..., has_beziers, ...]`.
    #[pyfunction]
    #[pyo3(signature = (mask, threshold=0.5, radius=0.0, simplify_epsilon=0.0, fit_beziers=false, bezier_smoothness=0.25))]
    pub fn extract_contours<'py>(
        py: Python<'py>,
        mask: PyReadonlyArray2<'py, f32>,
        threshold: f32,
        radius: f32,
        simplify_epsilon: f64,
        fit_beziers: bool,
        bezier_smoothness: f64,
    ) -> PyResult<Bound<'py, PyArray1<f32>>> {
        let field = ScalarField::from_array(mask.as_array().to_owned())?;
        let options = ExtractOptions {
            threshold,
            radius,
            simplify_epsilon,
            fit_beziers,
            bezier_smoothness,
        };
        let engine = VectorEngine::default();
        let flat = py.allow_threads(|| engine.extract_flat(&field, &options))?;
        Ok(flat.into_pyarray(py))
    }

    /// Douglas-Peucker over interleaved `[x0, y0, x1, y1, ...]` coordinates.
    #[pyfunction]
    #[pyo3(signature = (points, epsilon, closed=false))]
    pub fn simplify_polyline<'py>(
        py: Python<'py>,
        points: PyReadonlyArray1<'py, f64>,
        epsilon: f64,
        closed: bool,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        let coords = points.as_slice()?;
        let result = simplify_interleaved(coords, epsilon, closed)?;
        Ok(result.into_pyarray(py))
    }

    /// Render a transfer buffer as an SVG document.
    #[pyfunction]
    #[pyo3(signature = (buffer, width, height, fill="black", stroke=None, stroke_width=1.0, background=None))]
    pub fn contours_to_svg(
        buffer: PyReadonlyArray1<'_, f32>,
        width: usize,
        height: usize,
        fill: &str,
        stroke: Option<String>,
        stroke_width: f32,
        background: Option<String>,
    ) -> PyResult<String> {
        let contours = transfer::decode(buffer.as_slice()?)?;
        let style = SvgStyle {
            fill: fill.to_string(),
            stroke,
            stroke_width,
            background,
        };
        Ok(render_svg(&contours, width, height, &style))
    }

    #[pymodule]
    pub fn stagvector(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(grow_shrink_mask, m)?)?;
        m.add_function(wrap_pyfunction!(extract_contours, m)?)?;
        m.add_function(wrap_pyfunction!(simplify_polyline, m)?)?;
        m.add_function(wrap_pyfunction!(contours_to_svg, m)?)?;
        Ok(())
    }
}
