//! WebAssembly exports for StagVector.
//!
//! These functions are exposed to JavaScript via wasm-bindgen. Masks are
//! flat row-major float arrays (length = width * height, values 0.0-1.0);
//! contour sets travel as the flat transfer buffer described in
//! [`crate::transfer`].

use wasm_bindgen::prelude::*;

use crate::config::ExtractOptions;
use crate::engine::VectorEngine;
use crate::error::GeometryError;
use crate::selection::path::{contours_to_svg, SvgStyle};
use crate::selection::simplify::simplify_interleaved;
use crate::transfer;

fn js_error(err: GeometryError) -> JsError {
    JsError::new(&err.to_string())
}

/// Grow (radius > 0) or shrink (radius < 0) a coverage mask.
///
/// # Returns
/// Flat array of floats with the same dimensions as the input
#[wasm_bindgen]
pub fn grow_shrink_mask_wasm(
    data: &[f32],
    width: usize,
    height: usize,
    radius: f32,
) -> Result<Vec<f32>, JsError> {
    let engine = VectorEngine::default();
    let field = engine.field(width, height, data.to_vec()).map_err(js_error)?;
    let result = engine.morph(&field, radius).map_err(js_error)?;
    Ok(result.into_vec())
}

/// Extract contours from a coverage mask.
///
/// # Returns
/// Flat transfer buffer: `[count, is_closed, n, x0, y0, ..., has_beziers, ...]`
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn extract_contours_wasm(
    data: &[f32],
    width: usize,
    height: usize,
    threshold: f32,
    radius: f32,
    simplify_epsilon: f64,
    fit_beziers: bool,
    bezier_smoothness: f64,
) -> Result<Vec<f32>, JsError> {
    let engine = VectorEngine::default();
    let field = engine.field(width, height, data.to_vec()).map_err(js_error)?;
    let options = ExtractOptions {
        threshold,
        radius,
        simplify_epsilon,
        fit_beziers,
        bezier_smoothness,
    };
    engine.extract_flat(&field, &options).map_err(js_error)
}

/// Douglas-Peucker over interleaved `[x0, y0, x1, y1, ...]` coordinates.
#[wasm_bindgen]
pub fn simplify_polyline_wasm(points: &[f64], epsilon: f64, closed: bool) -> Result<Vec<f64>, JsError> {
    simplify_interleaved(points, epsilon, closed).map_err(js_error)
}

/// Render a transfer buffer as an SVG document string.
#[wasm_bindgen]
pub fn contours_to_svg_wasm(
    buffer: &[f32],
    width: usize,
    height: usize,
    fill: &str,
    stroke: Option<String>,
    stroke_width: f32,
    background: Option<String>,
) -> Result<String, JsError> {
    let contours = transfer::decode(buffer).map_err(js_error)?;
    let style = SvgStyle {
        fill: fill.to_string(),
        stroke,
        stroke_width,
        background,
    };
    Ok(contours_to_svg(&contours, width, height, &style))
}
