//! Outline extraction from coverage fields.
//!
//! - **Tracing**: marching squares with sub-pixel crossings
//! - **Simplification**: Douglas-Peucker for open and closed polylines
//! - **Curves**: one cubic Bezier per simplified edge
//! - **Paths**: move/line/curve/close commands and SVG output

pub mod bezier;
pub mod geometry;
pub mod marching_squares;
pub mod path;
pub mod simplify;

pub use bezier::{fit_beziers, fit_contour};
pub use geometry::{BezierSegment, Contour, ContourSet, Point2D};
pub use marching_squares::{trace, trace_binary, trace_with, TraceOptions};
pub use path::{contours_to_svg, PathCommand, SvgStyle};
pub use simplify::{simplify, simplify_closed, simplify_interleaved, simplify_open};
