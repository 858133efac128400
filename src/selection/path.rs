//! Path descriptions for external renderers.
//!
//! A contour becomes `MoveTo` its first point, then either `LineTo` for each
//! further polyline point or `CurveTo` per Bezier segment, then `Close` iff
//! the contour is closed. [`Contour::to_svg_path`] formats the same commands
//! as SVG path data.

use crate::selection::geometry::{Contour, Point2D};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(Point2D),
    LineTo(Point2D),
    /// Control 1, control 2, end anchor.
    CurveTo(Point2D, Point2D, Point2D),
    Close,
}

impl Contour {
    /// Move/line/curve/close commands describing this contour.
    ///
    /// Curve data is used when present and non-empty; otherwise the polyline.
    pub fn path_commands(&self) -> Vec<PathCommand> {
        let Some(first) = self.points.first() else {
            return Vec::new();
        };

        let mut commands = Vec::with_capacity(self.points.len() + 2);

        match self.beziers.as_deref() {
            Some(beziers) if !beziers.is_empty() => {
                commands.push(PathCommand::MoveTo(beziers[0].p0));
                commands.extend(
                    beziers
                        .iter()
                        .map(|b| PathCommand::CurveTo(b.p1, b.p2, b.p3)),
                );
            }
            _ => {
                commands.push(PathCommand::MoveTo(*first));
                commands.extend(self.points[1..].iter().map(|&p| PathCommand::LineTo(p)));
            }
        }

        if self.is_closed {
            commands.push(PathCommand::Close);
        }

        commands
    }

    /// SVG path data (`M x,y L x,y C ... Z`) with three decimals.
    pub fn to_svg_path(&self) -> String {
        let mut path = String::new();
        for command in self.path_commands() {
            if !path.is_empty() {
                path.push(' ');
            }
            match command {
                PathCommand::MoveTo(p) => path.push_str(&format!("M {:.3},{:.3}", p.x, p.y)),
                PathCommand::LineTo(p) => path.push_str(&format!("L {:.3},{:.3}", p.x, p.y)),
                PathCommand::CurveTo(c1, c2, p) => path.push_str(&format!(
                    "C {:.3},{:.3} {:.3},{:.3} {:.3},{:.3}",
                    c1.x, c1.y, c2.x, c2.y, p.x, p.y
                )),
                PathCommand::Close => path.push('Z'),
            }
        }
        path
    }
}

/// Presentation attributes for [`contours_to_svg`].
#[derive(Clone, Debug, PartialEq)]
pub struct SvgStyle {
    pub fill: String,
    pub stroke: Option<String>,
    pub stroke_width: f32,
    pub background: Option<String>,
}

impl Default for SvgStyle {
    fn default() -> Self {
        Self {
            fill: "black".to_string(),
            stroke: None,
            stroke_width: 1.0,
            background: None,
        }
    }
}

/// Render contours as a standalone SVG document, one `<path>` per contour.
pub fn contours_to_svg(contours: &[Contour], width: usize, height: usize, style: &SvgStyle) -> String {
    // Explicit width/height alongside viewBox; some viewers ignore viewBox alone.
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}px" height="{height}px" viewBox="0 0 {width} {height}">"#
    );
    svg.push('\n');

    if let Some(bg) = &style.background {
        svg.push_str(&format!(
            "  <rect x=\"0\" y=\"0\" width=\"{width}\" height=\"{height}\" fill=\"{bg}\"/>\n"
        ));
    }

    for contour in contours {
        let data = contour.to_svg_path();
        if data.is_empty() {
            continue;
        }
        svg.push_str(&format!(
            r#"  <path d="{data}" fill="{}" fill-rule="nonzero""#,
            style.fill
        ));
        if let Some(stroke) = &style.stroke {
            svg.push_str(&format!(
                r#" stroke="{stroke}" stroke-width="{:.2}""#,
                style.stroke_width
            ));
        }
        svg.push_str("/>\n");
    }

    svg.push_str("</svg>\n");
    svg
}
