//! Cairo stroke primitives shared by the preview engine.
//!
//! All coordinates are logical; contexts come from [`Canvas::draw`] already
//! scaled by the display's pixel density.
//!
//! [`Canvas::draw`]: super::Canvas::draw

use super::color::Color;
use crate::util;

/// Stroke parameters applied to every primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    /// Outline color
    pub color: Color,
    /// Line width in logical pixels
    pub line_width: f64,
    /// Arrowhead segment length in logical pixels
    pub arrow_length: f64,
    /// Arrowhead angle in degrees from the shaft
    pub arrow_angle: f64,
}

impl StrokeStyle {
    /// Sets color, width, and round caps/joins on the context.
    pub fn apply(&self, ctx: &cairo::Context) {
        ctx.set_source_rgba(self.color.r, self.color.g, self.color.b, self.color.a);
        ctx.set_line_width(self.line_width);
        ctx.set_line_cap(cairo::LineCap::Round);
        ctx.set_line_join(cairo::LineJoin::Round);
    }
}

/// Stroke a single straight segment; the pen tool calls this per motion.
pub fn stroke_segment(
    ctx: &cairo::Context,
    from: (f64, f64),
    to: (f64, f64),
    style: &StrokeStyle,
) -> Result<(), cairo::Error> {
    style.apply(ctx);
    ctx.new_path();
    ctx.move_to(from.0, from.1);
    ctx.line_to(to.0, to.1);
    ctx.stroke()
}

/// Stroke an axis-aligned rectangle outline. Negative sizes extend left/up.
pub fn stroke_rect(
    ctx: &cairo::Context,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    style: &StrokeStyle,
) -> Result<(), cairo::Error> {
    style.apply(ctx);
    ctx.new_path();
    ctx.rectangle(x, y, width, height);
    ctx.stroke()
}

/// Stroke a full circle outline.
pub fn stroke_circle(
    ctx: &cairo::Context,
    center: (f64, f64),
    radius: f64,
    style: &StrokeStyle,
) -> Result<(), cairo::Error> {
    style.apply(ctx);
    ctx.new_path();
    ctx.arc(center.0, center.1, radius, 0.0, std::f64::consts::TAU);
    ctx.stroke()
}

/// Stroke an arrow: shaft from `from` to `to` plus a two-segment head at `to`.
pub fn stroke_arrow(
    ctx: &cairo::Context,
    from: (f64, f64),
    to: (f64, f64),
    style: &StrokeStyle,
) -> Result<(), cairo::Error> {
    let [left, right] = util::arrowhead_points(from, to, style.arrow_length, style.arrow_angle);

    style.apply(ctx);
    ctx.new_path();
    ctx.move_to(from.0, from.1);
    ctx.line_to(to.0, to.1);
    ctx.line_to(left.0, left.1);
    ctx.move_to(to.0, to.1);
    ctx.line_to(right.0, right.1);
    ctx.stroke()
}
