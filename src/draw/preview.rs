//! Live preview of an in-progress stroke.
//!
//! Shapes (rect, circle, arrow) are re-rendered from a fixed base snapshot on
//! every pointer motion so intermediate frames never accumulate. The pen is
//! the exception: it paints segments straight onto the canvas as the pointer
//! moves.

use super::canvas::{Canvas, CanvasError, Snapshot};
use super::render::{self, StrokeStyle};
use crate::input::Tool;
use crate::util;

/// Gesture state held between pointer-down and pointer-up.
///
/// Never part of history; the rendered result is committed by the caller
/// when the gesture ends.
#[derive(Debug)]
pub struct PendingStroke {
    tool: Tool,
    anchor: (f64, f64),
    last: (f64, f64),
    base: Snapshot,
}

impl PendingStroke {
    /// Captures the current canvas as the preview base and opens the gesture.
    pub fn begin(canvas: &mut Canvas, tool: Tool, anchor: (f64, f64)) -> Result<Self, CanvasError> {
        let base = canvas.snapshot()?;
        Ok(Self {
            tool,
            anchor,
            last: anchor,
            base,
        })
    }

    /// Tool fixed at pointer-down.
    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Most recent pointer position seen by [`PendingStroke::update`].
    pub fn last_point(&self) -> (f64, f64) {
        self.last
    }

    /// Renders the preview for the pointer at `point`.
    pub fn update(
        &mut self,
        canvas: &mut Canvas,
        point: (f64, f64),
        style: &StrokeStyle,
    ) -> Result<(), CanvasError> {
        match self.tool {
            Tool::Cursor => {}
            Tool::Pen => {
                let from = self.last;
                canvas.draw(|ctx| render::stroke_segment(ctx, from, point, style))?;
            }
            shape => {
                canvas.restore(&self.base)?;
                let anchor = self.anchor;
                canvas.draw(|ctx| render_shape(ctx, shape, anchor, point, style))?;
            }
        }
        self.last = point;
        Ok(())
    }

    /// Abandons the gesture, putting the base snapshot back on the canvas.
    pub fn discard(self, canvas: &mut Canvas) -> Result<(), CanvasError> {
        canvas.restore(&self.base)
    }
}

/// Draws the finished geometry of `tool` spanning `anchor` → `current`.
///
/// `Pen` and `Cursor` have no parametric shape and draw nothing here.
pub fn render_shape(
    ctx: &cairo::Context,
    tool: Tool,
    anchor: (f64, f64),
    current: (f64, f64),
    style: &StrokeStyle,
) -> Result<(), cairo::Error> {
    match tool {
        Tool::Rect => {
            let (x, y, w, h) = util::rect_extent(anchor, current);
            render::stroke_rect(ctx, x, y, w, h, style)
        }
        Tool::Circle => render::stroke_circle(ctx, anchor, util::distance(anchor, current), style),
        Tool::Arrow => render::stroke_arrow(ctx, anchor, current, style),
        Tool::Pen | Tool::Cursor => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::color::RED;

    fn style() -> StrokeStyle {
        StrokeStyle {
            color: RED,
            line_width: 2.0,
            arrow_length: 15.0,
            arrow_angle: 30.0,
        }
    }

    fn alpha(canvas: &mut Canvas, x: i32, y: i32) -> u32 {
        canvas.pixel(x, y).unwrap().unwrap() >> 24
    }

    #[test]
    fn rect_preview_does_not_accumulate() {
        let mut canvas = Canvas::new(100, 100, 1.0).unwrap();
        let mut stroke = PendingStroke::begin(&mut canvas, Tool::Rect, (10.0, 10.0)).unwrap();

        stroke.update(&mut canvas, (80.0, 80.0), &style()).unwrap();
        assert!(alpha(&mut canvas, 80, 45) > 0);

        stroke.update(&mut canvas, (40.0, 40.0), &style()).unwrap();
        assert_eq!(alpha(&mut canvas, 80, 45), 0, "stale preview frame leaked");
        assert!(alpha(&mut canvas, 40, 25) > 0);
    }

    #[test]
    fn rect_supports_negative_extent() {
        let mut canvas = Canvas::new(100, 100, 1.0).unwrap();
        let mut stroke = PendingStroke::begin(&mut canvas, Tool::Rect, (80.0, 80.0)).unwrap();
        stroke.update(&mut canvas, (20.0, 20.0), &style()).unwrap();

        assert!(alpha(&mut canvas, 20, 50) > 0);
        assert!(alpha(&mut canvas, 50, 80) > 0);
        assert_eq!(alpha(&mut canvas, 50, 50), 0);
    }

    #[test]
    fn pen_accumulates_segments() {
        let mut canvas = Canvas::new(100, 100, 1.0).unwrap();
        let mut stroke = PendingStroke::begin(&mut canvas, Tool::Pen, (10.0, 10.0)).unwrap();

        stroke.update(&mut canvas, (50.0, 10.0), &style()).unwrap();
        stroke.update(&mut canvas, (50.0, 60.0), &style()).unwrap();

        assert!(alpha(&mut canvas, 30, 10) > 0, "first segment was erased");
        assert!(alpha(&mut canvas, 50, 35) > 0);
        assert_eq!(stroke.last_point(), (50.0, 60.0));
    }

    #[test]
    fn circle_radius_is_distance_to_pointer() {
        let mut canvas = Canvas::new(100, 100, 1.0).unwrap();
        let mut stroke = PendingStroke::begin(&mut canvas, Tool::Circle, (50.0, 50.0)).unwrap();
        stroke.update(&mut canvas, (68.0, 74.0), &style()).unwrap();

        // Radius 30 from (50, 50): the outline crosses (50, 20) and (20, 50).
        assert!(alpha(&mut canvas, 50, 20) > 0);
        assert!(alpha(&mut canvas, 20, 50) > 0);
        assert_eq!(alpha(&mut canvas, 50, 50), 0);
        assert_eq!(alpha(&mut canvas, 50, 35), 0);
    }

    #[test]
    fn arrowhead_scales_with_pixel_density() {
        let mut canvas = Canvas::new(200, 100, 2.0).unwrap();
        let mut stroke = PendingStroke::begin(&mut canvas, Tool::Arrow, (0.0, 50.0)).unwrap();
        stroke.update(&mut canvas, (100.0, 50.0), &style()).unwrap();

        // Head endpoints sit at logical (87.0, 57.5) and (87.0, 42.5), i.e.
        // 30 backing pixels away from the tip at density 2.
        let [left, right] = util::arrowhead_points((0.0, 50.0), (100.0, 50.0), 15.0, 30.0);
        for (x, y) in [left, right] {
            let bx = (x * 2.0).round() as i32;
            let by = (y * 2.0).round() as i32;
            assert!(alpha(&mut canvas, bx, by) > 0, "missing head at {bx},{by}");
        }
        // Shaft midpoint.
        assert!(alpha(&mut canvas, 100, 100) > 0);
        // Beyond the head's reach.
        assert_eq!(alpha(&mut canvas, 120, 60), 0);
    }

    #[test]
    fn discard_restores_base() {
        let mut canvas = Canvas::new(50, 50, 1.0).unwrap();
        let before = canvas.snapshot().unwrap();
        let mut stroke = PendingStroke::begin(&mut canvas, Tool::Arrow, (5.0, 5.0)).unwrap();
        stroke.update(&mut canvas, (45.0, 45.0), &style()).unwrap();
        assert_ne!(canvas.snapshot().unwrap(), before);

        stroke.discard(&mut canvas).unwrap();
        assert_eq!(canvas.snapshot().unwrap(), before);
    }
}
