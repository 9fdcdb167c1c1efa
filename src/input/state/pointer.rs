use crate::draw::PendingStroke;
use crate::input::events::{MouseButton, PointerEvent};
use crate::router::RouterMessage;
use log::{debug, warn};

use super::{DrawingState, SurfaceController};

impl SurfaceController {
    /// Processes one pointer event in logical coordinates.
    ///
    /// # Behavior
    /// - Cursor tool: every event is ignored (the surface is click-through)
    /// - Left press while Idle: captures the preview base and starts a gesture
    /// - Right press while Drawing: abandons the gesture
    /// - Motion while Drawing: re-renders the preview
    /// - Left release or leave while Drawing: commits the rendered pixels
    pub fn on_pointer(&mut self, event: PointerEvent) {
        if !self.current_tool.draws() {
            return;
        }

        match event {
            PointerEvent::Press {
                button: MouseButton::Left,
                x,
                y,
            } => self.begin_stroke((x, y)),
            PointerEvent::Press {
                button: MouseButton::Right,
                ..
            } => self.cancel_stroke(),
            PointerEvent::Motion { x, y } => self.update_stroke((x, y)),
            PointerEvent::Release {
                button: MouseButton::Left,
                ..
            }
            | PointerEvent::Leave => self.finish_stroke(),
            PointerEvent::Press { .. } | PointerEvent::Release { .. } => {}
        }
    }

    fn begin_stroke(&mut self, anchor: (f64, f64)) {
        if self.is_drawing() {
            return;
        }
        match PendingStroke::begin(&mut self.canvas, self.current_tool, anchor) {
            Ok(stroke) => {
                debug!(
                    "{}: {} stroke started at ({:.1}, {:.1})",
                    self.display.id, self.current_tool, anchor.0, anchor.1
                );
                self.state = DrawingState::Drawing(stroke);
            }
            Err(err) => warn!("{}: cannot start stroke: {err}", self.display.id),
        }
    }

    fn update_stroke(&mut self, point: (f64, f64)) {
        let style = self.style();
        if let DrawingState::Drawing(stroke) = &mut self.state {
            let result = stroke.update(&mut self.canvas, point, &style);
            self.needs_redraw = true;
            self.log_canvas_error("preview", result);
        }
    }

    /// Ends the current gesture, keeping whatever the preview last rendered.
    ///
    /// Emits `stroke-added` so the router marks this surface last-active.
    pub(super) fn finish_stroke(&mut self) {
        let DrawingState::Drawing(stroke) = std::mem::replace(&mut self.state, DrawingState::Idle)
        else {
            return;
        };
        debug!("{}: {} stroke finished", self.display.id, stroke.tool());

        let result = self.commit_snapshot();
        self.log_canvas_error("commit stroke", result);
        self.needs_redraw = true;

        if self
            .router
            .send(RouterMessage::StrokeAdded(self.display.id))
            .is_err()
        {
            debug!("{}: router gone, stroke-added dropped", self.display.id);
        }
    }

    /// Abandons the current gesture and restores the canvas it started from.
    pub(super) fn cancel_stroke(&mut self) {
        if let DrawingState::Drawing(stroke) = std::mem::replace(&mut self.state, DrawingState::Idle)
        {
            debug!("{}: {} stroke cancelled", self.display.id, stroke.tool());
            let result = stroke.discard(&mut self.canvas);
            self.log_canvas_error("discard stroke", result);
            self.needs_redraw = true;
        }
    }
}
