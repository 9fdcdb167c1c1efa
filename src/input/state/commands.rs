use crate::backend::{CursorIcon, DisplayInfo};
use crate::draw::Color;
use crate::input::{events::Key, modifiers::Modifiers, tool::Tool};
use crate::router::{RouterMessage, SurfaceCommand};
use log::{debug, warn};

use super::SurfaceController;

impl SurfaceController {
    /// Applies a command delivered by the router.
    pub fn apply_command(&mut self, command: SurfaceCommand) {
        debug!("{}: {:?}", self.display.id, command);
        match command {
            SurfaceCommand::ToolChange(tool) => self.set_tool(tool),
            SurfaceCommand::ColorChange(color) => self.set_color(color),
            SurfaceCommand::Clear => self.clear(),
            SurfaceCommand::Undo => self.undo(),
            SurfaceCommand::Redo => self.redo(),
        }
    }

    /// Switches the active tool and the window's input mode.
    ///
    /// Applied unconditionally, even when the tool is unchanged. A gesture in
    /// progress keeps the tool it started with, unless the new tool is the
    /// cursor, in which case the gesture is discarded.
    pub fn set_tool(&mut self, tool: Tool) {
        if !tool.draws() {
            self.cancel_stroke();
        }
        self.current_tool = tool;

        let icon = if tool.draws() {
            CursorIcon::Crosshair
        } else {
            CursorIcon::Default
        };
        self.window.set_cursor_icon(icon);
        self.window.set_click_through(!tool.draws());
    }

    /// Sets stroke and fill color for subsequent draws; existing pixels keep theirs.
    pub fn set_color(&mut self, color: Color) {
        self.stroke_color = color;
        self.fill_color = color;
    }

    /// Erases the canvas and records the blank state as an undoable entry.
    pub fn clear(&mut self) {
        self.cancel_stroke();
        let result = self
            .canvas
            .clear()
            .and_then(|()| self.commit_snapshot());
        self.log_canvas_error("clear", result);
        self.needs_redraw = true;
    }

    /// Steps back one history entry; a no-op at the oldest entry.
    pub fn undo(&mut self) {
        self.cancel_stroke();
        let Some(snapshot) = self.history.undo() else {
            debug!("{}: nothing to undo", self.display.id);
            return;
        };
        let result = self.canvas.restore(snapshot);
        self.log_canvas_error("undo", result);
        self.needs_redraw = true;
    }

    /// Steps forward one history entry; a no-op at the newest entry.
    pub fn redo(&mut self) {
        self.cancel_stroke();
        let Some(snapshot) = self.history.redo() else {
            debug!("{}: nothing to redo", self.display.id);
            return;
        };
        let result = self.canvas.restore(snapshot);
        self.log_canvas_error("redo", result);
        self.needs_redraw = true;
    }

    /// Adapts the backing store to new display geometry.
    ///
    /// A gesture in progress is committed first. Drawn content is kept and
    /// stretched to the new size; history entries are left as captured and
    /// get rescaled when restored.
    pub fn resize(&mut self, display: DisplayInfo) {
        if display.id != self.display.id {
            warn!(
                "{}: ignoring resize addressed to {}",
                self.display.id, display.id
            );
            return;
        }
        self.finish_stroke();

        match self
            .canvas
            .resize(display.width, display.height, display.scale)
        {
            Ok(()) => {
                debug!(
                    "{}: resized to {}x{} scale {}",
                    self.display.id, display.width, display.height, display.scale
                );
                self.display = display;
                self.needs_redraw = true;
            }
            Err(err) => warn!("{}: resize failed: {err}", self.display.id),
        }
    }

    /// Forwards a key press to the router, which owns the keybindings.
    pub fn on_key_down(&mut self, key: Key, modifiers: Modifiers) {
        let message = RouterMessage::KeyDown {
            origin: Some(self.display.id),
            key,
            modifiers,
        };
        if self.router.send(message).is_err() {
            debug!("{}: router gone, key {key} dropped", self.display.id);
        }
    }
}
