//! Drawing state machine and per-surface state.

use crate::backend::{CursorIcon, DisplayInfo, SurfaceWindow};
use crate::config::Config;
use crate::draw::{Canvas, CanvasError, Color, PendingStroke, RasterHistory, StrokeStyle};
use crate::input::tool::Tool;
use crate::router::{RouterMessage, SurfaceId, SurfaceReport};
use log::{debug, info, warn};
use tokio::sync::mpsc::UnboundedSender;

/// Current drawing mode state machine.
///
/// A surface is either idle or in the middle of exactly one gesture.
#[derive(Debug)]
pub enum DrawingState {
    /// Not actively drawing - waiting for a press
    Idle,
    /// Pointer held down with a drawing tool
    Drawing(PendingStroke),
}

/// Stroke and history parameters shared by every surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSettings {
    /// Color every surface starts with
    pub initial_color: Color,
    /// Stroke width in logical pixels
    pub line_width: f64,
    /// Arrowhead length in logical pixels
    pub arrow_length: f64,
    /// Arrowhead angle in degrees
    pub arrow_angle: f64,
    /// Snapshot cap per surface (0 = unlimited)
    pub history_limit: usize,
}

impl SurfaceSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            initial_color: config.drawing.default_color.to_color(),
            line_width: config.drawing.line_width,
            arrow_length: config.arrow.length,
            arrow_angle: config.arrow.angle_degrees,
            history_limit: config.history.max_entries,
        }
    }
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// One overlay surface: its pixels, its undo timeline, and its gesture state.
///
/// Each controller is owned by exactly one surface thread, which makes it the
/// only writer of its canvas and history.
pub struct SurfaceController {
    pub(super) display: DisplayInfo,
    pub(super) canvas: Canvas,
    pub(super) history: RasterHistory,
    pub(super) state: DrawingState,
    pub(super) current_tool: Tool,
    pub(super) stroke_color: Color,
    pub(super) fill_color: Color,
    pub(super) settings: SurfaceSettings,
    pub(super) window: Box<dyn SurfaceWindow>,
    pub(super) router: UnboundedSender<RouterMessage>,
    /// Whether the window needs the canvas presented again
    pub needs_redraw: bool,
}

impl SurfaceController {
    /// Creates a blank surface covering `display`.
    ///
    /// The blank canvas becomes the first history entry, and the surface
    /// starts on the cursor tool (click-through).
    pub fn new(
        display: DisplayInfo,
        settings: SurfaceSettings,
        mut window: Box<dyn SurfaceWindow>,
        router: UnboundedSender<RouterMessage>,
    ) -> Result<Self, CanvasError> {
        let mut canvas = Canvas::new(display.width, display.height, display.scale)?;
        let blank = canvas.snapshot()?;
        let history = RasterHistory::with_capacity_limit(blank, settings.history_limit);

        window.set_click_through(true);
        window.set_cursor_icon(CursorIcon::Default);

        info!(
            "{} ready: {}x{} at ({}, {}) scale {}",
            display.id, display.width, display.height, display.x, display.y, display.scale
        );

        Ok(Self {
            display,
            canvas,
            history,
            state: DrawingState::Idle,
            current_tool: Tool::Cursor,
            stroke_color: settings.initial_color,
            fill_color: settings.initial_color,
            settings,
            window,
            router,
            needs_redraw: true,
        })
    }

    pub fn id(&self) -> SurfaceId {
        self.display.id
    }

    pub fn display(&self) -> &DisplayInfo {
        &self.display
    }

    pub fn tool(&self) -> Tool {
        self.current_tool
    }

    pub fn stroke_color(&self) -> Color {
        self.stroke_color
    }

    pub fn fill_color(&self) -> Color {
        self.fill_color
    }

    pub fn state(&self) -> &DrawingState {
        &self.state
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, DrawingState::Drawing(_))
    }

    pub fn history(&self) -> &RasterHistory {
        &self.history
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Mutable canvas access, for pixel inspection.
    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    /// Stroke parameters for the next draw.
    pub fn style(&self) -> StrokeStyle {
        StrokeStyle {
            color: self.stroke_color,
            line_width: self.settings.line_width,
            arrow_length: self.settings.arrow_length,
            arrow_angle: self.settings.arrow_angle,
        }
    }

    /// Captures the surface's current state.
    pub fn report(&mut self) -> Result<SurfaceReport, CanvasError> {
        Ok(SurfaceReport {
            id: self.display.id,
            tool: self.current_tool,
            color: self.stroke_color,
            click_through: !self.current_tool.draws(),
            drawing: self.is_drawing(),
            history_index: self.history.index(),
            history_len: self.history.len(),
            pixels: self.canvas.snapshot()?,
        })
    }

    /// Hands the canvas to the window if anything changed since the last call.
    pub fn present(&mut self) {
        if !self.needs_redraw {
            return;
        }
        self.needs_redraw = false;
        if let Err(err) = self.window.present(&self.canvas) {
            warn!("{}: failed to present canvas: {err}", self.display.id);
        }
    }

    /// Tears the surface down, abandoning any gesture in progress.
    pub fn close(&mut self) {
        if let DrawingState::Drawing(stroke) = std::mem::replace(&mut self.state, DrawingState::Idle)
        {
            let result = stroke.discard(&mut self.canvas);
            self.log_canvas_error("discard stroke", result);
        }
        if let Err(err) = self.window.close(&self.canvas) {
            warn!("{}: failed to close window: {err}", self.display.id);
        }
        info!("{} closed", self.display.id);
    }

    /// Pushes the current canvas pixels as a new history entry.
    pub(super) fn commit_snapshot(&mut self) -> Result<(), CanvasError> {
        let snapshot = self.canvas.snapshot()?;
        self.history.push(snapshot);
        debug!(
            "{}: committed snapshot {} of {} ({} KiB retained)",
            self.display.id,
            self.history.index(),
            self.history.len(),
            self.history.retained_bytes() / 1024
        );
        Ok(())
    }

    /// Logs a canvas failure; the operation that produced it is skipped.
    pub(super) fn log_canvas_error(&self, operation: &str, result: Result<(), CanvasError>) {
        if let Err(err) = result {
            warn!("{}: {operation} failed: {err}", self.display.id);
        }
    }
}
