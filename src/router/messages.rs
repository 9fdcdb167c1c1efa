//! Messages exchanged between the palette, the router, and overlay surfaces.

use crate::backend::DisplayInfo;
use crate::draw::{Color, Snapshot};
use crate::input::{Key, Modifiers, PointerEvent, Tool};
use std::fmt;
use std::str::FromStr;
use tokio::sync::oneshot;

/// Identity of one overlay surface (one per display).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfaceId(pub u32);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface-{}", self.0)
    }
}

/// Commands the router delivers to a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceCommand {
    /// `tool-change`
    ToolChange(Tool),
    /// `color-change`
    ColorChange(Color),
    /// `clear`
    Clear,
    /// `undo`
    Undo,
    /// `redo`
    Redo,
}

/// Everything a surface's inbox can carry.
///
/// A surface consumes its inbox in order, which is what serializes its own
/// input against routed commands.
#[derive(Debug)]
pub enum SurfaceMessage {
    /// Routed command from the router
    Command(SurfaceCommand),
    /// Pointer input from the window host
    Pointer(PointerEvent),
    /// Key press from the window host
    KeyDown { key: Key, modifiers: Modifiers },
    /// Display geometry changed
    Resize(DisplayInfo),
    /// Acknowledge once every earlier message has been applied
    Sync(oneshot::Sender<()>),
    /// Reply with the surface's current state
    Report(oneshot::Sender<SurfaceReport>),
    /// Tear the surface down
    Shutdown,
}

/// Point-in-time view of one surface, for inspection and scripted runs.
#[derive(Debug, Clone)]
pub struct SurfaceReport {
    pub id: SurfaceId,
    pub tool: Tool,
    pub color: Color,
    /// Whether the window lets pointer events through
    pub click_through: bool,
    /// A gesture is in progress
    pub drawing: bool,
    pub history_index: usize,
    pub history_len: usize,
    /// Current backing pixels
    pub pixels: Snapshot,
}

impl fmt::Display for SurfaceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tool={} color={} entries={} index={} blank={}",
            self.id,
            self.tool,
            self.color,
            self.history_len,
            self.history_index,
            self.pixels.is_blank()
        )
    }
}

/// Palette `action` payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    Undo,
    Redo,
    Clear,
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quit" => Ok(Action::Quit),
            "undo" => Ok(Action::Undo),
            "redo" => Ok(Action::Redo),
            "clear" => Ok(Action::Clear),
            other => Err(format!("unknown action '{other}'")),
        }
    }
}

/// Router inbox.
#[derive(Debug)]
pub enum RouterMessage {
    /// Palette picked a tool (or a shortcut did)
    ToolChange(Tool),
    /// Palette picked a color
    ColorChange(Color),
    /// Palette button
    Action(Action),
    /// `stroke-added`: the sender committed a stroke
    StrokeAdded(SurfaceId),
    /// Key press on a surface (`Some`) or on the palette (`None`)
    KeyDown {
        origin: Option<SurfaceId>,
        key: Key,
        modifiers: Modifiers,
    },
    /// Acknowledge once every surface has drained its inbox
    Sync(oneshot::Sender<()>),
}

/// Notifications the router pushes to the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteEvent {
    /// Highlight this tool
    ToolChanged(Tool),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_actions() {
        assert_eq!("undo".parse::<Action>(), Ok(Action::Undo));
        assert_eq!(" Quit ".parse::<Action>(), Ok(Action::Quit));
        assert!("save".parse::<Action>().is_err());
    }
}
