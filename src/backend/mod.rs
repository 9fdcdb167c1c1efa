//! Window-host seam between overlay surfaces and the platform.
//!
//! Creating borderless, transparent, always-on-top windows is the host's job;
//! the core only needs to toggle pointer pass-through, pick a cursor icon,
//! and hand finished frames back. [`headless`] implements the host against
//! plain Cairo image surfaces driven by an event script.

use crate::config::DisplayConfig;
use crate::draw::{Canvas, CanvasError};
use crate::router::SurfaceId;

pub mod headless;

pub use headless::{HeadlessSession, HeadlessWindow, ScriptCommand, ScriptError, run_script};

/// Geometry of one physical display, and therefore of its overlay surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayInfo {
    /// Stable surface identity
    pub id: SurfaceId,
    /// Left edge in the global desktop layout
    pub x: i32,
    /// Top edge in the global desktop layout
    pub y: i32,
    /// Logical width
    pub width: u32,
    /// Logical height
    pub height: u32,
    /// Device pixel ratio
    pub scale: f64,
}

impl From<&DisplayConfig> for DisplayInfo {
    fn from(config: &DisplayConfig) -> Self {
        Self {
            id: SurfaceId(config.id),
            x: config.x,
            y: config.y,
            width: config.width,
            height: config.height,
            scale: config.scale,
        }
    }
}

/// Pointer icon shown over an overlay surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorIcon {
    /// System arrow (cursor tool, surface is click-through)
    Default,
    /// Drawing tools
    Crosshair,
}

/// Capabilities an overlay window exposes to its surface controller.
///
/// Implementations are moved onto the surface's own thread, so they must be
/// `Send`; they are never shared between surfaces.
pub trait SurfaceWindow: Send {
    /// Forward pointer events to whatever is beneath the overlay when `enabled`.
    fn set_click_through(&mut self, enabled: bool);

    /// Update the pointer icon.
    fn set_cursor_icon(&mut self, icon: CursorIcon);

    /// Show the current canvas contents.
    fn present(&mut self, _canvas: &Canvas) -> Result<(), CanvasError> {
        Ok(())
    }

    /// Called once when the surface is torn down.
    fn close(&mut self, _canvas: &Canvas) -> Result<(), CanvasError> {
        Ok(())
    }
}
