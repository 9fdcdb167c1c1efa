//! Raster drawing primitives (Cairo-based).
//!
//! This module defines the pixel-level pieces of an overlay surface:
//! - [`Canvas`]: density-aware Cairo image surface with snapshot/restore
//! - [`RasterHistory`]: undo/redo timeline of full-canvas [`Snapshot`]s
//! - [`PendingStroke`]: live preview of an in-progress gesture
//! - Stroke primitives for pen, rectangle, circle, and arrow

pub mod canvas;
pub mod color;
pub mod history;
pub mod preview;
pub mod render;

pub use canvas::{Canvas, CanvasError, Snapshot};
pub use color::{Color, ColorParseError};
pub use history::RasterHistory;
pub use preview::{PendingStroke, render_shape};
pub use render::StrokeStyle;

#[allow(unused_imports)]
pub use color::{BLACK, BLUE, GREEN, ORANGE, PINK, RED, WHITE, YELLOW};
