//! Multi-monitor screen annotation overlay.
//!
//! One transparent drawing surface per display, each with its own raster
//! undo history, coordinated by a router that a floating palette drives.
//! Window hosts plug in through [`backend::SurfaceWindow`]; the crate ships a
//! headless host that plays event scripts against real Cairo canvases.

pub mod backend;
pub mod config;
pub mod draw;
pub mod input;
pub mod palette;
pub mod router;
pub mod util;

pub use backend::{HeadlessSession, ScriptError, run_script};
pub use config::Config;
