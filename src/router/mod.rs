//! Cross-surface coordination.
//!
//! One router thread owns the [`SurfaceRegistry`] and fans palette commands
//! out to the overlay surfaces, each of which runs on its own thread.

pub mod messages;
pub mod registry;
pub mod service;

pub use messages::{
    Action, PaletteEvent, RouterMessage, SurfaceCommand, SurfaceId, SurfaceMessage, SurfaceReport,
};
pub use registry::{RouteError, RouterFlow, SurfaceRegistry};
pub use service::{SurfaceHandle, spawn_router, spawn_surface};
