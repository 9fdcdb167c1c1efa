mod commands;
mod core;
mod pointer;

pub use core::{DrawingState, SurfaceController, SurfaceSettings};
