//! Input handling and the per-surface drawing state machine.
//!
//! Window hosts translate native pointer and keyboard events into the generic
//! types in [`events`]; [`SurfaceController`] turns them (and routed commands)
//! into canvas and history updates.

pub mod events;
pub mod modifiers;
pub mod state;
pub mod tool;

// Re-export commonly used types at module level
pub use events::{Key, MouseButton, PointerEvent};
pub use modifiers::Modifiers;
pub use state::{DrawingState, SurfaceController, SurfaceSettings};
pub use tool::Tool;
