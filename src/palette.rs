//! Floating tool palette state.
//!
//! The palette only emits commands and mirrors what the router tells it; it
//! never talks to a surface directly.

use crate::draw::Color;
use crate::input::{Key, Modifiers, Tool};
use crate::router::{Action, PaletteEvent, RouteError, RouterMessage};
use log::debug;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Palette colors, in button order.
pub const PALETTE_COLORS: [Color; 6] = [
    crate::draw::RED,
    crate::draw::GREEN,
    crate::draw::BLUE,
    crate::draw::YELLOW,
    crate::draw::WHITE,
    crate::draw::BLACK,
];

pub struct PaletteController {
    router: UnboundedSender<RouterMessage>,
    events: UnboundedReceiver<PaletteEvent>,
    active_tool: Tool,
    active_color: Color,
}

impl PaletteController {
    pub fn new(
        router: UnboundedSender<RouterMessage>,
        events: UnboundedReceiver<PaletteEvent>,
        initial_color: Color,
    ) -> Self {
        Self {
            router,
            events,
            active_tool: Tool::Cursor,
            active_color: initial_color,
        }
    }

    /// Highlighted tool button.
    pub fn active_tool(&self) -> Tool {
        self.active_tool
    }

    /// Highlighted color swatch.
    pub fn active_color(&self) -> Color {
        self.active_color
    }

    /// Tool button clicked.
    pub fn select_tool(&mut self, tool: Tool) -> Result<(), RouteError> {
        self.active_tool = tool;
        self.send(RouterMessage::ToolChange(tool))
    }

    /// Color swatch clicked.
    pub fn select_color(&mut self, color: Color) -> Result<(), RouteError> {
        self.active_color = color;
        self.send(RouterMessage::ColorChange(color))
    }

    /// Undo, redo, clear, or quit button clicked.
    pub fn trigger(&mut self, action: Action) -> Result<(), RouteError> {
        self.send(RouterMessage::Action(action))
    }

    /// Key pressed while the palette has focus.
    pub fn on_key_down(&mut self, key: Key, modifiers: Modifiers) -> Result<(), RouteError> {
        self.send(RouterMessage::KeyDown {
            origin: None,
            key,
            modifiers,
        })
    }

    /// Applies every notification the router has pushed so far.
    ///
    /// Returns how many were applied.
    pub fn sync(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            match event {
                PaletteEvent::ToolChanged(tool) => {
                    debug!("Palette highlight -> {tool}");
                    self.active_tool = tool;
                }
            }
            applied += 1;
        }
        applied
    }

    /// Raw router sender, for collaborators such as signal handlers.
    pub fn router(&self) -> UnboundedSender<RouterMessage> {
        self.router.clone()
    }

    fn send(&self, message: RouterMessage) -> Result<(), RouteError> {
        self.router
            .send(message)
            .map_err(|_| RouteError::RouterClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::{GREEN, RED};
    use tokio::sync::mpsc;

    fn create_test_palette() -> (
        PaletteController,
        mpsc::UnboundedReceiver<RouterMessage>,
        mpsc::UnboundedSender<PaletteEvent>,
    ) {
        let (router_tx, router_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        (
            PaletteController::new(router_tx, events_rx, RED),
            router_rx,
            events_tx,
        )
    }

    #[test]
    fn test_selection_emits_commands() {
        let (mut palette, mut router_rx, _events) = create_test_palette();

        palette.select_tool(Tool::Pen).unwrap();
        palette.select_color(GREEN).unwrap();
        palette.trigger(Action::Undo).unwrap();

        assert!(matches!(
            router_rx.try_recv(),
            Ok(RouterMessage::ToolChange(Tool::Pen))
        ));
        assert!(matches!(
            router_rx.try_recv(),
            Ok(RouterMessage::ColorChange(c)) if c == GREEN
        ));
        assert!(matches!(
            router_rx.try_recv(),
            Ok(RouterMessage::Action(Action::Undo))
        ));
        assert_eq!(palette.active_tool(), Tool::Pen);
        assert_eq!(palette.active_color(), GREEN);
    }

    #[test]
    fn test_router_pushes_update_highlight() {
        let (mut palette, _router_rx, events) = create_test_palette();
        palette.select_tool(Tool::Arrow).unwrap();

        events.send(PaletteEvent::ToolChanged(Tool::Cursor)).unwrap();
        assert_eq!(palette.sync(), 1);
        assert_eq!(palette.active_tool(), Tool::Cursor);
        assert_eq!(palette.sync(), 0);
    }

    #[test]
    fn test_palette_keys_have_no_origin() {
        let (mut palette, mut router_rx, _events) = create_test_palette();
        palette.on_key_down(Key::Escape, Modifiers::new()).unwrap();

        assert!(matches!(
            router_rx.try_recv(),
            Ok(RouterMessage::KeyDown {
                origin: None,
                key: Key::Escape,
                ..
            })
        ));
    }

    #[test]
    fn test_closed_router_is_an_error() {
        let (mut palette, router_rx, _events) = create_test_palette();
        drop(router_rx);
        assert!(matches!(
            palette.trigger(Action::Clear),
            Err(RouteError::RouterClosed)
        ));
    }
}
