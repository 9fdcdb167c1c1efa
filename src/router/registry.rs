//! Surface registry and command routing.

use super::messages::{
    Action, PaletteEvent, RouterMessage, SurfaceCommand, SurfaceId, SurfaceMessage,
};
use super::service::SurfaceHandle;
use crate::config::{KeyBinding, Shortcut, resolve_shortcut};
use crate::draw::Color;
use crate::input::{Key, Modifiers, Tool};
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tokio::sync::{mpsc::UnboundedSender, oneshot};

/// Routing failures.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("{0} is no longer running")]
    SurfaceGone(SurfaceId),

    #[error("router is no longer running")]
    RouterClosed,

    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Whether the router keeps running after a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterFlow {
    Continue,
    Quit,
}

/// Every live surface plus the routing state shared between them.
///
/// Owned by the router thread. Commands are fire-and-forget: a surface whose
/// inbox is closed is dropped from the registry on the first failed send.
pub struct SurfaceRegistry {
    surfaces: BTreeMap<SurfaceId, SurfaceHandle>,
    /// Surface that committed the most recent stroke
    last_active: Option<SurfaceId>,
    palette: Option<UnboundedSender<PaletteEvent>>,
    shortcuts: HashMap<KeyBinding, Shortcut>,
    current_tool: Tool,
    current_color: Option<Color>,
}

impl SurfaceRegistry {
    pub fn new(shortcuts: HashMap<KeyBinding, Shortcut>) -> Self {
        Self {
            surfaces: BTreeMap::new(),
            last_active: None,
            palette: None,
            shortcuts,
            current_tool: Tool::Cursor,
            current_color: None,
        }
    }

    /// Sets where tool changes are mirrored for highlighting.
    pub fn set_palette(&mut self, palette: UnboundedSender<PaletteEvent>) {
        self.palette = Some(palette);
    }

    /// Adds a surface, bringing it up to the session's tool and color.
    ///
    /// Replaces (and shuts down) any surface already registered under the same id.
    /// A surface whose inbox is already closed is not registered.
    pub fn register(&mut self, handle: SurfaceHandle) {
        let id = handle.id();
        let mut catch_up = Vec::new();
        if self.current_tool != Tool::Cursor {
            catch_up.push(SurfaceCommand::ToolChange(self.current_tool));
        }
        if let Some(color) = self.current_color {
            catch_up.push(SurfaceCommand::ColorChange(color));
        }
        if catch_up
            .into_iter()
            .any(|command| handle.send(SurfaceMessage::Command(command)).is_err())
        {
            warn!("{id} stopped responding before registration; skipping it");
            return;
        }
        if self.surfaces.insert(id, handle).is_some() {
            warn!("{id} registered twice; replaced the previous surface");
        }
        info!("{id} registered");
    }

    /// Removes a surface, clearing the last-active marker if it pointed there.
    pub fn unregister(&mut self, id: SurfaceId) -> Option<SurfaceHandle> {
        if self.last_active == Some(id) {
            self.last_active = None;
        }
        let handle = self.surfaces.remove(&id);
        if handle.is_some() {
            info!("{id} unregistered");
        }
        handle
    }

    pub fn surface_ids(&self) -> Vec<SurfaceId> {
        self.surfaces.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn last_active(&self) -> Option<SurfaceId> {
        self.last_active
    }

    pub fn current_tool(&self) -> Tool {
        self.current_tool
    }

    /// Applies one router inbox message.
    pub fn handle(&mut self, message: RouterMessage) -> RouterFlow {
        match message {
            RouterMessage::ToolChange(tool) => self.broadcast_tool_change(tool),
            RouterMessage::ColorChange(color) => self.broadcast_color_change(color),
            RouterMessage::Action(action) => return self.route_action(action),
            RouterMessage::StrokeAdded(id) => self.stroke_added(id),
            RouterMessage::KeyDown {
                origin,
                key,
                modifiers,
            } => return self.key_down(origin, key, modifiers),
            RouterMessage::Sync(ack) => self.sync(ack),
        }
        RouterFlow::Continue
    }

    /// Sends `tool` to every surface and mirrors it to the palette.
    pub fn broadcast_tool_change(&mut self, tool: Tool) {
        debug!("Broadcasting tool {tool}");
        self.current_tool = tool;
        self.broadcast(SurfaceCommand::ToolChange(tool));

        let palette_gone = self
            .palette
            .as_ref()
            .is_some_and(|palette| palette.send(PaletteEvent::ToolChanged(tool)).is_err());
        if palette_gone {
            debug!("Palette gone; dropping its channel");
            self.palette = None;
        }
    }

    /// Sends `color` to every surface; the palette already shows its own pick.
    pub fn broadcast_color_change(&mut self, color: Color) {
        debug!("Broadcasting color {color}");
        self.current_color = Some(color);
        self.broadcast(SurfaceCommand::ColorChange(color));
    }

    /// Routes a palette action.
    ///
    /// Undo and redo target the last-active surface when it is still
    /// registered and fall back to every surface otherwise.
    pub fn route_action(&mut self, action: Action) -> RouterFlow {
        match action {
            Action::Quit => return RouterFlow::Quit,
            Action::Clear => self.broadcast(SurfaceCommand::Clear),
            Action::Undo => self.route_history(SurfaceCommand::Undo),
            Action::Redo => self.route_history(SurfaceCommand::Redo),
        }
        RouterFlow::Continue
    }

    /// Records `id` as the last-active surface; the latest stroke wins.
    pub fn stroke_added(&mut self, id: SurfaceId) {
        if !self.surfaces.contains_key(&id) {
            debug!("Ignoring stroke-added from unknown {id}");
            return;
        }
        debug!("{id} is now last-active");
        self.last_active = Some(id);
    }

    /// Resolves a key press against the shortcut map.
    pub fn key_down(
        &mut self,
        origin: Option<SurfaceId>,
        key: Key,
        modifiers: Modifiers,
    ) -> RouterFlow {
        let Some(shortcut) = resolve_shortcut(&self.shortcuts, &key, modifiers) else {
            debug!("Unbound key {key} from {origin:?}");
            return RouterFlow::Continue;
        };
        debug!("Key {key} from {origin:?} -> {shortcut:?}");

        match shortcut {
            Shortcut::ClearAndRelease => {
                self.broadcast(SurfaceCommand::Clear);
                self.broadcast_tool_change(Tool::Cursor);
                RouterFlow::Continue
            }
            Shortcut::Undo => self.route_action(Action::Undo),
            Shortcut::Redo => self.route_action(Action::Redo),
            Shortcut::Quit => self.route_action(Action::Quit),
            Shortcut::SelectTool(tool) => {
                self.broadcast_tool_change(tool);
                RouterFlow::Continue
            }
        }
    }

    /// Acknowledges `ack` once every surface has applied all earlier messages.
    pub fn sync(&mut self, ack: oneshot::Sender<()>) {
        let mut pending = Vec::with_capacity(self.surfaces.len());
        let mut dead = Vec::new();

        for (id, handle) in &self.surfaces {
            let (tx, rx) = oneshot::channel();
            match handle.send(SurfaceMessage::Sync(tx)) {
                Ok(()) => pending.push((*id, rx)),
                Err(_) => dead.push(*id),
            }
        }
        for (id, rx) in pending {
            if rx.blocking_recv().is_err() {
                dead.push(id);
            }
        }
        self.drop_dead(dead);
        let _ = ack.send(());
    }

    /// Shuts every surface down and waits for their threads.
    pub fn shutdown(&mut self) {
        let surfaces = std::mem::take(&mut self.surfaces);
        self.last_active = None;
        for (id, handle) in surfaces {
            debug!("Shutting down {id}");
            handle.shutdown();
        }
    }

    fn route_history(&mut self, command: SurfaceCommand) {
        match self.last_active {
            Some(id) if self.surfaces.contains_key(&id) => {
                debug!("Routing {command:?} to last-active {id}");
                if self.send_to(id, command).is_err() {
                    self.drop_dead(vec![id]);
                    debug!("Last-active {id} gone; broadcasting {command:?}");
                    self.broadcast(command);
                }
            }
            _ => {
                debug!("No last-active surface; broadcasting {command:?}");
                self.broadcast(command);
            }
        }
    }

    fn send_to(&self, id: SurfaceId, command: SurfaceCommand) -> Result<(), RouteError> {
        self.surfaces
            .get(&id)
            .ok_or(RouteError::SurfaceGone(id))?
            .send(SurfaceMessage::Command(command))
    }

    fn broadcast(&mut self, command: SurfaceCommand) {
        let dead: Vec<SurfaceId> = self
            .surfaces
            .values()
            .filter(|handle| handle.send(SurfaceMessage::Command(command)).is_err())
            .map(SurfaceHandle::id)
            .collect();
        self.drop_dead(dead);
    }

    fn drop_dead(&mut self, dead: Vec<SurfaceId>) {
        for id in dead {
            warn!("{id} stopped responding; removing it");
            self.unregister(id);
        }
    }
}
