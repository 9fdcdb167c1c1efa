//! Surface and router threads.
//!
//! Every overlay surface runs on its own thread and owns its canvas there;
//! the router runs on another. They talk only through unbounded channels, so
//! no sender ever blocks.

use super::messages::{RouterMessage, SurfaceId, SurfaceMessage};
use super::registry::{RouteError, RouterFlow, SurfaceRegistry};
use crate::backend::{DisplayInfo, SurfaceWindow};
use crate::input::{SurfaceController, SurfaceSettings};
use log::{debug, error, info, warn};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// The router's end of one surface: its inbox and its thread.
///
/// Dropping the handle shuts the surface down and waits for its thread.
pub struct SurfaceHandle {
    id: SurfaceId,
    tx: UnboundedSender<SurfaceMessage>,
    thread: Option<JoinHandle<()>>,
}

impl SurfaceHandle {
    /// Wraps an inbox that something other than a surface thread consumes.
    pub fn detached(id: SurfaceId, tx: UnboundedSender<SurfaceMessage>) -> Self {
        Self {
            id,
            tx,
            thread: None,
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// A sender for window-host events (pointer, keys, resize).
    pub fn sender(&self) -> UnboundedSender<SurfaceMessage> {
        self.tx.clone()
    }

    /// Queues `message`; fails once the surface thread has exited.
    pub fn send(&self, message: SurfaceMessage) -> Result<(), RouteError> {
        self.tx
            .send(message)
            .map_err(|_| RouteError::SurfaceGone(self.id))
    }

    /// Asks the surface to tear down and waits for it.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.tx.send(SurfaceMessage::Shutdown);
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            error!("{} thread panicked", self.id);
        }
    }
}

impl Drop for SurfaceHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Starts a surface thread for `display`.
///
/// The canvas is created on the new thread. If that fails, the error is
/// logged and the thread exits; the router notices on its next send.
pub fn spawn_surface(
    display: DisplayInfo,
    settings: SurfaceSettings,
    window: Box<dyn SurfaceWindow>,
    router: UnboundedSender<RouterMessage>,
) -> Result<SurfaceHandle, RouteError> {
    let (tx, inbox) = mpsc::unbounded_channel();
    let id = display.id;

    let thread = thread::Builder::new()
        .name(id.to_string())
        .spawn(move || run_surface(display, settings, window, router, inbox))
        .map_err(|source| RouteError::Spawn {
            name: id.to_string(),
            source,
        })?;

    Ok(SurfaceHandle {
        id,
        tx,
        thread: Some(thread),
    })
}

fn run_surface(
    display: DisplayInfo,
    settings: SurfaceSettings,
    window: Box<dyn SurfaceWindow>,
    router: UnboundedSender<RouterMessage>,
    mut inbox: UnboundedReceiver<SurfaceMessage>,
) {
    let mut surface = match SurfaceController::new(display, settings, window, router) {
        Ok(surface) => surface,
        Err(err) => {
            error!("{}: failed to create surface: {err}", display.id);
            return;
        }
    };
    surface.present();

    while let Some(message) = inbox.blocking_recv() {
        match message {
            SurfaceMessage::Command(command) => surface.apply_command(command),
            SurfaceMessage::Pointer(event) => surface.on_pointer(event),
            SurfaceMessage::KeyDown { key, modifiers } => surface.on_key_down(key, modifiers),
            SurfaceMessage::Resize(display) => surface.resize(display),
            SurfaceMessage::Sync(ack) => {
                surface.present();
                let _ = ack.send(());
                continue;
            }
            SurfaceMessage::Report(reply) => {
                match surface.report() {
                    Ok(report) => {
                        let _ = reply.send(report);
                    }
                    Err(err) => warn!("{}: cannot report state: {err}", surface.id()),
                }
                continue;
            }
            SurfaceMessage::Shutdown => break,
        }
        surface.present();
    }

    surface.close();
}

/// Starts the router thread.
///
/// The thread owns `registry` and consumes `inbox` until a quit is routed or
/// every sender is gone, then shuts all surfaces down.
pub fn spawn_router(
    mut registry: SurfaceRegistry,
    mut inbox: UnboundedReceiver<RouterMessage>,
) -> Result<JoinHandle<()>, RouteError> {
    thread::Builder::new()
        .name("router".to_string())
        .spawn(move || {
            info!("Router started with {} surface(s)", registry.len());
            while let Some(message) = inbox.blocking_recv() {
                debug!("Router received {:?}", message);
                if registry.handle(message) == RouterFlow::Quit {
                    info!("Quit requested");
                    break;
                }
            }
            registry.shutdown();
            info!("Router stopped");
        })
        .map_err(|source| RouteError::Spawn {
            name: "router".to_string(),
            source,
        })
}
