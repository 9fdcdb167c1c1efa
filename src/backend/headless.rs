//! Headless window host driven by a line-oriented event script.
//!
//! Each configured display gets a real surface thread and Cairo canvas; the
//! script plays the roles of the window host (pointer, keys, resize) and the
//! palette (tool, color, action). Lines look like:
//!
//! ```text
//! tool rect
//! color #22c55e
//! down 0 10 10
//! move 0 80 40
//! up 0 80 40
//! key 1 Ctrl+Z
//! resize 0 1280x720@2
//! action undo
//! ```

use super::{CursorIcon, DisplayInfo, SurfaceWindow};
use crate::config::{Config, DisplayConfig, KeyBinding};
use crate::draw::{Canvas, CanvasError, Color};
use crate::input::{Key, Modifiers, MouseButton, PointerEvent, SurfaceSettings, Tool};
use crate::palette::PaletteController;
use crate::router::{
    Action, RouteError, RouterMessage, SurfaceId, SurfaceMessage, SurfaceRegistry, SurfaceReport,
    spawn_router, spawn_surface,
};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::PathBuf;
use std::thread::JoinHandle;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::oneshot;

/// Failures while running a headless script.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("no such surface: {0}")]
    UnknownSurface(SurfaceId),

    #[error("failed to read script: {0}")]
    Io(#[from] io::Error),

    #[error("invalid keybindings: {0}")]
    Keybindings(String),

    #[error(transparent)]
    Route(#[from] RouteError),
}

/// In-memory stand-in for an overlay window.
///
/// Tracks the input mode the controller asked for and, if a dump directory
/// is set, writes the final canvas to `<dir>/surface-<id>.png` on close.
pub struct HeadlessWindow {
    id: SurfaceId,
    click_through: bool,
    cursor_icon: CursorIcon,
    frames: usize,
    dump_dir: Option<PathBuf>,
}

impl HeadlessWindow {
    pub fn new(id: SurfaceId, dump_dir: Option<PathBuf>) -> Self {
        Self {
            id,
            click_through: false,
            cursor_icon: CursorIcon::Default,
            frames: 0,
            dump_dir,
        }
    }

    pub fn click_through(&self) -> bool {
        self.click_through
    }

    pub fn cursor_icon(&self) -> CursorIcon {
        self.cursor_icon
    }

    /// Number of frames presented so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Where the final canvas is written on close, if anywhere.
    pub fn dump_path(&self) -> Option<PathBuf> {
        self.dump_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.png", self.id)))
    }
}

impl SurfaceWindow for HeadlessWindow {
    fn set_click_through(&mut self, enabled: bool) {
        if self.click_through != enabled {
            debug!("{}: click-through {}", self.id, enabled);
        }
        self.click_through = enabled;
    }

    fn set_cursor_icon(&mut self, icon: CursorIcon) {
        self.cursor_icon = icon;
    }

    fn present(&mut self, _canvas: &Canvas) -> Result<(), CanvasError> {
        self.frames += 1;
        Ok(())
    }

    fn close(&mut self, canvas: &Canvas) -> Result<(), CanvasError> {
        let Some(path) = self.dump_path() else {
            return Ok(());
        };
        let mut writer = BufWriter::new(File::create(&path)?);
        canvas.write_png(&mut writer)?;
        writer.flush()?;
        info!("{}: wrote {} ({} frames)", self.id, path.display(), self.frames);
        Ok(())
    }
}

/// One parsed script line.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptCommand {
    /// Palette tool button
    Tool(Tool),
    /// Palette color swatch
    Color(Color),
    /// Palette action button
    Action(Action),
    /// Pointer input on a surface
    Pointer {
        surface: SurfaceId,
        event: PointerEvent,
    },
    /// Key press on a surface
    Key {
        surface: SurfaceId,
        key: Key,
        modifiers: Modifiers,
    },
    /// Display geometry change
    Resize {
        surface: SurfaceId,
        display: DisplayConfig,
    },
}

impl ScriptCommand {
    /// Parses one line; blank lines and comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = strip_comment(line);
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let name = command.to_ascii_lowercase();

        let parsed = match name.as_str() {
            "tool" => {
                let [tool] = expect_args(&args, "tool <cursor|pen|rect|arrow|circle>")?;
                ScriptCommand::Tool(tool.parse::<Tool>()?)
            }
            "color" => {
                let [color] = expect_args(&args, "color <#rrggbb|name>")?;
                ScriptCommand::Color(color.parse::<Color>().map_err(|e| e.to_string())?)
            }
            "action" => {
                let [action] = expect_args(&args, "action <quit|undo|redo|clear>")?;
                ScriptCommand::Action(action.parse::<Action>()?)
            }
            "down" | "move" | "up" => {
                let [surface, x, y] = expect_args(&args, "down|move|up <surface> <x> <y>")?;
                let (x, y) = (parse_coord(x)?, parse_coord(y)?);
                let event = match name.as_str() {
                    "down" => PointerEvent::Press {
                        button: MouseButton::Left,
                        x,
                        y,
                    },
                    "move" => PointerEvent::Motion { x, y },
                    _ => PointerEvent::Release {
                        button: MouseButton::Left,
                        x,
                        y,
                    },
                };
                ScriptCommand::Pointer {
                    surface: parse_surface(surface)?,
                    event,
                }
            }
            "cancel" => {
                let [surface] = expect_args(&args, "cancel <surface>")?;
                ScriptCommand::Pointer {
                    surface: parse_surface(surface)?,
                    event: PointerEvent::Press {
                        button: MouseButton::Right,
                        x: 0.0,
                        y: 0.0,
                    },
                }
            }
            "leave" => {
                let [surface] = expect_args(&args, "leave <surface>")?;
                ScriptCommand::Pointer {
                    surface: parse_surface(surface)?,
                    event: PointerEvent::Leave,
                }
            }
            "key" => {
                let [surface, binding] = expect_args(&args, "key <surface> <binding>")?;
                let (key, modifiers) = key_press(&KeyBinding::parse(binding)?)?;
                ScriptCommand::Key {
                    surface: parse_surface(surface)?,
                    key,
                    modifiers,
                }
            }
            "resize" => {
                let [surface, spec] = expect_args(&args, "resize <surface> <W>x<H>[@scale]")?;
                let surface = parse_surface(surface)?;
                ScriptCommand::Resize {
                    surface,
                    display: DisplayConfig::parse(surface.0, spec)?,
                }
            }
            other => return Err(format!("unknown command '{other}'")),
        };
        Ok(Some(parsed))
    }
}

/// A `#` at the start of a line, or followed by whitespace, opens a comment.
/// `#` followed by anything else (a hex color) is kept.
fn strip_comment(line: &str) -> &str {
    let line = line.trim();
    if line.starts_with('#') {
        return "";
    }
    let bytes = line.as_bytes();
    for (i, byte) in bytes.iter().enumerate() {
        if *byte == b'#' && bytes.get(i + 1).is_none_or(|next| next.is_ascii_whitespace()) {
            return line[..i].trim_end();
        }
    }
    line
}

fn expect_args<'a, const N: usize>(args: &[&'a str], usage: &str) -> Result<[&'a str; N], String> {
    <[&str; N]>::try_from(args).map_err(|_| format!("expected `{usage}`"))
}

fn parse_surface(value: &str) -> Result<SurfaceId, String> {
    value
        .strip_prefix("surface-")
        .unwrap_or(value)
        .parse::<u32>()
        .map(SurfaceId)
        .map_err(|_| format!("invalid surface '{value}'"))
}

fn parse_coord(value: &str) -> Result<f64, String> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("invalid coordinate '{value}'"))
}

fn key_press(binding: &KeyBinding) -> Result<(Key, Modifiers), String> {
    let key = binding.key.parse::<Key>()?;
    let modifiers = Modifiers {
        shift: binding.shift,
        ctrl: binding.ctrl,
        alt: binding.alt,
    };
    Ok((key, modifiers))
}

/// A running overlay session with headless windows.
///
/// Dropping the session quits the router and waits for every thread.
pub struct HeadlessSession {
    palette: PaletteController,
    surfaces: BTreeMap<SurfaceId, UnboundedSender<SurfaceMessage>>,
    router: UnboundedSender<RouterMessage>,
    router_thread: Option<JoinHandle<()>>,
}

impl HeadlessSession {
    /// Spawns one surface per configured display plus the router.
    pub fn start(config: &Config, dump_dir: Option<PathBuf>) -> Result<Self, ScriptError> {
        let shortcuts = config
            .keybindings
            .build_shortcut_map()
            .map_err(ScriptError::Keybindings)?;
        let settings = SurfaceSettings::from_config(config);

        let (router_tx, router_rx) = mpsc::unbounded_channel();
        let (palette_tx, palette_rx) = mpsc::unbounded_channel();
        let mut registry = SurfaceRegistry::new(shortcuts);
        registry.set_palette(palette_tx);

        let mut surfaces = BTreeMap::new();
        for display_config in &config.displays {
            let display = DisplayInfo::from(display_config);
            let window = HeadlessWindow::new(display.id, dump_dir.clone());
            let handle = spawn_surface(display, settings, Box::new(window), router_tx.clone())?;
            surfaces.insert(display.id, handle.sender());
            registry.register(handle);
        }

        let router_thread = spawn_router(registry, router_rx)?;
        info!("Headless session started with {} surface(s)", surfaces.len());

        Ok(Self {
            palette: PaletteController::new(router_tx.clone(), palette_rx, settings.initial_color),
            surfaces,
            router: router_tx,
            router_thread: Some(router_thread),
        })
    }

    /// Sender into the router inbox, e.g. for a signal handler.
    pub fn router(&self) -> UnboundedSender<RouterMessage> {
        self.router.clone()
    }

    pub fn palette(&self) -> &PaletteController {
        &self.palette
    }

    pub fn surface_ids(&self) -> Vec<SurfaceId> {
        self.surfaces.keys().copied().collect()
    }

    /// Delivers one command without waiting for it to take effect.
    pub fn apply(&mut self, command: ScriptCommand) -> Result<(), ScriptError> {
        match command {
            ScriptCommand::Tool(tool) => self.palette.select_tool(tool)?,
            ScriptCommand::Color(color) => self.palette.select_color(color)?,
            ScriptCommand::Action(action) => self.palette.trigger(action)?,
            ScriptCommand::Pointer { surface, event } => {
                self.send_to(surface, SurfaceMessage::Pointer(event))?
            }
            ScriptCommand::Key {
                surface,
                key,
                modifiers,
            } => self.send_to(surface, SurfaceMessage::KeyDown { key, modifiers })?,
            ScriptCommand::Resize { surface, display } => {
                self.send_to(surface, SurfaceMessage::Resize(DisplayInfo::from(&display)))?
            }
        }
        Ok(())
    }

    /// Blocks until every delivered command and its consequences are applied.
    ///
    /// The first round drains the surfaces; anything they sent the router
    /// meanwhile (stroke-added, key presses) is flushed by the second.
    pub fn settle(&mut self) -> Result<(), ScriptError> {
        for _ in 0..2 {
            let (ack, done) = oneshot::channel();
            self.router
                .send(RouterMessage::Sync(ack))
                .map_err(|_| RouteError::RouterClosed)?;
            done.blocking_recv().map_err(|_| RouteError::RouterClosed)?;
        }
        self.palette.sync();
        Ok(())
    }

    /// Current state of every live surface, in id order.
    pub fn reports(&self) -> Vec<SurfaceReport> {
        let pending: Vec<_> = self
            .surfaces
            .iter()
            .filter_map(|(id, tx)| {
                let (reply, report) = oneshot::channel();
                match tx.send(SurfaceMessage::Report(reply)) {
                    Ok(()) => Some(report),
                    Err(_) => {
                        warn!("{id} is gone; no report");
                        None
                    }
                }
            })
            .collect();
        pending
            .into_iter()
            .filter_map(|report| report.blocking_recv().ok())
            .collect()
    }

    /// Plays `script` line by line, settling after each, then quits.
    ///
    /// Returns the final surface reports; empty if the session was stopped
    /// from outside (e.g. by a signal) before the script ended.
    pub fn run<R: BufRead>(mut self, script: R) -> Result<Vec<SurfaceReport>, ScriptError> {
        for (index, line) in script.lines().enumerate() {
            let line_no = index + 1;
            let line = line?;
            let command = match ScriptCommand::parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(message) => {
                    return Err(ScriptError::Parse {
                        line: line_no,
                        message,
                    });
                }
            };

            if command == ScriptCommand::Action(Action::Quit) {
                info!("Script requested quit at line {line_no}");
                break;
            }
            debug!("line {line_no}: {command:?}");

            match self.apply(command).and_then(|()| self.settle()) {
                Ok(()) => {}
                Err(err) if self.router.is_closed() || self.stopped_by_quit(&err) => {
                    info!("Session stopped before the script finished");
                    return Ok(Vec::new());
                }
                Err(ScriptError::UnknownSurface(id)) => {
                    return Err(ScriptError::Parse {
                        line: line_no,
                        message: format!("no such surface: {id}"),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        let reports = self.reports();
        self.finish();
        Ok(reports)
    }

    /// Quits the router and waits for all threads.
    pub fn finish(mut self) {
        self.stop();
    }

    /// Whether `err` is a surface that went away because the router quit.
    ///
    /// During a quit the router joins every surface before it drops its
    /// inbox, so a send can fail while the router still looks alive. A sync
    /// queued behind the quit is never acknowledged.
    fn stopped_by_quit(&self, err: &ScriptError) -> bool {
        if !matches!(err, ScriptError::Route(RouteError::SurfaceGone(_))) {
            return false;
        }
        let (ack, done) = oneshot::channel();
        self.router.send(RouterMessage::Sync(ack)).is_err() || done.blocking_recv().is_err()
    }

    fn send_to(&self, surface: SurfaceId, message: SurfaceMessage) -> Result<(), ScriptError> {
        self.surfaces
            .get(&surface)
            .ok_or(ScriptError::UnknownSurface(surface))?
            .send(message)
            .map_err(|_| RouteError::SurfaceGone(surface).into())
    }

    fn stop(&mut self) {
        let Some(thread) = self.router_thread.take() else {
            return;
        };
        let _ = self.router.send(RouterMessage::Action(Action::Quit));
        if thread.join().is_err() {
            warn!("Router thread panicked");
        }
    }
}

impl Drop for HeadlessSession {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Runs `script` against a fresh session built from `config`.
pub fn run_script<R: BufRead>(
    script: R,
    config: &Config,
    dump_dir: Option<PathBuf>,
) -> Result<Vec<SurfaceReport>, ScriptError> {
    HeadlessSession::start(config, dump_dir)?.run(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::GREEN;
    use std::io::Cursor;

    fn parse(line: &str) -> ScriptCommand {
        ScriptCommand::parse(line).unwrap().unwrap()
    }

    fn small_config(specs: &[&str]) -> Config {
        let mut config = Config::default();
        config.displays = specs
            .iter()
            .enumerate()
            .map(|(id, spec)| DisplayConfig::parse(id as u32, spec).unwrap())
            .collect();
        config
    }

    #[test]
    fn test_comments_and_blank_lines() {
        assert_eq!(ScriptCommand::parse("").unwrap(), None);
        assert_eq!(ScriptCommand::parse("   # just a note").unwrap(), None);
        assert_eq!(ScriptCommand::parse("#tight comment").unwrap(), None);
        assert_eq!(parse("tool pen # switch"), ScriptCommand::Tool(Tool::Pen));
    }

    #[test]
    fn test_hex_color_is_not_a_comment() {
        assert_eq!(parse("color #22c55e"), ScriptCommand::Color(GREEN));
        assert_eq!(parse("color green  # same"), ScriptCommand::Color(GREEN));
    }

    #[test]
    fn test_pointer_lines() {
        assert_eq!(
            parse("down 1 10 20.5"),
            ScriptCommand::Pointer {
                surface: SurfaceId(1),
                event: PointerEvent::Press {
                    button: MouseButton::Left,
                    x: 10.0,
                    y: 20.5
                }
            }
        );
        assert_eq!(
            parse("leave surface-2"),
            ScriptCommand::Pointer {
                surface: SurfaceId(2),
                event: PointerEvent::Leave
            }
        );
    }

    #[test]
    fn test_key_line_carries_modifiers() {
        assert_eq!(
            parse("key 0 Ctrl+Shift+Z"),
            ScriptCommand::Key {
                surface: SurfaceId(0),
                key: Key::Char('Z'),
                modifiers: Modifiers {
                    shift: true,
                    ctrl: true,
                    alt: false
                }
            }
        );
        assert_eq!(
            parse("key 0 Escape"),
            ScriptCommand::Key {
                surface: SurfaceId(0),
                key: Key::Escape,
                modifiers: Modifiers::new()
            }
        );
    }

    #[test]
    fn test_resize_line() {
        match parse("resize 1 640x480@2") {
            ScriptCommand::Resize { surface, display } => {
                assert_eq!(surface, SurfaceId(1));
                assert_eq!((display.width, display.height, display.scale), (640, 480, 2.0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(ScriptCommand::parse("jump 0").unwrap_err().contains("unknown command"));
        assert!(ScriptCommand::parse("tool brush").is_err());
        assert!(ScriptCommand::parse("down 0 10").unwrap_err().contains("expected"));
        assert!(ScriptCommand::parse("down x 1 2").is_err());
        assert!(ScriptCommand::parse("move 0 NaN 2").is_err());
        assert!(ScriptCommand::parse("key 0 Ctrl+").is_err());
    }

    #[test]
    fn test_window_dumps_png_on_close() {
        let dir = tempfile::tempdir().unwrap();
        let mut window = HeadlessWindow::new(SurfaceId(3), Some(dir.path().to_path_buf()));
        let canvas = Canvas::new(20, 10, 1.0).unwrap();

        window.set_click_through(true);
        assert!(window.click_through());
        window.close(&canvas).unwrap();

        let path = dir.path().join("surface-3.png");
        assert_eq!(window.dump_path(), Some(path.clone()));
        let mut file = File::open(path).unwrap();
        let image = cairo::ImageSurface::create_from_png(&mut file).unwrap();
        assert_eq!((image.width(), image.height()), (20, 10));
    }

    #[test]
    fn test_run_script_reports_each_surface() {
        let config = small_config(&["100x100", "100x100"]);
        let script = "\
tool rect
down 0 10 10
move 0 60 60
up 0 60 60
";
        let reports = run_script(Cursor::new(script), &config, None).unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].tool, Tool::Rect);
        assert_eq!(reports[0].history_len, 2);
        assert!(!reports[0].pixels.is_blank());
        assert_eq!(reports[1].history_len, 1);
        assert!(reports[1].pixels.is_blank());
    }

    #[test]
    fn test_run_script_errors_carry_line_numbers() {
        let config = small_config(&["50x50"]);

        let err = run_script(Cursor::new("tool pen\n\nwiggle 0\n"), &config, None).unwrap_err();
        assert_eq!(err.to_string(), "line 3: unknown command 'wiggle'");

        let err = run_script(Cursor::new("down 4 1 1\n"), &config, None).unwrap_err();
        assert_eq!(err.to_string(), "line 1: no such surface: surface-4");
    }

    #[test]
    fn test_outside_quit_ends_script_quietly() {
        let config = small_config(&["50x50"]);
        let mut session = HeadlessSession::start(&config, None).unwrap();
        let router = session.router();
        session.apply(parse("tool pen")).unwrap();
        session.settle().unwrap();

        router.send(RouterMessage::Action(Action::Quit)).unwrap();
        // Once the surface threads are gone, every later line fails to send.
        let surface = session.surfaces[&SurfaceId(0)].clone();
        while !surface.is_closed() {
            std::thread::yield_now();
        }

        let reports = session.run(Cursor::new("down 0 1 1
move 0 5 5
")).unwrap();
        assert!(reports.is_empty());
    }

    #[test]
    fn test_quit_action_ends_script_early() {
        let config = small_config(&["50x50"]);
        let script = "tool pen\naction quit\nthis line is never parsed\n";
        let reports = run_script(Cursor::new(script), &config, None).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].tool, Tool::Pen);
    }
}
