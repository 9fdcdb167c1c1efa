//! Generic input event types delivered to overlay surfaces.

use std::fmt;
use std::str::FromStr;

/// Generic key representation for cross-backend compatibility.
///
/// Window hosts map their native key codes to these values; the router
/// matches them against configured keybindings by [`Key::name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)] // Some variants only arrive from specific hosts
pub enum Key {
    /// Regular character key (a-z, 0-9, symbols)
    Char(char),
    /// Escape key
    Escape,
    /// Return/Enter key
    Return,
    /// Backspace key
    Backspace,
    /// Delete key
    Delete,
    /// Tab key
    Tab,
    /// Space bar
    Space,
    /// Function key F1-F12
    Function(u8),
    /// Unmapped or unrecognized key
    Unknown,
}

impl Key {
    /// Name used in keybinding strings ("Escape", "Z", "F10").
    pub fn name(&self) -> Option<String> {
        match self {
            Key::Char(c) => Some(c.to_ascii_uppercase().to_string()),
            Key::Escape => Some("Escape".to_string()),
            Key::Return => Some("Return".to_string()),
            Key::Backspace => Some("Backspace".to_string()),
            Key::Delete => Some("Delete".to_string()),
            Key::Tab => Some("Tab".to_string()),
            Key::Space => Some("Space".to_string()),
            Key::Function(n) => Some(format!("F{n}")),
            Key::Unknown => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(&name),
            None => f.write_str("Unknown"),
        }
    }
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Ok(Key::Char(c));
        }

        match s.to_ascii_lowercase().as_str() {
            "escape" | "esc" => Ok(Key::Escape),
            "return" | "enter" => Ok(Key::Return),
            "backspace" => Ok(Key::Backspace),
            "delete" | "del" => Ok(Key::Delete),
            "tab" => Ok(Key::Tab),
            "space" => Ok(Key::Space),
            lower => lower
                .strip_prefix('f')
                .and_then(|n| n.parse::<u8>().ok())
                .filter(|n| (1..=12).contains(n))
                .map(Key::Function)
                .ok_or_else(|| format!("unknown key '{s}'")),
        }
    }
}

/// Mouse button identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    /// Primary button (draws)
    Left,
    /// Secondary button (cancels an in-progress stroke)
    Right,
    /// Middle button (unused)
    Middle,
}

/// Pointer input in the surface's logical coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Press { button: MouseButton, x: f64, y: f64 },
    Motion { x: f64, y: f64 },
    Release { button: MouseButton, x: f64, y: f64 },
    /// Pointer left the surface
    Leave,
}
