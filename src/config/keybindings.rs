//! Keybinding configuration types and parsing.
//!
//! Key presses on any overlay surface (or on the palette) are forwarded to
//! the router, which resolves them through the map built here.

use crate::input::{Key, Modifiers, Tool};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Session-wide shortcuts that can be bound to keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shortcut {
    /// Clear every surface and switch all of them to the cursor tool
    ClearAndRelease,
    Undo,
    Redo,
    Quit,
    SelectTool(Tool),
}

/// A single keybinding: a key name with optional modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyBinding {
    /// Parse a keybinding string like "Ctrl+Shift+Z" or "Escape".
    ///
    /// Modifiers may appear in any order and spaces around '+' are ignored.
    /// Key names are stored uppercase so "ctrl+z" and "Ctrl+Z" are the same
    /// binding.
    pub fn parse(s: &str) -> Result<Self, String> {
        let normalized: String = s.split_whitespace().collect();
        if normalized.is_empty() {
            return Err("Empty keybinding string".to_string());
        }

        let mut binding = Self {
            key: String::new(),
            ctrl: false,
            shift: false,
            alt: false,
        };

        // A trailing "++" (or a lone "+") binds the '+' key itself.
        let (body, plus_key) = if normalized == "+" {
            ("", true)
        } else if let Some(rest) = normalized.strip_suffix("++") {
            (rest, true)
        } else {
            (normalized.as_str(), false)
        };

        let mut key_parts = Vec::new();
        for part in body.split('+').filter(|part| !part.is_empty()) {
            match part.to_lowercase().as_str() {
                "ctrl" | "control" => binding.ctrl = true,
                "shift" => binding.shift = true,
                "alt" => binding.alt = true,
                _ => key_parts.push(part.to_uppercase()),
            }
        }
        if plus_key {
            key_parts.push("+".to_string());
        }

        binding.key = match key_parts.as_slice() {
            [key] => key.clone(),
            [] => return Err(format!("No key specified in: {}", s.trim())),
            _ => return Err(format!("More than one key in: {}", s.trim())),
        };

        Ok(binding)
    }

    /// Check whether this binding matches a key press.
    pub fn matches(&self, key: &Key, modifiers: Modifiers) -> bool {
        key.name()
            .is_some_and(|name| self.key.eq_ignore_ascii_case(&name))
            && self.ctrl == modifiers.ctrl
            && self.shift == modifiers.shift
            && self.alt == modifiers.alt
    }
}

/// Configuration for all keybindings.
///
/// Each shortcut can have multiple keybindings:
/// ```toml
/// [keybindings]
/// clear_and_release = ["Escape"]
/// undo = ["Ctrl+Z"]
/// redo = ["Ctrl+Shift+Z", "Ctrl+Y"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct KeybindingsConfig {
    #[serde(default = "default_clear_and_release")]
    pub clear_and_release: Vec<String>,

    #[serde(default = "default_undo")]
    pub undo: Vec<String>,

    #[serde(default = "default_redo")]
    pub redo: Vec<String>,

    #[serde(default = "default_quit")]
    pub quit: Vec<String>,

    #[serde(default = "default_select_cursor")]
    pub select_cursor: Vec<String>,

    #[serde(default = "default_select_pen")]
    pub select_pen: Vec<String>,

    #[serde(default = "default_select_rect")]
    pub select_rect: Vec<String>,

    #[serde(default = "default_select_arrow")]
    pub select_arrow: Vec<String>,

    #[serde(default = "default_select_circle")]
    pub select_circle: Vec<String>,
}

impl Default for KeybindingsConfig {
    fn default() -> Self {
        Self {
            clear_and_release: default_clear_and_release(),
            undo: default_undo(),
            redo: default_redo(),
            quit: default_quit(),
            select_cursor: default_select_cursor(),
            select_pen: default_select_pen(),
            select_rect: default_select_rect(),
            select_arrow: default_select_arrow(),
            select_circle: default_select_circle(),
        }
    }
}

impl KeybindingsConfig {
    /// Build a lookup map from keybindings to shortcuts.
    ///
    /// Returns an error if any keybinding string is invalid or if the same
    /// binding is assigned twice.
    pub fn build_shortcut_map(&self) -> Result<HashMap<KeyBinding, Shortcut>, String> {
        let groups: [(&[String], Shortcut); 9] = [
            (&self.clear_and_release, Shortcut::ClearAndRelease),
            (&self.undo, Shortcut::Undo),
            (&self.redo, Shortcut::Redo),
            (&self.quit, Shortcut::Quit),
            (&self.select_cursor, Shortcut::SelectTool(Tool::Cursor)),
            (&self.select_pen, Shortcut::SelectTool(Tool::Pen)),
            (&self.select_rect, Shortcut::SelectTool(Tool::Rect)),
            (&self.select_arrow, Shortcut::SelectTool(Tool::Arrow)),
            (&self.select_circle, Shortcut::SelectTool(Tool::Circle)),
        ];

        let mut map = HashMap::new();
        for (bindings, shortcut) in groups {
            for binding_str in bindings {
                let binding = KeyBinding::parse(binding_str)?;
                if let Some(existing) = map.insert(binding, shortcut) {
                    return Err(format!(
                        "Duplicate keybinding '{}' assigned to both {:?} and {:?}",
                        binding_str, existing, shortcut
                    ));
                }
            }
        }
        Ok(map)
    }
}

/// Finds the shortcut bound to a key press, if any.
pub fn resolve_shortcut(
    map: &HashMap<KeyBinding, Shortcut>,
    key: &Key,
    modifiers: Modifiers,
) -> Option<Shortcut> {
    map.iter()
        .find(|(binding, _)| binding.matches(key, modifiers))
        .map(|(_, shortcut)| *shortcut)
}

// =============================================================================
// Default keybinding functions
// =============================================================================

fn default_clear_and_release() -> Vec<String> {
    vec!["Escape".to_string()]
}

fn default_undo() -> Vec<String> {
    vec!["Ctrl+Z".to_string()]
}

fn default_redo() -> Vec<String> {
    vec!["Ctrl+Shift+Z".to_string(), "Ctrl+Y".to_string()]
}

fn default_quit() -> Vec<String> {
    vec!["Ctrl+Q".to_string()]
}

fn default_select_cursor() -> Vec<String> {
    vec!["V".to_string()]
}

fn default_select_pen() -> Vec<String> {
    vec!["P".to_string()]
}

fn default_select_rect() -> Vec<String> {
    vec!["R".to_string()]
}

fn default_select_arrow() -> Vec<String> {
    vec!["A".to_string()]
}

fn default_select_circle() -> Vec<String> {
    vec!["C".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_key() {
        let binding = KeyBinding::parse("Escape").unwrap();
        assert_eq!(binding.key, "ESCAPE");
        assert!(!binding.ctrl && !binding.shift && !binding.alt);
    }

    #[test]
    fn test_parse_modifiers_any_order_with_spaces() {
        let a = KeyBinding::parse("Ctrl+Shift+Z").unwrap();
        let b = KeyBinding::parse("shift + ctrl + z").unwrap();
        assert_eq!(a, b);
        assert!(a.ctrl && a.shift && !a.alt);
    }

    #[test]
    fn test_parse_plus_key() {
        let binding = KeyBinding::parse("Ctrl++").unwrap();
        assert_eq!(binding.key, "+");
        assert!(binding.ctrl);
    }

    #[test]
    fn test_parse_rejects_modifier_only() {
        assert!(KeyBinding::parse("Ctrl+Shift").is_err());
        assert!(KeyBinding::parse("Ctrl+").is_err());
        assert!(KeyBinding::parse("   ").is_err());
    }

    #[test]
    fn test_parse_rejects_two_keys() {
        assert!(KeyBinding::parse("A+B").is_err());
    }

    #[test]
    fn test_matches_requires_exact_modifiers() {
        let binding = KeyBinding::parse("Ctrl+Z").unwrap();
        assert!(binding.matches(&Key::Char('z'), Modifiers::ctrl()));
        assert!(binding.matches(&Key::Char('Z'), Modifiers::ctrl()));
        assert!(!binding.matches(&Key::Char('z'), Modifiers::new()));

        let redo = Modifiers {
            ctrl: true,
            shift: true,
            alt: false,
        };
        assert!(!binding.matches(&Key::Char('z'), redo));
    }

    #[test]
    fn test_default_map_resolves_escape_and_undo() {
        let map = KeybindingsConfig::default().build_shortcut_map().unwrap();
        assert_eq!(
            resolve_shortcut(&map, &Key::Escape, Modifiers::new()),
            Some(Shortcut::ClearAndRelease)
        );
        assert_eq!(
            resolve_shortcut(&map, &Key::Char('z'), Modifiers::ctrl()),
            Some(Shortcut::Undo)
        );
        assert_eq!(
            resolve_shortcut(&map, &Key::Char('p'), Modifiers::new()),
            Some(Shortcut::SelectTool(Tool::Pen))
        );
        assert_eq!(resolve_shortcut(&map, &Key::Char('x'), Modifiers::new()), None);
    }

    #[test]
    fn test_duplicate_keybinding_detection() {
        let mut config = KeybindingsConfig::default();
        config.quit = vec!["Ctrl+Z".to_string()];

        let err = config.build_shortcut_map().unwrap_err();
        assert!(err.contains("Duplicate keybinding"));
        assert!(err.contains("Ctrl+Z"));
    }

    #[test]
    fn test_duplicate_with_different_modifier_order() {
        let mut config = KeybindingsConfig::default();
        config.redo = vec!["Shift+Ctrl+Z".to_string()];
        config.quit = vec!["Ctrl+Shift+Z".to_string()];
        assert!(config.build_shortcut_map().is_err());
    }
}
