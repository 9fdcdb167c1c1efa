//! Configuration file support for overscribe.
//!
//! This module handles loading and validating user settings from the configuration file
//! located at `~/.config/overscribe/config.toml`. Settings include drawing defaults,
//! arrow appearance, history limits, the headless display list, and keybindings.
//!
//! If no config file exists, sensible defaults are used automatically.

pub mod enums;
pub mod keybindings;
pub mod types;

pub use enums::ColorSpec;
pub use keybindings::{KeyBinding, KeybindingsConfig, Shortcut, resolve_shortcut};
pub use types::{ArrowConfig, DisplayConfig, DrawingConfig, HistoryConfig};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure containing all user settings.
///
/// This is the root configuration type that gets deserialized from the TOML file.
/// All fields have sensible defaults and will use those if not specified in the config file.
///
/// # Example TOML
/// ```toml
/// [drawing]
/// default_color = "red"
/// line_width = 4.0
///
/// [arrow]
/// length = 15.0
/// angle_degrees = 30.0
///
/// [history]
/// max_entries = 50
///
/// [[displays]]
/// id = 0
/// width = 1920
/// height = 1080
///
/// [[displays]]
/// id = 1
/// x = 1920
/// width = 2560
/// height = 1440
/// scale = 2.0
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    /// Drawing defaults (color, line width)
    #[serde(default)]
    pub drawing: DrawingConfig,

    /// Arrow appearance settings
    #[serde(default)]
    pub arrow: ArrowConfig,

    /// Undo history limits
    #[serde(default)]
    pub history: HistoryConfig,

    /// Displays to cover when running headless
    #[serde(default = "types::default_displays")]
    pub displays: Vec<DisplayConfig>,

    /// Shortcut keybindings
    #[serde(default)]
    pub keybindings: KeybindingsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            drawing: DrawingConfig::default(),
            arrow: ArrowConfig::default(),
            history: HistoryConfig::default(),
            displays: types::default_displays(),
            keybindings: KeybindingsConfig::default(),
        }
    }
}

impl Config {
    /// Validates and clamps all configuration values to acceptable ranges.
    ///
    /// Invalid values are clamped to the nearest valid value and a warning is logged.
    ///
    /// Validated ranges:
    /// - `line_width`: 1.0 - 20.0
    /// - `arrow.length`: 5.0 - 50.0
    /// - `arrow.angle_degrees`: 15.0 - 60.0
    /// - `displays[].scale`: 0.5 - 4.0
    ///
    /// Displays with a zero dimension or a repeated id are dropped; an empty
    /// list falls back to the single default display.
    pub fn validate_and_clamp(&mut self) {
        // Line width: 1.0 - 20.0
        if !(1.0..=20.0).contains(&self.drawing.line_width) {
            warn!(
                "Invalid line_width {:.1}, clamping to 1.0-20.0 range",
                self.drawing.line_width
            );
            self.drawing.line_width = clamp_or(self.drawing.line_width, 1.0, 20.0, 4.0);
        }

        // Arrow length: 5.0 - 50.0
        if !(5.0..=50.0).contains(&self.arrow.length) {
            warn!(
                "Invalid arrow length {:.1}, clamping to 5.0-50.0 range",
                self.arrow.length
            );
            self.arrow.length = clamp_or(self.arrow.length, 5.0, 50.0, 15.0);
        }

        // Arrow angle: 15.0 - 60.0 degrees
        if !(15.0..=60.0).contains(&self.arrow.angle_degrees) {
            warn!(
                "Invalid arrow angle {:.1}°, clamping to 15.0-60.0° range",
                self.arrow.angle_degrees
            );
            self.arrow.angle_degrees = clamp_or(self.arrow.angle_degrees, 15.0, 60.0, 30.0);
        }

        let mut seen = HashSet::new();
        self.displays.retain_mut(|display| {
            if display.width == 0 || display.height == 0 {
                warn!(
                    "Ignoring display {} with empty size {}x{}",
                    display.id, display.width, display.height
                );
                return false;
            }
            if !seen.insert(display.id) {
                warn!("Ignoring duplicate display id {}", display.id);
                return false;
            }
            if !(0.5..=4.0).contains(&display.scale) {
                warn!(
                    "Invalid scale {:.2} for display {}, clamping to 0.5-4.0 range",
                    display.scale, display.id
                );
                display.scale = clamp_or(display.scale, 0.5, 4.0, 1.0);
            }
            true
        });

        if self.displays.is_empty() {
            warn!("No usable displays configured, using the default display");
            self.displays = types::default_displays();
        }
    }

    /// Returns the path to the configuration file.
    ///
    /// The config file is located at `~/.config/overscribe/config.toml`.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined (e.g., HOME not set).
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("overscribe");

        Ok(config_dir.join("config.toml"))
    }

    /// Loads configuration from the default location, or returns defaults if not found.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The config directory path cannot be determined
    /// - The file exists but cannot be read
    /// - The file exists but contains invalid TOML syntax
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", config_path.display());
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Loads and validates configuration from an explicit path.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

        // Validate and clamp values to acceptable ranges
        config.validate_and_clamp();

        info!("Loaded config from {}", config_path.display());
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// JSON schema describing the configuration file.
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }
}

fn clamp_or(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.drawing.line_width, 4.0);
        assert_eq!(config.arrow.length, 15.0);
        assert_eq!(config.arrow.angle_degrees, 30.0);
        assert_eq!(config.history.max_entries, 0);
        assert_eq!(config.displays.len(), 1);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.displays, types::default_displays());
        assert_eq!(config.keybindings.undo, vec!["Ctrl+Z".to_string()]);
    }

    #[test]
    fn test_validate_clamps_out_of_range_values() {
        let mut config = Config::default();
        config.drawing.line_width = 100.0;
        config.arrow.length = 1.0;
        config.arrow.angle_degrees = f64::NAN;
        config.validate_and_clamp();

        assert_eq!(config.drawing.line_width, 20.0);
        assert_eq!(config.arrow.length, 5.0);
        assert_eq!(config.arrow.angle_degrees, 30.0);
    }

    #[test]
    fn test_validate_filters_displays() {
        let mut config = Config::default();
        config.displays = vec![
            DisplayConfig::parse(0, "800x600@9").unwrap(),
            DisplayConfig::parse(0, "640x480").unwrap(),
            DisplayConfig::parse(1, "0x480").unwrap(),
        ];
        config.validate_and_clamp();

        assert_eq!(config.displays.len(), 1);
        assert_eq!(config.displays[0].width, 800);
        assert_eq!(config.displays[0].scale, 4.0);
    }

    #[test]
    fn test_validate_restores_default_display() {
        let mut config = Config::default();
        config.displays.clear();
        config.validate_and_clamp();
        assert_eq!(config.displays, types::default_displays());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r##"
[drawing]
default_color = "#22c55e"
line_width = 6.0

[history]
max_entries = 10

[[displays]]
id = 3
width = 320
height = 200
scale = 2.0

[keybindings]
quit = ["Ctrl+W"]
"##
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.drawing.line_width, 6.0);
        assert_eq!(config.drawing.default_color.to_color(), crate::draw::GREEN);
        assert_eq!(config.history.max_entries, 10);
        assert_eq!(config.displays[0].id, 3);
        assert_eq!(config.keybindings.quit, vec!["Ctrl+W".to_string()]);
    }

    #[test]
    fn test_load_from_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[drawing\nline_width = ").unwrap();
        let err = Config::load_from(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config"));
    }

    #[test]
    fn test_schema_lists_sections() {
        let schema = serde_json::to_value(Config::json_schema()).unwrap();
        let properties = schema.get("properties").unwrap();
        for key in ["drawing", "arrow", "history", "displays", "keybindings"] {
            assert!(properties.get(key).is_some(), "missing {key}");
        }
    }
}
