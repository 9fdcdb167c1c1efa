//! Configuration type definitions.

use super::enums::ColorSpec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Drawing-related settings.
///
/// Controls the stroke appearance every surface starts with. The palette can
/// change the color at runtime; nothing here is written back.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DrawingConfig {
    /// Initial stroke color - a palette name, `#rrggbb`, or `[r, g, b]`
    #[serde(default = "default_color")]
    pub default_color: ColorSpec,

    /// Stroke width in logical pixels (valid range: 1.0 - 20.0)
    #[serde(default = "default_line_width")]
    pub line_width: f64,
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self {
            default_color: default_color(),
            line_width: default_line_width(),
        }
    }
}

/// Arrow drawing settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ArrowConfig {
    /// Arrowhead segment length in logical pixels (valid range: 5.0 - 50.0)
    #[serde(default = "default_arrow_length")]
    pub length: f64,

    /// Angle between each head segment and the shaft (valid range: 15.0 - 60.0)
    #[serde(default = "default_arrow_angle")]
    pub angle_degrees: f64,
}

impl Default for ArrowConfig {
    fn default() -> Self {
        Self {
            length: default_arrow_length(),
            angle_degrees: default_arrow_angle(),
        }
    }
}

/// Undo history settings.
///
/// Every committed stroke stores a full-resolution copy of the surface, so a
/// 4K display at density 2 costs roughly 130 MB per hundred strokes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct HistoryConfig {
    /// Maximum snapshots kept per surface (0 = unlimited)
    #[serde(default)]
    pub max_entries: usize,
}

/// One display to cover with an overlay surface.
///
/// Window hosts that can enumerate outputs ignore this list; the headless
/// backend uses it verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DisplayConfig {
    /// Surface identifier used in scripts and logs
    pub id: u32,
    /// Left edge in the desktop layout
    #[serde(default)]
    pub x: i32,
    /// Top edge in the desktop layout
    #[serde(default)]
    pub y: i32,
    /// Logical width
    pub width: u32,
    /// Logical height
    pub height: u32,
    /// Device pixel ratio (valid range: 0.5 - 4.0)
    #[serde(default = "default_scale")]
    pub scale: f64,
}

impl DisplayConfig {
    /// Parses `WxH`, `WxH@scale`, or `WxH+X+Y@scale`.
    pub fn parse(id: u32, spec: &str) -> Result<Self, String> {
        let (geometry, scale) = match spec.split_once('@') {
            Some((geometry, scale)) => (
                geometry,
                scale
                    .parse::<f64>()
                    .map_err(|_| format!("invalid scale in display '{spec}'"))?,
            ),
            None => (spec, default_scale()),
        };

        let mut parts = geometry.split('+');
        let size = parts.next().unwrap_or_default();
        let (width, height) = size
            .split_once(['x', 'X'])
            .and_then(|(w, h)| Some((w.parse::<u32>().ok()?, h.parse::<u32>().ok()?)))
            .ok_or_else(|| format!("invalid size in display '{spec}' (expected WxH)"))?;

        let mut offset = parts.map(|v| v.parse::<i32>());
        let x = offset.next().transpose().map_err(|_| format!("invalid x offset in '{spec}'"))?;
        let y = offset.next().transpose().map_err(|_| format!("invalid y offset in '{spec}'"))?;
        if offset.next().is_some() {
            return Err(format!("too many offsets in display '{spec}'"));
        }

        Ok(Self {
            id,
            x: x.unwrap_or(0),
            y: y.unwrap_or(0),
            width,
            height,
            scale,
        })
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_color() -> ColorSpec {
    ColorSpec::Name("#ef4444".to_string())
}

fn default_line_width() -> f64 {
    4.0
}

fn default_arrow_length() -> f64 {
    15.0
}

fn default_arrow_angle() -> f64 {
    30.0
}

fn default_scale() -> f64 {
    1.0
}

pub(super) fn default_displays() -> Vec<DisplayConfig> {
    vec![DisplayConfig {
        id: 0,
        x: 0,
        y: 0,
        width: 1920,
        height: 1080,
        scale: default_scale(),
    }]
}
