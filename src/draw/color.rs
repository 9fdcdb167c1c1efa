//! RGBA color type, palette constants, and CSS-style parsing.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Represents an RGBA color with floating-point components.
///
/// All components are in the range 0.0 (minimum) to 1.0 (maximum).
///
/// # Examples
///
/// ```
/// use overscribe::draw::Color;
/// let red: Color = "#ef4444".parse().unwrap();
/// assert_eq!(red.to_hex(), "#ef4444");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Color {
    /// Red component (0.0 = no red, 1.0 = full red)
    pub r: f64,
    /// Green component
    pub g: f64,
    /// Blue component
    pub b: f64,
    /// Alpha/transparency (0.0 = fully transparent, 1.0 = fully opaque)
    pub a: f64,
}

/// Errors produced when a color string cannot be understood.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("empty color string")]
    Empty,
    #[error("invalid hex color '{0}' (expected #rgb or #rrggbb)")]
    InvalidHex(String),
    #[error("unknown color name '{0}'")]
    UnknownName(String),
}

impl Color {
    /// Creates a new color from RGBA components.
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color from 8-bit channels.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
            a: 1.0,
        }
    }

    /// Formats the color as `#rrggbb`, ignoring alpha.
    pub fn to_hex(&self) -> String {
        let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            channel(self.r),
            channel(self.g),
            channel(self.b)
        )
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        if !hex.is_ascii() {
            return None;
        }
        match hex.len() {
            3 => {
                let mut channels = [0u8; 3];
                for (slot, digit) in channels.iter_mut().zip(hex.chars()) {
                    let value = digit.to_digit(16)? as u8;
                    *slot = value * 17;
                }
                Some(Self::from_rgb8(channels[0], channels[1], channels[2]))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::from_rgb8(r, g, b))
            }
            _ => None,
        }
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    /// Accepts `#rgb`, `#rrggbb`, or one of the palette names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ColorParseError::Empty);
        }
        if let Some(hex) = s.strip_prefix('#') {
            return Self::parse_hex(hex).ok_or_else(|| ColorParseError::InvalidHex(s.to_string()));
        }
        crate::util::name_to_color(s).ok_or_else(|| ColorParseError::UnknownName(s.to_string()))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ============================================================================
// Palette colors (the swatches offered by the floating palette)
// ============================================================================

/// Default stroke color (#ef4444)
pub const RED: Color = Color::new(239.0 / 255.0, 68.0 / 255.0, 68.0 / 255.0, 1.0);

/// #22c55e
pub const GREEN: Color = Color::new(34.0 / 255.0, 197.0 / 255.0, 94.0 / 255.0, 1.0);

/// #3b82f6
pub const BLUE: Color = Color::new(59.0 / 255.0, 130.0 / 255.0, 246.0 / 255.0, 1.0);

/// #eab308
pub const YELLOW: Color = Color::new(234.0 / 255.0, 179.0 / 255.0, 8.0 / 255.0, 1.0);

/// #f97316
pub const ORANGE: Color = Color::new(249.0 / 255.0, 115.0 / 255.0, 22.0 / 255.0, 1.0);

/// #ec4899
pub const PINK: Color = Color::new(236.0 / 255.0, 72.0 / 255.0, 153.0 / 255.0, 1.0);

pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        let long: Color = "#ff0000".parse().unwrap();
        assert_eq!(long, Color::new(1.0, 0.0, 0.0, 1.0));

        let short: Color = "#f00".parse().unwrap();
        assert_eq!(short, long);
    }

    #[test]
    fn palette_constants_round_trip_through_hex() {
        assert_eq!(RED.to_hex(), "#ef4444");
        assert_eq!(GREEN.to_hex(), "#22c55e");
        assert_eq!("#3b82f6".parse::<Color>().unwrap().to_hex(), BLUE.to_hex());
    }

    #[test]
    fn named_colors_are_case_insensitive() {
        assert_eq!("Yellow".parse::<Color>().unwrap(), YELLOW);
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!("".parse::<Color>(), Err(ColorParseError::Empty));
        assert!(matches!(
            "#12345".parse::<Color>(),
            Err(ColorParseError::InvalidHex(_))
        ));
        assert!(matches!(
            "#gg0000".parse::<Color>(),
            Err(ColorParseError::InvalidHex(_))
        ));
        assert!(matches!(
            "mauve".parse::<Color>(),
            Err(ColorParseError::UnknownName(_))
        ));
    }
}
