//! Utility functions for colors and stroke geometry.
//!
//! This module provides:
//! - Name-to-color mapping for configuration and palette swatches
//! - Arrowhead geometry calculations
//! - Circle radius and rectangle extents used by the preview engine

use crate::draw::{Color, color::*};

// ============================================================================
// Arrowhead Geometry
// ============================================================================

/// Calculates the two arrowhead segment endpoints for an arrow ending at `to`.
///
/// Each segment starts at the tip and leaves along the reversed line direction
/// rotated by `±angle_degrees`. `length` is in logical pixels; callers draw on
/// a density-scaled canvas so the head keeps its visual size on HiDPI outputs.
///
/// # Arguments
/// * `from` - Arrow tail
/// * `to` - Arrow tip
/// * `length` - Length of each head segment in logical pixels
/// * `angle_degrees` - Angle between each head segment and the shaft
///
/// # Returns
/// `[first, second]` endpoints; the first is rotated clockwise from the
/// reversed direction in screen coordinates.
pub fn arrowhead_points(
    from: (f64, f64),
    to: (f64, f64),
    length: f64,
    angle_degrees: f64,
) -> [(f64, f64); 2] {
    let heading = (to.1 - from.1).atan2(to.0 - from.0);
    let spread = angle_degrees.to_radians();

    let first = (
        to.0 - length * (heading - spread).cos(),
        to.1 - length * (heading - spread).sin(),
    );
    let second = (
        to.0 - length * (heading + spread).cos(),
        to.1 - length * (heading + spread).sin(),
    );

    [first, second]
}

/// Euclidean distance between two points; the radius of a circle stroke.
pub fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (b.0 - a.0).hypot(b.1 - a.1)
}

/// Signed width/height of the rectangle spanned from `anchor` to `current`.
///
/// Negative extents are preserved; the renderer handles either direction.
pub fn rect_extent(anchor: (f64, f64), current: (f64, f64)) -> (f64, f64, f64, f64) {
    (anchor.0, anchor.1, current.0 - anchor.0, current.1 - anchor.1)
}

// ============================================================================
// Color Mapping
// ============================================================================

/// Maps color name strings to Color values.
///
/// # Supported Names (case-insensitive)
/// - "red", "green", "blue", "yellow", "orange", "pink", "white", "black"
pub fn name_to_color(name: &str) -> Option<Color> {
    match name.to_lowercase().as_str() {
        "red" => Some(RED),
        "green" => Some(GREEN),
        "blue" => Some(BLUE),
        "yellow" => Some(YELLOW),
        "orange" => Some(ORANGE),
        "pink" => Some(PINK),
        "white" => Some(WHITE),
        "black" => Some(BLACK),
        _ => None,
    }
}
