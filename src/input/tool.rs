//! Drawing tool selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Drawing tool selection.
///
/// The active tool determines what a pointer drag produces. `Cursor` is the
/// only non-drawing tool: while it is active the overlay is click-through and
/// ignores pointer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Pass-through pointer; nothing is drawn
    #[default]
    Cursor,
    /// Freehand drawing - strokes follow the pointer
    Pen,
    /// Rectangle outline - from corner to corner
    Rect,
    /// Arrow with a two-segment head at the release point
    Arrow,
    /// Circle outline - centered on the press point
    Circle,
}

impl Tool {
    /// Every tool, in palette order.
    pub const ALL: [Tool; 5] = [Tool::Cursor, Tool::Pen, Tool::Arrow, Tool::Rect, Tool::Circle];

    /// Whether pointer gestures with this tool produce strokes.
    pub fn draws(self) -> bool {
        !matches!(self, Tool::Cursor)
    }

    /// Identifier used on the wire and in scripts.
    pub fn as_str(self) -> &'static str {
        match self {
            Tool::Cursor => "cursor",
            Tool::Pen => "pen",
            Tool::Rect => "rect",
            Tool::Arrow => "arrow",
            Tool::Circle => "circle",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tool::ALL
            .into_iter()
            .find(|tool| tool.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown tool '{s}'"))
    }
}
