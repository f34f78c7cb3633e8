use serde::{Deserialize, Serialize};

use crate::theme::ThemeToken;
use crate::types::{Point, Rect};

/// A single, stateless render instruction.
///
/// The core emits a `Vec<RenderCommand>` for each view. Renderers consume
/// this list sequentially and later commands paint over earlier ones, so the
/// order of the list is the layer order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RenderCommand {
    /// Draw a filled rectangle, optionally rounded and optionally bordered.
    /// The border is painted after the fill.
    DrawRect {
        rect: Rect,
        color: ThemeToken,
        border_color: Option<ThemeToken>,
        corner_radius: f64,
    },

    /// Draw a filled ellipse (a circle when both radii match), optionally
    /// bordered.
    DrawEllipse {
        center: Point,
        radius: Point,
        color: ThemeToken,
        border_color: Option<ThemeToken>,
    },

    /// Stroke an open path through `points`.
    DrawPolyline {
        points: Vec<Point>,
        color: ThemeToken,
        width: f64,
        cap: LineCap,
        dash: Option<Dash>,
    },

    /// Draw a text string. `position` is the anchor on the vertical center
    /// of the text run; `align` picks which horizontal edge it anchors.
    DrawText {
        position: Point,
        text: String,
        color: ThemeToken,
        font_size: f64,
        align: TextAlign,
    },

    /// Begin a logical group (a layer, or a single vehicle). Renderers may
    /// use this for batching or hit-testing; it has no visual effect.
    BeginGroup { id: String, label: Option<String> },

    /// End the current group.
    EndGroup,
}

/// Stroke end style. `Round` also implies round joins between segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineCap {
    Butt,
    Round,
}

/// On/off dash pattern in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dash {
    pub on: f64,
    pub off: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}
