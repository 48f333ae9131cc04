//! In-memory page model produced by the layout pass.
//!
//! Coordinates are in points with the origin at the top-left corner of the
//! page and `y` growing downwards; the writer flips them when emitting PDF
//! operators.

/// Font face of a text run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFace {
    /// Helvetica
    Regular,
    /// Helvetica-Bold
    Bold,
}

/// Text alignment inside a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    /// Flush left
    #[default]
    Left,
    /// Centered
    Center,
    /// Flush right
    Right,
}

/// One drawing instruction
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// A filled rectangle
    Rect {
        /// Left edge
        x: f32,
        /// Top edge
        y: f32,
        /// Width
        width: f32,
        /// Height
        height: f32,
        /// Fill color, components in `0.0..=1.0`
        fill: [f32; 3],
    },
    /// A single line of text
    Text {
        /// Left edge of the run
        x: f32,
        /// Baseline
        y: f32,
        /// Font size in points
        size: f32,
        /// Font face
        face: FontFace,
        /// Text color, components in `0.0..=1.0`
        color: [f32; 3],
        /// The text itself
        text: String,
    },
    /// The logo image
    Logo {
        /// Left edge
        x: f32,
        /// Top edge
        y: f32,
        /// Drawn width
        width: f32,
        /// Drawn height
        height: f32,
    },
}

impl DrawOp {
    /// The text of a [`DrawOp::Text`].
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// A laid-out page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Drawing instructions in painting order
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// All text runs on the page, in painting order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(DrawOp::text)
    }
}

/// Left edge of a run of `width` points aligned inside `x..x + column_width`.
pub(crate) fn aligned_x(align: Align, x: f32, column_width: f32, width: f32, padding: f32) -> f32 {
    match align {
        Align::Left => x + padding,
        Align::Center => x + (column_width - width) / 2.0,
        Align::Right => x + column_width - padding - width,
    }
}
