use serde::{Deserialize, Serialize};

/// One recognized text fragment with its quadrilateral location, in image
/// pixel coordinates (y grows downward).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Corner points as (x, y). Engines usually emit these clockwise from
    /// the top-left, but no ordering is assumed here.
    pub polygon: [(f32, f32); 4],
    pub text: String,
    /// Engine confidence in 0.0–1.0.
    pub confidence: f32,
}

impl Token {
    pub fn new(polygon: [(f32, f32); 4], text: impl Into<String>, confidence: f32) -> Self {
        Self {
            polygon,
            text: text.into(),
            confidence,
        }
    }

    /// Axis-aligned token from a `(left, top, width, height)` box.
    pub fn from_rect(
        left: f32,
        top: f32,
        width: f32,
        height: f32,
        text: impl Into<String>,
        confidence: f32,
    ) -> Self {
        let right = left + width;
        let bottom = top + height;
        Self::new(
            [(left, top), (right, top), (right, bottom), (left, bottom)],
            text,
            confidence,
        )
    }

    pub fn min_x(&self) -> f32 {
        self.polygon.iter().map(|p| p.0).fold(f32::INFINITY, f32::min)
    }

    pub fn min_y(&self) -> f32 {
        self.polygon.iter().map(|p| p.1).fold(f32::INFINITY, f32::min)
    }

    pub fn max_y(&self) -> f32 {
        self.polygon.iter().map(|p| p.1).fold(f32::NEG_INFINITY, f32::max)
    }

    /// Vertical center of the bounding box.
    pub fn center_y(&self) -> f32 {
        (self.min_y() + self.max_y()) / 2.0
    }

    /// Box height, floored at one pixel so degenerate polygons cannot
    /// zero out the median-derived line tolerance.
    pub fn height(&self) -> f32 {
        (self.max_y() - self.min_y()).max(1.0)
    }
}

/// One reconstructed reading-order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    /// Member token texts joined left to right by single spaces, trimmed.
    pub text: String,
    /// Arithmetic mean of member token confidences.
    pub avg_confidence: f32,
    /// Member tokens in left-to-right order.
    pub tokens: Vec<Token>,
}
