//! Detector-reported signature regions

use opencv::core::Rect;
use serde::{Deserialize, Serialize};

/// Axis-aligned box reported by a signature detector
///
/// Coordinates are integer source-image pixels with `x1 < x2` and `y1 < y2`,
/// `x2`/`y2` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    /// Detector confidence (0.0-1.0)
    pub confidence: f32,
}

impl Region {
    /// Clamp a raw box to a `width`×`height` image
    ///
    /// Returns `None` when the clamped box has no area. Confidence is
    /// clamped to `[0, 1]`.
    pub fn clamped(x1: i32, y1: i32, x2: i32, y2: i32, confidence: f32, width: i32, height: i32) -> Option<Self> {
        let (x1, x2) = (x1.min(x2).clamp(0, width), x1.max(x2).clamp(0, width));
        let (y1, y2) = (y1.min(y2).clamp(0, height), y1.max(y2).clamp(0, height));
        if x1 >= x2 || y1 >= y2 {
            return None;
        }
        Some(Self {
            x1,
            y1,
            x2,
            y2,
            confidence: confidence.clamp(0.0, 1.0),
        })
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// OpenCV rectangle covering the region
    pub fn rect(&self) -> Rect {
        Rect::new(self.x1, self.y1, self.width(), self.height())
    }
}
