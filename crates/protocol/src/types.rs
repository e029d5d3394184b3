use std::fmt;

use serde::{Deserialize, Serialize};

/// Inner size of the window, in CSS pixels, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Round each axis independently to whole pixels.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: round_px(self.width),
            height: round_px(self.height),
        }
    }
}

fn round_px(v: f64) -> u32 {
    if v.is_finite() {
        v.round().clamp(0.0, f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

/// Whole-pixel viewport size. Displays as the label text, e.g. `1024px × 769px`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px × {}px", self.width, self.height)
    }
}
