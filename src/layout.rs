//! Page geometry
//!
//! The overlay anchors are specified in inches from the page's bottom-left
//! origin while PDF content streams speak points, so lengths are stored in
//! points (1/72 inch).

/// Length in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length(pub f32);

impl Length {
    /// Create a length from points
    pub fn from_pt(pt: f32) -> Self {
        Length(pt)
    }

    /// Create a length from inches
    pub fn from_inches(inches: f32) -> Self {
        Length(inches * 72.0)
    }

    /// Get the value in points
    pub fn pt(&self) -> f32 {
        self.0
    }
}

/// Page dimensions in points
#[derive(Debug, Clone, Copy)]
pub struct PageDimensions {
    pub width: Length,
    pub height: Length,
}

impl PageDimensions {
    /// US Letter size (8.5" x 11" = 612pt x 792pt)
    pub fn letter() -> Self {
        Self {
            width: Length::from_inches(8.5),
            height: Length::from_inches(11.0),
        }
    }
}

/// A text block anchor, measured from the page's bottom-left origin
#[derive(Debug, Clone, Copy)]
pub struct Anchor {
    pub x: Length,
    pub y: Length,
}

impl Anchor {
    pub fn from_inches(x: f32, y: f32) -> Self {
        Self {
            x: Length::from_inches(x),
            y: Length::from_inches(y),
        }
    }
}
