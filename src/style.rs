//! Text styling for watermark blocks
//!
//! Every draw call receives its own immutable [`TextStyle`] value. Overrides
//! go through the `with_*` builders, which return a new style and leave the
//! original untouched.

/// Horizontal alignment of paragraph lines within their wrap box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
}

/// Fill color, each channel in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0.0, g: 0.0, b: 0.0 };
}

/// Style for one watermark text block
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// Base-14 PostScript font name
    pub font_name: &'static str,
    /// Font size in points
    pub font_size: f32,
    pub alignment: Alignment,
    pub color: Rgb,
    /// Constant fill alpha applied via ExtGState, 0.0..=1.0
    pub alpha: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_name: "Helvetica",
            font_size: 14.0,
            alignment: Alignment::Center,
            color: Rgb::BLACK,
            alpha: 0.5,
        }
    }
}

impl TextStyle {
    /// Return a copy of this style with a different font size.
    pub fn with_font_size(self, font_size: f32) -> Self {
        Self { font_size, ..self }
    }

    /// Return a copy of this style with a different alignment.
    pub fn with_alignment(self, alignment: Alignment) -> Self {
        Self { alignment, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_style() {
        let style = TextStyle::default();
        assert_eq!(style.font_name, "Helvetica");
        assert_eq!(style.font_size, 14.0);
        assert_eq!(style.alignment, Alignment::Center);
        assert_eq!(style.color, Rgb::BLACK);
        assert_eq!(style.alpha, 0.5);
    }

    #[test]
    fn test_with_font_size_leaves_base_unchanged() {
        let base = TextStyle::default();
        let bigger = base.clone().with_font_size(24.0);

        assert_eq!(bigger.font_size, 24.0);
        assert_eq!(base.font_size, 14.0);
        // Everything else carries over
        assert_eq!(bigger.alignment, base.alignment);
        assert_eq!(bigger.alpha, base.alpha);
    }

    #[test]
    fn test_with_alignment() {
        let style = TextStyle::default().with_alignment(Alignment::Left);
        assert_eq!(style.alignment, Alignment::Left);
    }
}
