//! Font selection and measurement interfaces for layout.
//!
//! Glyph-width measurement is an external collaborator: the engine
//! supplies a [`FontMetrics`] implementation backed by real font data,
//! and layout calls it for line breaking and fragment placement.

use serde::Serialize;

/// The font a run of text is measured and painted with.
///
/// A plain value derived from the formatting state; the metrics provider
/// maps it onto an actual font face.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontSelector {
    /// Font family name.
    pub family: String,
    /// Pixel size (text height).
    pub size: f32,
    /// Bold weight.
    pub bold: bool,
    /// Italic slant.
    pub italic: bool,
    /// Underline decoration (paint-only; does not affect metrics).
    pub underline: bool,
}

/// Font metrics interface for text measurement during layout.
///
/// Implementors provide per-glyph advance widths and line height values.
/// The layout engine calls these to measure text for line breaking and
/// fragment placement; it never touches font data itself.
pub trait FontMetrics {
    /// Measure the total advance width of a text string in the given font.
    ///
    /// This should sum the advance width of each glyph in the string,
    /// matching the cursor advancement used during text rendering.
    fn line_width(&self, text: &str, font: &FontSelector) -> f32;

    /// The line height for the given font.
    fn line_height(&self, font: &FontSelector) -> f32;
}

/// Approximate font metrics using fixed ratios.
///
/// Without access to actual font data we use fixed ratio approximations:
/// the average advance width of Latin glyphs in a proportional font is
/// approximately 0.6x the font size, and line height uses 1.2x, matching
/// common browser defaults for `normal`.
///
/// Used as a fallback when no font is available, and in tests, where the
/// deterministic widths make layout assertions exact.
pub struct ApproximateFontMetrics;

impl FontMetrics for ApproximateFontMetrics {
    fn line_width(&self, text: &str, font: &FontSelector) -> f32 {
        const CHAR_WIDTH_RATIO: f32 = 0.6;
        text.chars().count() as f32 * font.size * CHAR_WIDTH_RATIO
    }

    fn line_height(&self, font: &FontSelector) -> f32 {
        const LINE_HEIGHT_RATIO: f32 = 1.2;
        font.size * LINE_HEIGHT_RATIO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font(size: f32) -> FontSelector {
        FontSelector {
            family: "sans-serif".to_string(),
            size,
            bold: false,
            italic: false,
            underline: false,
        }
    }

    #[test]
    fn test_approximate_width_scales_with_length() {
        let metrics = ApproximateFontMetrics;
        let narrow = metrics.line_width("ab", &font(10.0));
        let wide = metrics.line_width("abcd", &font(10.0));
        assert!((wide - 2.0 * narrow).abs() < 0.001);
    }

    #[test]
    fn test_approximate_line_height() {
        let metrics = ApproximateFontMetrics;
        assert!((metrics.line_height(&font(10.0)) - 12.0).abs() < 0.001);
    }
}
