//! Font metrics backed by fontdue for accurate text measurement during
//! layout.
//!
//! The collection maps a [`FontSelector`] (family is advisory; weight
//! and slant select a face) onto loaded fontdue faces and sums per-glyph
//! advance widths, matching the cursor advancement a painter would use.

use anyhow::{Context, Result};
use fontdue::{Font, FontSettings};

use heron_style::{FontMetrics, FontSelector};

/// Loaded font faces for one family: regular plus optional bold, italic,
/// and bold-italic variants. Lifecycle is owned by the caller and passed
/// into layout explicitly.
pub struct FontCollection {
    regular: Font,
    bold: Option<Font>,
    italic: Option<Font>,
    bold_italic: Option<Font>,
}

impl FontCollection {
    /// Load a collection from raw font file bytes. Only the regular face
    /// is required.
    ///
    /// # Errors
    ///
    /// Returns an error when a provided byte buffer is not a parsable
    /// font file.
    pub fn from_bytes(
        regular: &[u8],
        bold: Option<&[u8]>,
        italic: Option<&[u8]>,
        bold_italic: Option<&[u8]>,
    ) -> Result<Self> {
        let load = |data: &[u8], label: &str| {
            Font::from_bytes(data.to_vec(), FontSettings::default())
                .map_err(|e| anyhow::anyhow!("{e}"))
                .with_context(|| format!("failed to load {label} font face"))
        };
        Ok(Self {
            regular: load(regular, "regular")?,
            bold: bold.map(|d| load(d, "bold")).transpose()?,
            italic: italic.map(|d| load(d, "italic")).transpose()?,
            bold_italic: bold_italic.map(|d| load(d, "bold-italic")).transpose()?,
        })
    }

    /// Pick the loaded face closest to the selector's weight and slant.
    fn face(&self, font: &FontSelector) -> &Font {
        match (font.bold, font.italic) {
            (true, true) => self
                .bold_italic
                .as_ref()
                .or(self.bold.as_ref())
                .or(self.italic.as_ref())
                .unwrap_or(&self.regular),
            (true, false) => self.bold.as_ref().unwrap_or(&self.regular),
            (false, true) => self.italic.as_ref().unwrap_or(&self.regular),
            (false, false) => &self.regular,
        }
    }
}

impl FontMetrics for FontCollection {
    fn line_width(&self, text: &str, font: &FontSelector) -> f32 {
        // Sum per-character advance widths, matching the cursor
        // advancement used when the painter draws the run.
        //
        // Uses Font::metrics() instead of Font::rasterize() to avoid
        // generating bitmaps when only measurements are needed.
        let face = self.face(font);
        text.chars()
            .filter(|ch| !ch.is_control())
            .map(|ch| face.metrics(ch, font.size).advance_width)
            .sum()
    }

    fn line_height(&self, font: &FontSelector) -> f32 {
        // 1.2x the text size, matching common browser defaults for a
        // 'normal' line height.
        font.size * 1.2
    }
}
