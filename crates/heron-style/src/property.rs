//! Flag-tagged property bags and inline style declaration parsing.
//!
//! A [`PropertyBag`] is a sparse set of presentation properties; each
//! property is accompanied by a bit in an explicitly-set mask, and only
//! flagged properties participate in cascading. Unflagged slots are inert
//! placeholders that can never overwrite anything.

use bitflags::bitflags;
use serde::Serialize;

use heron_common::diagnostics::DiagnosticLog;

use crate::color::Rgba;

/// Length unit, inferred from a suffix on the first numeric token and
/// defaulting to pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SizeUnit {
    /// Device-independent pixels (the default).
    #[default]
    Pixel,
    /// Typographic points, 72 per inch (4/3 px each at 96 dpi).
    Point,
    /// Multiples of the current text size.
    Em,
    /// Percentage of a caller-supplied basis.
    Percent,
}

/// A numeric length with its unit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Length {
    /// The numeric magnitude as written.
    pub value: f32,
    /// The unit the magnitude is expressed in.
    pub unit: SizeUnit,
}

impl Length {
    /// A pixel length.
    #[must_use]
    pub const fn px(value: f32) -> Self {
        Self {
            value,
            unit: SizeUnit::Pixel,
        }
    }

    /// Resolve to pixels. `em_basis` is the current text size;
    /// `percent_basis` is the dimension a percentage refers to.
    #[must_use]
    pub fn to_px(&self, em_basis: f32, percent_basis: f32) -> f32 {
        match self.unit {
            SizeUnit::Pixel => self.value,
            SizeUnit::Point => self.value * 96.0 / 72.0,
            SizeUnit::Em => self.value * em_basis,
            SizeUnit::Percent => self.value / 100.0 * percent_basis,
        }
    }

    /// Parse `"12"`, `"12px"`, `"1.5em"`, `"20%"`, `"10pt"`.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        let (number, unit) = split_unit_suffix(token)?;
        Some(Self {
            value: number,
            unit,
        })
    }
}

/// Split a token into its numeric prefix and unit suffix.
fn split_unit_suffix(token: &str) -> Option<(f32, SizeUnit)> {
    let digits_end = token
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(token.len());
    let number: f32 = token[..digits_end].parse().ok()?;
    let unit = match token[digits_end..].trim() {
        "" | "px" => SizeUnit::Pixel,
        "pt" => SizeUnit::Point,
        "em" => SizeUnit::Em,
        "%" => SizeUnit::Percent,
        _ => return None,
    };
    Some((number, unit))
}

/// Per-side lengths for margin, padding, and border width.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Edges {
    /// Top side.
    pub top: Length,
    /// Right side.
    pub right: Length,
    /// Bottom side.
    pub bottom: Length,
    /// Left side.
    pub left: Length,
}

impl Edges {
    /// The same length on all four sides.
    #[must_use]
    pub const fn uniform(length: Length) -> Self {
        Self {
            top: length,
            right: length,
            bottom: length,
            left: length,
        }
    }

    /// Parse the 1-4 token shorthand. All tokens use the unit inferred
    /// from the first token's suffix:
    ///
    /// - 1 token: all sides
    /// - 2 tokens: vertical, horizontal
    /// - 3 tokens: top, horizontal, bottom
    /// - 4 tokens: top, right, bottom, left
    #[must_use]
    pub fn parse_shorthand(value: &str) -> Option<Self> {
        let tokens: Vec<&str> = value.split_ascii_whitespace().collect();
        if tokens.is_empty() || tokens.len() > 4 {
            return None;
        }

        let (first, unit) = split_unit_suffix(tokens[0])?;
        let mut values = vec![first];
        for token in &tokens[1..] {
            // Subsequent tokens may repeat the suffix; the magnitude is
            // what matters, the unit comes from the first token.
            let (v, _) = split_unit_suffix(token)?;
            values.push(v);
        }

        let length = |v: f32| Length { value: v, unit };
        let edges = match values.as_slice() {
            [all] => Self::uniform(length(*all)),
            [vertical, horizontal] => Self {
                top: length(*vertical),
                right: length(*horizontal),
                bottom: length(*vertical),
                left: length(*horizontal),
            },
            [top, horizontal, bottom] => Self {
                top: length(*top),
                right: length(*horizontal),
                bottom: length(*bottom),
                left: length(*horizontal),
            },
            [top, right, bottom, left] => Self {
                top: length(*top),
                right: length(*right),
                bottom: length(*bottom),
                left: length(*left),
            },
            _ => return None,
        };
        Some(edges)
    }
}

/// Border line style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum BorderStyle {
    /// No border drawn.
    #[default]
    None,
    /// A single solid line.
    Solid,
    /// A dashed line.
    Dashed,
    /// A dotted line.
    Dotted,
    /// Two parallel lines.
    Double,
}

impl BorderStyle {
    /// Parse a border-style keyword.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "none" => Some(Self::None),
            "solid" => Some(Self::Solid),
            "dashed" => Some(Self::Dashed),
            "dotted" => Some(Self::Dotted),
            "double" => Some(Self::Double),
            _ => None,
        }
    }
}

bitflags! {
    /// Explicitly-set mask: one bit per property slot in a
    /// [`PropertyBag`]. Only flagged slots cascade.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PropertyFlags: u16 {
        /// Foreground color.
        const COLOR = 1 << 0;
        /// Background color.
        const BACKGROUND = 1 << 1;
        /// Border color.
        const BORDER_COLOR = 1 << 2;
        /// Opacity.
        const OPACITY = 1 << 3;
        /// Font family.
        const FONT_FAMILY = 1 << 4;
        /// Font size.
        const FONT_SIZE = 1 << 5;
        /// Bold weight.
        const BOLD = 1 << 6;
        /// Italic slant.
        const ITALIC = 1 << 7;
        /// Margin edges.
        const MARGIN = 1 << 8;
        /// Border line style.
        const BORDER_STYLE = 1 << 9;
        /// Border width edges.
        const BORDER_WIDTH = 1 << 10;
        /// Padding edges.
        const PADDING = 1 << 11;
        /// Explicit height.
        const HEIGHT = 1 << 12;
        /// Explicit width.
        const WIDTH = 1 << 13;
    }
}

/// A sparse set of presentation properties with an explicitly-set mask.
///
/// Merging copies only flagged properties; everything else in the
/// destination survives untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyBag {
    /// Which slots below are explicitly set.
    pub flags: PropertyFlags,
    /// Foreground color.
    pub color: Rgba,
    /// Background color.
    pub background: Rgba,
    /// Border color.
    pub border_color: Rgba,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// Font family name.
    pub font_family: String,
    /// Font size.
    pub font_size: Length,
    /// Bold weight bit.
    pub bold: bool,
    /// Italic slant bit.
    pub italic: bool,
    /// Margin edges.
    pub margin: Edges,
    /// Border line style.
    pub border_style: BorderStyle,
    /// Border width edges.
    pub border_width: Edges,
    /// Padding edges.
    pub padding: Edges,
    /// Explicit height.
    pub height: Length,
    /// Explicit width.
    pub width: Length,
}

impl PropertyBag {
    /// An empty bag (no flags set).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no property is explicitly set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Merge `source` into `self`: every property flagged in the source
    /// overwrites the destination's value and flag. Unflagged properties
    /// never overwrite.
    pub fn merge_from(&mut self, source: &Self) {
        let f = source.flags;
        if f.contains(PropertyFlags::COLOR) {
            self.color = source.color;
        }
        if f.contains(PropertyFlags::BACKGROUND) {
            self.background = source.background;
        }
        if f.contains(PropertyFlags::BORDER_COLOR) {
            self.border_color = source.border_color;
        }
        if f.contains(PropertyFlags::OPACITY) {
            self.opacity = source.opacity;
        }
        if f.contains(PropertyFlags::FONT_FAMILY) {
            self.font_family = source.font_family.clone();
        }
        if f.contains(PropertyFlags::FONT_SIZE) {
            self.font_size = source.font_size;
        }
        if f.contains(PropertyFlags::BOLD) {
            self.bold = source.bold;
        }
        if f.contains(PropertyFlags::ITALIC) {
            self.italic = source.italic;
        }
        if f.contains(PropertyFlags::MARGIN) {
            self.margin = source.margin;
        }
        if f.contains(PropertyFlags::BORDER_STYLE) {
            self.border_style = source.border_style;
        }
        if f.contains(PropertyFlags::BORDER_WIDTH) {
            self.border_width = source.border_width;
        }
        if f.contains(PropertyFlags::PADDING) {
            self.padding = source.padding;
        }
        if f.contains(PropertyFlags::HEIGHT) {
            self.height = source.height;
        }
        if f.contains(PropertyFlags::WIDTH) {
            self.width = source.width;
        }
        self.flags |= f;
    }
}

/// Parse a `style`-attribute value (or one rule body) into a bag.
///
/// Clauses are `;`-separated `key: value` pairs; key and value are
/// lowercased before dispatch. Unrecognized keys and unparsable values
/// skip the clause and record an error; the rest of the bag still
/// applies.
#[must_use]
pub fn parse_property_bag(raw: &str, log: &mut DiagnosticLog) -> PropertyBag {
    let mut bag = PropertyBag::new();

    for clause in raw.split(';') {
        let clause = clause.trim();
        if clause.is_empty() {
            continue;
        }
        let Some((key, value)) = clause.split_once(':') else {
            log.error(format!("style clause '{clause}' has no ':'"));
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim().to_ascii_lowercase();
        apply_clause(&mut bag, &key, &value, log);
    }

    bag
}

/// Dispatch one `key: value` clause onto the bag.
fn apply_clause(bag: &mut PropertyBag, key: &str, value: &str, log: &mut DiagnosticLog) {
    match key {
        "color" => match Rgba::parse(value) {
            Some(color) => {
                bag.color = color;
                bag.flags |= PropertyFlags::COLOR;
            }
            None => log.error(format!("unparsable color '{value}'")),
        },
        "background" | "background-color" => match Rgba::parse(value) {
            Some(color) => {
                bag.background = color;
                bag.flags |= PropertyFlags::BACKGROUND;
            }
            None => log.error(format!("unparsable background '{value}'")),
        },
        "border-color" => match Rgba::parse(value) {
            Some(color) => {
                bag.border_color = color;
                bag.flags |= PropertyFlags::BORDER_COLOR;
            }
            None => log.error(format!("unparsable border-color '{value}'")),
        },
        "opacity" => match value.parse::<f32>() {
            Ok(opacity) => {
                bag.opacity = opacity.clamp(0.0, 1.0);
                bag.flags |= PropertyFlags::OPACITY;
            }
            Err(_) => log.error(format!("unparsable opacity '{value}'")),
        },
        // Only the recognized keywords set the style bits; anything else
        // (including 'normal' and numeric weights) skips the clause.
        "font-weight" => {
            if value == "bold" {
                bag.bold = true;
                bag.flags |= PropertyFlags::BOLD;
            } else {
                log.error(format!("unsupported font-weight '{value}'"));
            }
        }
        "font-style" => {
            if value == "italic" || value == "oblique" {
                bag.italic = true;
                bag.flags |= PropertyFlags::ITALIC;
            } else {
                log.error(format!("unsupported font-style '{value}'"));
            }
        }
        "font-family" => {
            bag.font_family = value.to_string();
            bag.flags |= PropertyFlags::FONT_FAMILY;
        }
        "font-size" => match Length::parse(value) {
            Some(length) => {
                bag.font_size = length;
                bag.flags |= PropertyFlags::FONT_SIZE;
            }
            None => log.error(format!("unparsable font-size '{value}'")),
        },
        "margin" => match Edges::parse_shorthand(value) {
            Some(edges) => {
                bag.margin = edges;
                bag.flags |= PropertyFlags::MARGIN;
            }
            None => log.error(format!("unparsable margin '{value}'")),
        },
        "padding" => match Edges::parse_shorthand(value) {
            Some(edges) => {
                bag.padding = edges;
                bag.flags |= PropertyFlags::PADDING;
            }
            None => log.error(format!("unparsable padding '{value}'")),
        },
        "border-width" => match Edges::parse_shorthand(value) {
            Some(edges) => {
                bag.border_width = edges;
                bag.flags |= PropertyFlags::BORDER_WIDTH;
            }
            None => log.error(format!("unparsable border-width '{value}'")),
        },
        "border-style" => match BorderStyle::parse(value) {
            Some(style) => {
                bag.border_style = style;
                bag.flags |= PropertyFlags::BORDER_STYLE;
            }
            None => log.error(format!("unsupported border-style '{value}'")),
        },
        "height" => match Length::parse(value) {
            Some(length) => {
                bag.height = length;
                bag.flags |= PropertyFlags::HEIGHT;
            }
            None => log.error(format!("unparsable height '{value}'")),
        },
        "width" => match Length::parse(value) {
            Some(length) => {
                bag.width = length;
                bag.flags |= PropertyFlags::WIDTH;
            }
            None => log.error(format!("unparsable width '{value}'")),
        },
        _ => log.error(format!("unknown property '{key}'")),
    }
}
