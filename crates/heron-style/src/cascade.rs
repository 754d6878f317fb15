//! Cascade resolution: ordering property bags for a node and applying
//! them onto the live formatting state.
//!
//! For a given node the applicable bags are ordered global-before-local:
//! the stylesheet entry for the bare tag, then `tag.class` entries for
//! each class in document order, then the node's own inline bag. Applying
//! walks that list front to back, so later bags win ties and inline
//! always overrides matching global rules.
//!
//! Application has no knowledge of geometry; it only mutates paint and
//! text attributes on the [`FormattingState`]. Scoping is the caller's
//! job: the state is cloned on entry to a block element and restored on
//! exit, which is the sole inheritance mechanism.

use std::collections::HashMap;

use bitflags::bitflags;

use heron_common::diagnostics::DiagnosticLog;
use heron_dom::{MarkupTree, NodeId, NodeKind};

use crate::color::Rgba;
use crate::layout::fonts::FontSelector;
use crate::property::{BorderStyle, Edges, Length, PropertyBag, PropertyFlags, parse_property_bag};
use crate::stylesheet::StyleSheet;

bitflags! {
    /// Which groups of formatting-state fields a cascade application may
    /// touch. Callers request only what the current element consumes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ApplyCategories: u8 {
        /// Foreground color and opacity.
        const COLORS = 1 << 0;
        /// Font family, size, and style bits.
        const FONTS = 1 << 1;
        /// Background, border, box edges, and explicit dimensions
        /// (box-producing elements only).
        const BOX = 1 << 2;
    }
}

/// The live, mutable cascade accumulator carried through the tree walk.
///
/// Cloned on entry to a block element and written back on exit; there is
/// no global style state anywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattingState {
    /// Current foreground color.
    pub color: Rgba,
    /// Current background, when one was explicitly set.
    pub background: Option<Rgba>,
    /// Current opacity in `[0, 1]`.
    pub opacity: f32,
    /// Current font family.
    pub font_family: String,
    /// Current text height in pixels.
    pub text_size: f32,
    /// Bold style bit.
    pub bold: bool,
    /// Italic style bit.
    pub italic: bool,
    /// Underline style bit.
    pub underline: bool,
    /// Super/subscript baseline offset in pixels (positive moves down).
    pub baseline_shift: f32,
    /// Border line style for the current box.
    pub border_style: BorderStyle,
    /// Border width edges for the current box.
    pub border_width: Edges,
    /// Border color for the current box.
    pub border_color: Rgba,
    /// Padding edges for the current box.
    pub padding: Edges,
    /// Margin edges for the current box.
    pub margin: Edges,
    /// Explicit height, when set on the current box.
    pub box_height: Option<Length>,
    /// Explicit width, when set on the current box.
    pub box_width: Option<Length>,
}

impl FormattingState {
    /// Initial state from the layout defaults.
    #[must_use]
    pub fn new(text_size: f32, color: Rgba, opacity: f32) -> Self {
        Self {
            color,
            background: None,
            opacity,
            font_family: "sans-serif".to_string(),
            text_size,
            bold: false,
            italic: false,
            underline: false,
            baseline_shift: 0.0,
            border_style: BorderStyle::None,
            border_width: Edges::default(),
            border_color: color,
            padding: Edges::default(),
            margin: Edges::default(),
            box_height: None,
            box_width: None,
        }
    }

    /// The font the current state selects, for measurement and fragments.
    #[must_use]
    pub fn font(&self) -> FontSelector {
        FontSelector {
            family: self.font_family.clone(),
            size: self.text_size,
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
        }
    }

    /// Reset the per-box fields on entry to a new box-producing element,
    /// so a parent's border or margin never leaks into a child box.
    pub fn clear_box(&mut self) {
        self.background = None;
        self.border_style = BorderStyle::None;
        self.border_width = Edges::default();
        self.padding = Edges::default();
        self.margin = Edges::default();
        self.box_height = None;
        self.box_width = None;
    }
}

/// Per-document side table of inline `style`-attribute bags, keyed by
/// node id and collected once per parse.
#[derive(Debug, Clone, Default)]
pub struct InlineStyles {
    map: HashMap<NodeId, PropertyBag>,
}

impl InlineStyles {
    /// Parse the `style` attribute of every stylable element in the tree.
    #[must_use]
    pub fn collect(tree: &MarkupTree, log: &mut DiagnosticLog) -> Self {
        let mut map = HashMap::new();
        for index in 0..tree.len() {
            let id = NodeId(index);
            let Some(node) = tree.get(id) else { continue };
            if !node.traits().stylable {
                continue;
            }
            if let Some(raw) = node.attribute("style") {
                let bag = parse_property_bag(raw, log);
                if !bag.is_empty() {
                    let _ = map.insert(id, bag);
                }
            }
        }
        Self { map }
    }

    /// The inline bag for a node, if it has one.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&PropertyBag> {
        self.map.get(&id)
    }
}

/// Collect the ordered list of property bags applicable to a node:
/// stylesheet entry for the bare tag, then `tag.class` entries for each
/// space-separated class in document order, then the inline bag.
///
/// Non-stylable kinds resolve to nothing.
#[must_use]
pub fn resolve<'a>(
    sheet: &'a StyleSheet,
    inline: &'a InlineStyles,
    tree: &MarkupTree,
    id: NodeId,
) -> Vec<&'a PropertyBag> {
    let Some(node) = tree.get(id) else {
        return Vec::new();
    };
    if !node.traits().stylable {
        return Vec::new();
    }

    let tag = tag_key(&node.kind);
    let mut bags = Vec::new();

    if let Some(bag) = sheet.get(&tag) {
        bags.push(bag);
    }
    for class in node.classes() {
        let key = format!("{tag}.{}", class.to_ascii_lowercase());
        if let Some(bag) = sheet.get(&key) {
            bags.push(bag);
        }
    }
    if let Some(bag) = inline.get(id) {
        bags.push(bag);
    }

    bags
}

/// The stylesheet key for a node kind: its tag name, lowercased.
fn tag_key(kind: &NodeKind) -> String {
    kind.to_string().to_ascii_lowercase()
}

/// Apply an ordered bag list onto the formatting state.
///
/// Only fields whose flag is set AND whose category is requested are
/// overwritten; later bags in the list win ties.
pub fn apply_to_state(
    bags: &[&PropertyBag],
    categories: ApplyCategories,
    state: &mut FormattingState,
) {
    for bag in bags {
        let f = bag.flags;

        if categories.contains(ApplyCategories::COLORS) {
            if f.contains(PropertyFlags::COLOR) {
                state.color = bag.color;
            }
            if f.contains(PropertyFlags::OPACITY) {
                state.opacity = bag.opacity;
            }
        }

        if categories.contains(ApplyCategories::FONTS) {
            if f.contains(PropertyFlags::FONT_FAMILY) {
                state.font_family = bag.font_family.clone();
            }
            if f.contains(PropertyFlags::FONT_SIZE) {
                // Relative sizes resolve against the inherited size.
                state.text_size = bag.font_size.to_px(state.text_size, state.text_size);
            }
            if f.contains(PropertyFlags::BOLD) {
                state.bold = bag.bold;
            }
            if f.contains(PropertyFlags::ITALIC) {
                state.italic = bag.italic;
            }
        }

        if categories.contains(ApplyCategories::BOX) {
            if f.contains(PropertyFlags::BACKGROUND) {
                state.background = Some(bag.background);
            }
            if f.contains(PropertyFlags::BORDER_COLOR) {
                state.border_color = bag.border_color;
            }
            if f.contains(PropertyFlags::BORDER_STYLE) {
                state.border_style = bag.border_style;
            }
            if f.contains(PropertyFlags::BORDER_WIDTH) {
                state.border_width = bag.border_width;
            }
            if f.contains(PropertyFlags::PADDING) {
                state.padding = bag.padding;
            }
            if f.contains(PropertyFlags::MARGIN) {
                state.margin = bag.margin;
            }
            if f.contains(PropertyFlags::HEIGHT) {
                state.box_height = Some(bag.height);
            }
            if f.contains(PropertyFlags::WIDTH) {
                state.box_width = Some(bag.width);
            }
        }
    }
}
