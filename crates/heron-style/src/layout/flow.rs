//! The flow layout engine.
//!
//! A single recursive pass over the node tree that turns it into the
//! ordered fragment sequence. The walk carries an evolving cursor (the
//! rectangle still available, the current line's extra height, and the
//! pen position on the line) plus three margin-collapse carry flags,
//! threaded as an explicit [`FlowCarry`] struct so the contract is
//! visible at every call site.
//!
//! Scoping is structural: the formatting state is cloned on entry to a
//! block element and written back on exit, and the area's side edges are
//! saved and restored around children. The top edge only ever advances.
//!
//! Layout never aborts. Zero available width, empty text, and missing
//! table rows all degrade to zero-sized or best-effort fragments.

use heron_dom::{MarkupTree, NodeId, NodeKind};

use crate::cascade::{ApplyCategories, FormattingState, InlineStyles, apply_to_state, resolve};
use crate::color::Rgba;
use crate::stylesheet::StyleSheet;

use super::fonts::FontMetrics;
use super::fragment::{Fragment, FragmentKind, Rect};
use super::images::ImageProvider;
use super::linebreak::find_break;
use super::list::{ListContext, forced_style};
use super::table::{
    CELL_SPACING, ColumnRequest, TableCellMetric, TableMetric, TableRow, TableRowMetric,
    collect_structure, column_offsets, preferred_column_sizes,
};

/// Indent applied to list items, per nesting level.
const LIST_INDENT: f32 = 24.0;

/// Gap between a bullet marker and the item's text origin.
const BULLET_GAP: f32 = 6.0;

/// Indent applied to both sides of a quotation block.
const QUOTE_INDENT: f32 = 24.0;

/// Default hyperlink colors (normal, visited, active).
const LINK_COLOR: Rgba = Rgba::rgb(0x00, 0x00, 0xee);
const LINK_VISITED: Rgba = Rgba::rgb(0x55, 0x1a, 0x8b);
const LINK_ACTIVE: Rgba = Rgba::rgb(0xee, 0x00, 0x00);

/// Parameters of one layout pass, owned by the caller.
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    /// Available width in pixels.
    pub width: f32,
    /// Available height in pixels (informational; flow grows downward).
    pub height: f32,
    /// Default text size in pixels.
    pub text_size: f32,
    /// Default foreground color.
    pub color: Rgba,
    /// Default opacity.
    pub opacity: f32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            text_size: 16.0,
            color: Rgba::BLACK,
            opacity: 1.0,
        }
    }
}

/// The three margin-collapse flags threaded through the walk.
///
/// Modeled as one explicit struct (not out-parameters) so every call
/// site shows which flags it reads and writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowCarry {
    /// The predecessor already provided trailing vertical space, so the
    /// next block suppresses its own leading space.
    pub trailing_space: bool,
    /// The enclosing container suppresses its first child's leading
    /// space (the first child starts flush).
    pub suppress_leading: bool,
    /// The current line holds unflushed inline content that a following
    /// text run may extend instead of forcing a line break.
    pub open_run: bool,
}

/// The evolving cursor: what is left of the output area, plus the
/// current line's accumulated state.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    /// The rectangle still available. `top` advances as content is
    /// placed; `left`/`right` are scoped per element and restored.
    area: Rect,
    /// Vertical growth of the current line caused by oversized inline
    /// content (images taller than the text line).
    line_extra: f32,
    /// Horizontal pen position on the current line, relative to
    /// `area.left`.
    run_length: f32,
}

/// Result of one layout pass.
#[derive(Debug, Clone)]
pub struct LayoutResult {
    /// Positioned fragments in paint order.
    pub fragments: Vec<Fragment>,
    /// Total occupied size: max right edge reached, final bottom edge.
    pub occupied: (f32, f32),
}

/// One flow layout pass over a parsed document.
pub struct FlowLayout<'a> {
    tree: &'a MarkupTree,
    sheet: &'a StyleSheet,
    inline: &'a InlineStyles,
    metrics: &'a dyn FontMetrics,
    images: &'a dyn ImageProvider,

    fragments: Vec<Fragment>,
    /// Nested list numbering contexts.
    lists: Vec<ListContext>,
    /// Nested table metrics (innermost last).
    tables: Vec<TableMetric>,
    /// Nested `<pre>` counter; non-zero means explicit newlines break.
    pre_depth: u32,
    /// Index of the first fragment on the current line, for the
    /// retroactive shift when an image raises the line.
    line_start: usize,
    /// Rightmost edge any fragment reached.
    max_right: f32,
}

impl<'a> FlowLayout<'a> {
    /// Create a pass over the given document and collaborators.
    #[must_use]
    pub fn new(
        tree: &'a MarkupTree,
        sheet: &'a StyleSheet,
        inline: &'a InlineStyles,
        metrics: &'a dyn FontMetrics,
        images: &'a dyn ImageProvider,
    ) -> Self {
        Self {
            tree,
            sheet,
            inline,
            metrics,
            images,
            fragments: Vec::new(),
            lists: Vec::new(),
            tables: Vec::new(),
            pre_depth: 0,
            line_start: 0,
            max_right: 0.0,
        }
    }

    /// Run the pass: walk the tree and produce the fragment sequence.
    #[must_use]
    pub fn run(mut self, options: &LayoutOptions) -> LayoutResult {
        let mut state = FormattingState::new(options.text_size, options.color, options.opacity);
        let mut cursor = Cursor {
            area: Rect::new(0.0, 0.0, options.width, options.height),
            line_extra: 0.0,
            run_length: 0.0,
        };
        let mut carry = FlowCarry {
            suppress_leading: true,
            ..FlowCarry::default()
        };

        let tree = self.tree;
        for &child in tree.children(tree.root()) {
            self.layout_node(child, &mut state, &mut cursor, &mut carry);
        }
        if cursor.run_length > 0.0 {
            self.line_break(&state, &mut cursor, &mut carry);
        }

        LayoutResult {
            occupied: (self.max_right, cursor.area.top),
            fragments: self.fragments,
        }
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    fn layout_node(
        &mut self,
        id: NodeId,
        state: &mut FormattingState,
        cursor: &mut Cursor,
        carry: &mut FlowCarry,
    ) {
        let kind = self.tree.kind(id).clone();
        match kind {
            NodeKind::Document => {
                let tree = self.tree;
                for &child in tree.children(id) {
                    self.layout_node(child, state, cursor, carry);
                }
            }
            // Style and script payloads never paint.
            NodeKind::StyleBlock | NodeKind::Script => {}

            NodeKind::Text => self.layout_text(id, state, cursor, carry),
            NodeKind::Br => {
                self.line_break(state, cursor, carry);
            }
            NodeKind::Hr => self.layout_rule(id, state, cursor, carry),
            NodeKind::Img => self.layout_image(id, state, cursor, carry),

            NodeKind::Span
            | NodeKind::Bold
            | NodeKind::Italic
            | NodeKind::Underline
            | NodeKind::Strong
            | NodeKind::Em
            | NodeKind::Sub
            | NodeKind::Sup
            | NodeKind::Unknown(_) => self.layout_inline(id, &kind, state, cursor, carry),
            NodeKind::Anchor => self.layout_link(id, state, cursor, carry),

            NodeKind::Ul => self.layout_list(id, false, state, cursor, carry),
            NodeKind::Ol => self.layout_list(id, true, state, cursor, carry),
            NodeKind::Li => self.layout_list_item(id, state, cursor, carry),

            NodeKind::Table => self.layout_table(id, state, cursor, carry),

            NodeKind::Pre => {
                self.pre_depth += 1;
                self.layout_block(id, &kind, None, state, cursor, carry);
                self.pre_depth -= 1;
            }

            // Row groups and cells reached outside a table (mis-nested
            // input) lay out as plain blocks.
            NodeKind::Html
            | NodeKind::Body
            | NodeKind::Div
            | NodeKind::Blockquote
            | NodeKind::P
            | NodeKind::H1
            | NodeKind::H2
            | NodeKind::H3
            | NodeKind::H4
            | NodeKind::H5
            | NodeKind::H6
            | NodeKind::Code
            | NodeKind::THead
            | NodeKind::TBody
            | NodeKind::TFoot
            | NodeKind::Tr
            | NodeKind::Td
            | NodeKind::Th => self.layout_block(id, &kind, None, state, cursor, carry),
        }
    }

    // =========================================================================
    // Lines and text
    // =========================================================================

    /// Close the current line: advance the top edge by one line height
    /// plus the line's extra height, and reset the pen.
    fn line_break(&mut self, state: &FormattingState, cursor: &mut Cursor, carry: &mut FlowCarry) {
        let line_height = self.metrics.line_height(&state.font());
        cursor.area.top += line_height + cursor.line_extra;
        cursor.line_extra = 0.0;
        cursor.run_length = 0.0;
        carry.open_run = false;
        self.line_start = self.fragments.len();
    }

    fn push_fragment(&mut self, fragment: Fragment) -> usize {
        self.max_right = self.max_right.max(fragment.bounds.right);
        let index = self.fragments.len();
        self.fragments.push(fragment);
        index
    }

    /// Place the text payload of a text node, breaking lines greedily.
    fn layout_text(
        &mut self,
        id: NodeId,
        state: &mut FormattingState,
        cursor: &mut Cursor,
        carry: &mut FlowCarry,
    ) {
        let tree = self.tree;
        let Some(text) = tree.as_text(id) else { return };
        if text.is_empty() {
            return;
        }

        let font = state.font();
        let line_height = self.metrics.line_height(&font);
        let preformatted = self.pre_depth > 0;
        let mut rest = text;

        loop {
            if !preformatted && cursor.run_length == 0.0 {
                // Collapsible whitespace never starts a line.
                rest = rest.trim_start_matches([' ', '\t', '\r', '\n']);
            }
            if rest.is_empty() {
                break;
            }

            let available = cursor.area.width() - cursor.run_length;
            let full = self.metrics.line_width(rest, &font);
            let newline_pending = preformatted && rest.contains(['\r', '\n']);

            if full <= available && !newline_pending {
                self.place_run(id, rest, full, state, cursor, &font, line_height);
                cursor.run_length += full;
                carry.open_run = true;
                break;
            }

            let offset = find_break(rest, available, &font, self.metrics, preformatted);
            if offset == 0 {
                break;
            }
            let head = &rest[..offset];
            let head_width = self.metrics.line_width(head, &font);

            // An unbreakable head that does not fit wraps to a fresh
            // line first; only at column zero may it overflow.
            if head_width > available && cursor.run_length > 0.0 {
                self.line_break(state, cursor, carry);
                continue;
            }

            let visual = head.trim_end_matches(['\r', '\n']);
            let visual_width = if visual.len() == head.len() {
                head_width
            } else {
                self.metrics.line_width(visual, &font)
            };
            if !visual.is_empty() {
                self.place_run(id, visual, visual_width, state, cursor, &font, line_height);
                cursor.run_length += visual_width;
            }
            self.line_break(state, cursor, carry);
            rest = &rest[offset..];
        }

        carry.suppress_leading = false;
    }

    #[allow(clippy::too_many_arguments)]
    fn place_run(
        &mut self,
        node: NodeId,
        text: &str,
        width: f32,
        state: &FormattingState,
        cursor: &Cursor,
        font: &super::fonts::FontSelector,
        line_height: f32,
    ) {
        let left = cursor.area.left + cursor.run_length;
        let top = cursor.area.top + cursor.line_extra + state.baseline_shift;
        let _ = self.push_fragment(Fragment {
            bounds: Rect::new(left, top, left + width, top + line_height),
            color: state.color,
            background: state.background,
            opacity: state.opacity,
            border_style: crate::property::BorderStyle::None,
            border_width: 0.0,
            border_color: state.color,
            node: Some(node),
            selected: false,
            kind: FragmentKind::Text {
                text: text.to_string(),
                font: font.clone(),
                run_length: width,
            },
        });
    }

    // =========================================================================
    // Inline elements
    // =========================================================================

    /// Lay out a purely inline container: cascade colors and fonts, apply
    /// the kind's intrinsic style bits, recurse, restore. The line is
    /// never reset.
    fn layout_inline(
        &mut self,
        id: NodeId,
        kind: &NodeKind,
        state: &mut FormattingState,
        cursor: &mut Cursor,
        carry: &mut FlowCarry,
    ) {
        let saved = state.clone();

        let bags = resolve(self.sheet, self.inline, self.tree, id);
        apply_to_state(
            &bags,
            ApplyCategories::COLORS | ApplyCategories::FONTS,
            state,
        );

        match kind {
            NodeKind::Bold | NodeKind::Strong => state.bold = true,
            NodeKind::Italic | NodeKind::Em => state.italic = true,
            NodeKind::Underline => state.underline = true,
            NodeKind::Sub => {
                state.baseline_shift += saved.text_size * 0.25;
                state.text_size *= 0.8;
            }
            NodeKind::Sup => {
                state.baseline_shift -= saved.text_size * 0.4;
                state.text_size *= 0.8;
            }
            _ => {}
        }

        let tree = self.tree;
        for &child in tree.children(id) {
            self.layout_node(child, state, cursor, carry);
        }

        *state = saved;
        carry.suppress_leading = false;
    }

    /// Lay out a hyperlink: an inline container that additionally emits
    /// one link fragment covering the region its content spans.
    fn layout_link(
        &mut self,
        id: NodeId,
        state: &mut FormattingState,
        cursor: &mut Cursor,
        carry: &mut FlowCarry,
    ) {
        let tree = self.tree;
        let href = tree
            .get(id)
            .and_then(|n| n.attribute("href"))
            .unwrap_or("")
            .to_string();

        let saved = state.clone();
        state.color = LINK_COLOR;
        state.underline = true;
        let bags = resolve(self.sheet, self.inline, self.tree, id);
        apply_to_state(
            &bags,
            ApplyCategories::COLORS | ApplyCategories::FONTS,
            state,
        );

        let start_top = cursor.area.top;
        let start_x = cursor.area.left + cursor.run_length;
        let line_height = self.metrics.line_height(&state.font());

        let link_index = self.push_fragment(Fragment {
            bounds: Rect::new(start_x, start_top, start_x, start_top),
            color: state.color,
            background: state.background,
            opacity: state.opacity,
            border_style: crate::property::BorderStyle::None,
            border_width: 0.0,
            border_color: state.color,
            node: Some(id),
            selected: false,
            kind: FragmentKind::Link {
                href,
                visited_color: LINK_VISITED,
                active_color: LINK_ACTIVE,
            },
        });

        for &child in tree.children(id) {
            self.layout_node(child, state, cursor, carry);
        }

        // Close the link region: on one line it is the exact span; when
        // the content wrapped it widens to the area's side edges.
        let end_x = cursor.area.left + cursor.run_length;
        let bounds = if (cursor.area.top - start_top).abs() < f32::EPSILON {
            Rect::new(
                start_x,
                start_top,
                end_x,
                start_top + line_height + cursor.line_extra,
            )
        } else {
            Rect::new(
                cursor.area.left,
                start_top,
                cursor.area.right,
                cursor.area.top + line_height + cursor.line_extra,
            )
        };
        self.fragments[link_index].bounds = bounds;
        self.max_right = self.max_right.max(bounds.right);

        *state = saved;
        carry.suppress_leading = false;
    }

    // =========================================================================
    // Images
    // =========================================================================

    /// Place an image: collaborator intrinsic size, attribute overrides,
    /// line-break forcing, and the retroactive same-line shift when the
    /// image is taller than the text line.
    fn layout_image(
        &mut self,
        id: NodeId,
        state: &mut FormattingState,
        cursor: &mut Cursor,
        carry: &mut FlowCarry,
    ) {
        let tree = self.tree;
        let Some(node) = tree.get(id) else { return };

        let source = node.attribute("src").unwrap_or("");
        // Decode failure degrades to a zero-intrinsic-size placeholder.
        let decoded = self.images.decode(source);
        let (physical_width, physical_height, handle) =
            decoded.map_or((0.0, 0.0, 0), |image| (image.width, image.height, image.handle));

        let attr_size = |name: &str| {
            node.attribute(name)
                .and_then(|v| v.trim().trim_end_matches("px").parse::<f32>().ok())
        };
        let logical_width = attr_size("width").unwrap_or(physical_width);
        let logical_height = attr_size("height").unwrap_or(physical_height);

        // An image that does not fit the remaining line forces a break.
        let available = cursor.area.width() - cursor.run_length;
        if logical_width > available && cursor.run_length > 0.0 {
            self.line_break(state, cursor, carry);
        }

        let line_height = self.metrics.line_height(&state.font());
        let line_total = line_height + cursor.line_extra;
        if logical_height > line_total {
            // Raise the line and shift already-placed same-line text down
            // so baselines stay aligned with the line's new bottom.
            let delta = logical_height - line_total;
            for fragment in &mut self.fragments[self.line_start..] {
                if !matches!(fragment.kind, FragmentKind::Image { .. }) {
                    fragment.bounds.top += delta;
                    fragment.bounds.bottom += delta;
                }
            }
            cursor.line_extra += delta;
        }

        let left = cursor.area.left + cursor.run_length;
        let top = cursor.area.top;
        let _ = self.push_fragment(Fragment {
            bounds: Rect::new(left, top, left + logical_width, top + logical_height),
            color: state.color,
            background: state.background,
            opacity: state.opacity,
            border_style: crate::property::BorderStyle::None,
            border_width: 0.0,
            border_color: state.color,
            node: Some(id),
            selected: false,
            kind: FragmentKind::Image {
                physical_width,
                physical_height,
                logical_width,
                logical_height,
                handle,
            },
        });

        cursor.run_length += logical_width;
        carry.open_run = true;
        carry.suppress_leading = false;
    }

    // =========================================================================
    // Blocks
    // =========================================================================

    /// Kind-specific leading vertical offset before a block opens.
    fn leading_advance(kind: &NodeKind, line_height: f32) -> f32 {
        match kind {
            NodeKind::H1
            | NodeKind::H2
            | NodeKind::H3
            | NodeKind::H4
            | NodeKind::H5
            | NodeKind::H6 => line_height * 1.5,
            NodeKind::P
            | NodeKind::Ul
            | NodeKind::Ol
            | NodeKind::Table
            | NodeKind::Blockquote
            | NodeKind::Pre => line_height,
            _ => 0.0,
        }
    }

    /// Kind-specific trailing vertical offset after a block closes.
    fn trailing_advance(kind: &NodeKind, line_height: f32) -> f32 {
        match kind {
            NodeKind::H1
            | NodeKind::H2
            | NodeKind::H3
            | NodeKind::H4
            | NodeKind::H5
            | NodeKind::H6
            | NodeKind::P
            | NodeKind::Ul
            | NodeKind::Ol
            | NodeKind::Table
            | NodeKind::Blockquote
            | NodeKind::Pre => line_height * 0.5,
            _ => 0.0,
        }
    }

    /// Text size multiplier for headings.
    fn heading_scale(level: u8) -> f32 {
        match level {
            1 => 2.0,
            2 => 1.6,
            3 => 1.3,
            4 => 1.1,
            5 => 1.0,
            _ => 0.9,
        }
    }

    /// Generic block layout: save state, cascade, leading advance, open a
    /// rectangle fragment, recurse, trailing advance, close the bottom
    /// edge, restore state, and reset the line.
    ///
    /// `marker` is the hanging list-item marker, painted left of the
    /// text origin and excluded from the item's own run length.
    fn layout_block(
        &mut self,
        id: NodeId,
        kind: &NodeKind,
        marker: Option<String>,
        state: &mut FormattingState,
        cursor: &mut Cursor,
        carry: &mut FlowCarry,
    ) {
        let saved = state.clone();
        state.clear_box();

        if let Some(level) = kind.heading_level() {
            state.text_size = saved.text_size * Self::heading_scale(level);
            state.bold = true;
        }
        if *kind == NodeKind::Pre || *kind == NodeKind::Code {
            state.font_family = "monospace".to_string();
        }

        let bags = resolve(self.sheet, self.inline, self.tree, id);
        apply_to_state(&bags, ApplyCategories::all(), state);

        if cursor.run_length > 0.0 {
            self.line_break(&saved, cursor, carry);
        }

        let line_height = self.metrics.line_height(&state.font());
        let area_width = cursor.area.width();

        // Leading offset: the kind rule, unless the predecessor already
        // provided trailing space or the parent starts its first child
        // flush, in which case only the line's own extra height counts.
        let leading = if carry.trailing_space || carry.suppress_leading {
            cursor.line_extra
        } else {
            Self::leading_advance(kind, line_height) + cursor.line_extra
        };
        let margin_top = state.margin.top.to_px(state.text_size, area_width);
        cursor.area.top += leading + margin_top;
        cursor.line_extra = 0.0;
        carry.suppress_leading = false;

        let border_px = state
            .border_width
            .top
            .to_px(state.text_size, area_width)
            .max(if state.border_style == crate::property::BorderStyle::None {
                0.0
            } else {
                1.0
            });

        // Scoped side edges: margins and padding narrow the area for
        // children; the previous edges come back on exit.
        let saved_left = cursor.area.left;
        let saved_right = cursor.area.right;
        let margin_left = state.margin.left.to_px(state.text_size, area_width);
        let margin_right = state.margin.right.to_px(state.text_size, area_width);
        cursor.area.left += margin_left;
        cursor.area.right -= margin_right;
        if *kind == NodeKind::Blockquote {
            cursor.area.left += QUOTE_INDENT;
            cursor.area.right -= QUOTE_INDENT;
        }

        let block_top = cursor.area.top;
        let fragment_index = self.push_fragment(Fragment {
            bounds: Rect::new(cursor.area.left, block_top, cursor.area.right, block_top),
            color: state.color,
            background: state.background,
            opacity: state.opacity,
            border_style: state.border_style,
            border_width: if state.border_style == crate::property::BorderStyle::None {
                0.0
            } else {
                border_px
            },
            border_color: state.border_color,
            node: Some(id),
            selected: false,
            kind: FragmentKind::Block,
        });

        let padding_top = state.padding.top.to_px(state.text_size, area_width);
        let padding_bottom = state.padding.bottom.to_px(state.text_size, area_width);
        let padding_left = state.padding.left.to_px(state.text_size, area_width);
        let padding_right = state.padding.right.to_px(state.text_size, area_width);
        cursor.area.top += padding_top;
        cursor.area.left += padding_left;
        cursor.area.right -= padding_right;

        if let Some(width) = state.box_width {
            let width_px = width.to_px(state.text_size, area_width);
            cursor.area.right = cursor
                .area
                .right
                .min(cursor.area.left + width_px.max(0.0));
        }

        if let Some(marker_text) = marker {
            self.place_marker(id, &marker_text, state, cursor);
        }

        let mut child_carry = FlowCarry {
            trailing_space: false,
            suppress_leading: true,
            open_run: false,
        };
        let tree = self.tree;
        for &child in tree.children(id) {
            self.layout_node(child, state, cursor, &mut child_carry);
        }
        if cursor.run_length > 0.0 || child_carry.open_run {
            self.line_break(state, cursor, &mut child_carry);
        }

        cursor.area.top += padding_bottom;
        if let Some(height) = state.box_height {
            let height_px = height.to_px(state.text_size, 0.0);
            cursor.area.top = cursor.area.top.max(block_top + height_px);
        }
        self.fragments[fragment_index].bounds.bottom = cursor.area.top;

        let margin_bottom = state.margin.bottom.to_px(state.text_size, area_width);
        let trailing = Self::trailing_advance(kind, line_height);
        cursor.area.top += margin_bottom + trailing;

        cursor.area.left = saved_left;
        cursor.area.right = saved_right;
        *state = saved;

        // A block acts like a line break of its own.
        cursor.run_length = 0.0;
        cursor.line_extra = 0.0;
        self.line_start = self.fragments.len();
        carry.open_run = false;
        carry.trailing_space = margin_bottom + trailing > 0.0;
    }

    /// Paint a hanging list-item marker left of the text origin. It is a
    /// separate fragment and does not advance the pen.
    fn place_marker(
        &mut self,
        node: NodeId,
        text: &str,
        state: &FormattingState,
        cursor: &Cursor,
    ) {
        let font = state.font();
        let width = self.metrics.line_width(text, &font);
        let line_height = self.metrics.line_height(&font);
        let left = cursor.area.left - width - BULLET_GAP;
        let top = cursor.area.top;
        let _ = self.push_fragment(Fragment {
            bounds: Rect::new(left, top, left + width, top + line_height),
            color: state.color,
            background: None,
            opacity: state.opacity,
            border_style: crate::property::BorderStyle::None,
            border_width: 0.0,
            border_color: state.color,
            node: Some(node),
            selected: false,
            kind: FragmentKind::Text {
                text: text.to_string(),
                font,
                run_length: width,
            },
        });
    }

    /// A horizontal rule: a thin full-width block with half a line of
    /// space on each side.
    fn layout_rule(
        &mut self,
        id: NodeId,
        state: &mut FormattingState,
        cursor: &mut Cursor,
        carry: &mut FlowCarry,
    ) {
        let saved = state.clone();
        state.clear_box();
        let bags = resolve(self.sheet, self.inline, self.tree, id);
        apply_to_state(&bags, ApplyCategories::COLORS | ApplyCategories::BOX, state);

        if cursor.run_length > 0.0 {
            self.line_break(&saved, cursor, carry);
        }

        let line_height = self.metrics.line_height(&state.font());
        let thickness = state
            .border_width
            .top
            .to_px(state.text_size, cursor.area.width())
            .max(2.0);

        cursor.area.top += line_height * 0.5 + cursor.line_extra;
        cursor.line_extra = 0.0;
        let top = cursor.area.top;
        let _ = self.push_fragment(Fragment {
            bounds: Rect::new(cursor.area.left, top, cursor.area.right, top + thickness),
            color: state.color,
            background: Some(state.background.unwrap_or(Rgba::rgb(128, 128, 128))),
            opacity: state.opacity,
            border_style: crate::property::BorderStyle::None,
            border_width: 0.0,
            border_color: state.border_color,
            node: Some(id),
            selected: false,
            kind: FragmentKind::Block,
        });
        cursor.area.top += thickness + line_height * 0.5;

        *state = saved;
        cursor.run_length = 0.0;
        self.line_start = self.fragments.len();
        carry.open_run = false;
        carry.trailing_space = true;
        carry.suppress_leading = false;
    }

    // =========================================================================
    // Lists
    // =========================================================================

    fn layout_list(
        &mut self,
        id: NodeId,
        ordered: bool,
        state: &mut FormattingState,
        cursor: &mut Cursor,
        carry: &mut FlowCarry,
    ) {
        let forced = self
            .tree
            .get(id)
            .and_then(|n| n.attribute("type"))
            .and_then(|t| forced_style(t, ordered));
        self.lists.push(ListContext::new(ordered, forced));

        // The fixed list indent applies to every item of this list.
        let saved_left = cursor.area.left;
        cursor.area.left += LIST_INDENT;
        let kind = if ordered { NodeKind::Ol } else { NodeKind::Ul };
        self.layout_block(id, &kind, None, state, cursor, carry);
        cursor.area.left = saved_left;

        let _ = self.lists.pop();
    }

    fn layout_list_item(
        &mut self,
        id: NodeId,
        state: &mut FormattingState,
        cursor: &mut Cursor,
        carry: &mut FlowCarry,
    ) {
        // Nesting depth is the stack depth at this point.
        let depth = self.lists.len().max(1);
        let marker = match self.lists.last_mut() {
            Some(context) => {
                context.index += 1;
                context.marker(depth)
            }
            // An item outside any list still gets a bullet.
            None => "\u{2022}".to_string(),
        };
        self.layout_block(id, &NodeKind::Li, Some(marker), state, cursor, carry);
    }

    // =========================================================================
    // Tables
    // =========================================================================

    /// The requested size of one cell's column, from the cascade's WIDTH
    /// property or the `width` attribute.
    fn cell_request(&self, cell: NodeId, state: &FormattingState) -> ColumnRequest {
        let bags = resolve(self.sheet, self.inline, self.tree, cell);
        let mut merged = crate::property::PropertyBag::new();
        for bag in bags {
            merged.merge_from(bag);
        }

        let length = if merged.flags.contains(crate::property::PropertyFlags::WIDTH) {
            Some(merged.width)
        } else {
            self.tree
                .get(cell)
                .and_then(|n| n.attribute("width"))
                .and_then(crate::property::Length::parse)
        };

        match length {
            Some(length) if length.unit == crate::property::SizeUnit::Percent => {
                ColumnRequest::Percent(length.value)
            }
            Some(length) => ColumnRequest::Pixels(length.to_px(state.text_size, 0.0)),
            None => ColumnRequest::Flexible,
        }
    }

    /// Pass 1: fold every cell's request into its column's running
    /// maximum.
    fn requested_column_sizes(
        &self,
        rows: &[&TableRow],
        columns: usize,
        state: &FormattingState,
    ) -> Vec<ColumnRequest> {
        let mut requested = vec![ColumnRequest::Flexible; columns];
        for row in rows {
            for (column, &cell) in row.cells.iter().enumerate() {
                if column < columns {
                    requested[column] = requested[column].merge(self.cell_request(cell, state));
                }
            }
        }
        requested
    }

    fn layout_table(
        &mut self,
        id: NodeId,
        state: &mut FormattingState,
        cursor: &mut Cursor,
        carry: &mut FlowCarry,
    ) {
        let saved = state.clone();
        state.clear_box();
        let bags = resolve(self.sheet, self.inline, self.tree, id);
        apply_to_state(&bags, ApplyCategories::all(), state);

        if cursor.run_length > 0.0 {
            self.line_break(&saved, cursor, carry);
        }

        let line_height = self.metrics.line_height(&state.font());
        let leading = if carry.trailing_space || carry.suppress_leading {
            cursor.line_extra
        } else {
            Self::leading_advance(&NodeKind::Table, line_height) + cursor.line_extra
        };
        cursor.area.top += leading;
        cursor.line_extra = 0.0;
        carry.suppress_leading = false;

        let structure = collect_structure(self.tree, id);
        let columns = structure.column_count();

        // Table width: the available area, narrowed by an explicit width.
        let area_width = cursor.area.width();
        let table_width = state
            .box_width
            .map_or(area_width, |w| w.to_px(state.text_size, area_width))
            .clamp(0.0, area_width);

        let table_top = cursor.area.top;
        let fragment_index = self.push_fragment(Fragment {
            bounds: Rect::new(
                cursor.area.left,
                table_top,
                cursor.area.left + table_width,
                table_top,
            ),
            color: state.color,
            background: state.background,
            opacity: state.opacity,
            border_style: state.border_style,
            border_width: state
                .border_width
                .top
                .to_px(state.text_size, area_width),
            border_color: state.border_color,
            node: Some(id),
            selected: false,
            kind: FragmentKind::Block,
        });

        if columns == 0 {
            // No rows: a zero-height table, best effort.
            *state = saved;
            cursor.run_length = 0.0;
            carry.open_run = false;
            carry.trailing_space = false;
            return;
        }

        let all_rows: Vec<&TableRow> = structure.rows().collect();
        let requested = self.requested_column_sizes(&all_rows, columns, state);
        let preferred = preferred_column_sizes(&requested, table_width);
        let offsets = column_offsets(&preferred, cursor.area.left);

        self.tables.push(TableMetric {
            requested: requested.clone(),
            preferred: preferred.clone(),
            ..TableMetric::default()
        });

        // Lay the groups out in paint order, recording row metrics.
        let mut y = table_top + CELL_SPACING;
        let groups: [(&[TableRow], usize); 3] = [
            (&structure.head, 0),
            (&structure.body, 1),
            (&structure.foot, 2),
        ];
        for (rows, group_index) in groups {
            for row in rows {
                let row_metric = self.layout_table_row(row, &preferred, &offsets, y, state);
                y += row_metric.height + CELL_SPACING;
                if let Some(metric) = self.tables.last_mut() {
                    match group_index {
                        0 => metric.head.push(row_metric),
                        1 => metric.body.push(row_metric),
                        _ => metric.foot.push(row_metric),
                    }
                }
            }
        }

        // The table's bottom edge: the last row's bottom plus the
        // table-to-cell spacing (already included in `y`).
        cursor.area.top = y;
        self.fragments[fragment_index].bounds.bottom = y;

        let _ = self.tables.pop();

        let trailing = Self::trailing_advance(&NodeKind::Table, line_height);
        cursor.area.top += trailing;

        *state = saved;
        cursor.run_length = 0.0;
        cursor.line_extra = 0.0;
        self.line_start = self.fragments.len();
        carry.open_run = false;
        carry.trailing_space = true;
    }

    /// Lay out one row: each cell in its column rectangle, row height
    /// from the tallest cell, cell boxes stretched to the row bottom.
    fn layout_table_row(
        &mut self,
        row: &TableRow,
        preferred: &[f32],
        offsets: &[f32],
        row_top: f32,
        state: &FormattingState,
    ) -> TableRowMetric {
        let mut cells = Vec::with_capacity(row.cells.len());
        let mut row_height: f32 = 0.0;

        for (column, &cell) in row.cells.iter().enumerate() {
            if column >= preferred.len() {
                break;
            }
            let cell_left = offsets[column];
            let cell_right = cell_left + preferred[column];

            let fragment_before = self.fragments.len();
            let saved_line_start = self.line_start;
            self.line_start = fragment_before;

            let mut cell_state = state.clone();
            let mut cell_cursor = Cursor {
                area: Rect::new(cell_left, row_top, cell_right, f32::MAX),
                line_extra: 0.0,
                run_length: 0.0,
            };
            let mut cell_carry = FlowCarry {
                trailing_space: false,
                suppress_leading: true,
                open_run: false,
            };
            self.layout_node(cell, &mut cell_state, &mut cell_cursor, &mut cell_carry);

            self.line_start = saved_line_start;

            let height = (cell_cursor.area.top - row_top).max(0.0);
            row_height = row_height.max(height);

            let produced = self.fragments.len() > fragment_before;
            cells.push(TableCellMetric {
                node: Some(cell),
                fragment: produced.then_some(fragment_before),
                bounds: Rect::new(cell_left, row_top, cell_right, row_top + height),
            });
        }

        // Stretch each cell's box fragment to the full row height so the
        // row paints as an even band.
        for metric in &mut cells {
            if let Some(index) = metric.fragment {
                self.fragments[index].bounds.bottom = row_top + row_height;
            }
            metric.bounds.bottom = row_top + row_height;
        }

        TableRowMetric {
            node: row.node,
            cells,
            height: row_height,
        }
    }
}
