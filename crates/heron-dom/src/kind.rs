//! Node kinds and the static per-kind trait table.
//!
//! Every supported tag name maps to one variant of a closed [`NodeKind`]
//! enum; dispatch throughout the parser and layout engine is a `match` on
//! the kind, never a chain of string comparisons. Tags outside the dialect
//! map to [`NodeKind::Unknown`] carrying the original name.

use strum_macros::{Display, EnumString};

/// The static category of a tree node.
///
/// Covers the dialect's element tags plus three synthetic kinds: the
/// document root, decoded text payloads, and embedded style blocks.
///
/// The string form of each variant is its tag name; parsing is ASCII
/// case-insensitive, and any unrecognized name falls through to
/// [`NodeKind::Unknown`] with the original spelling preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum NodeKind {
    /// Synthetic root of the tree; never produced by a tag.
    #[strum(serialize = "#document")]
    Document,
    /// Synthetic kind for decoded text payloads.
    #[strum(serialize = "#text")]
    Text,
    /// `<style>` block; its text payload is parsed into a stylesheet.
    #[strum(serialize = "style")]
    StyleBlock,
    /// `<script>` region; captured raw, never tag-parsed or executed.
    #[strum(serialize = "script")]
    Script,

    /// `<html>` document element.
    #[strum(serialize = "html")]
    Html,
    /// `<body>` content container.
    #[strum(serialize = "body")]
    Body,

    /// `<h1>` heading.
    #[strum(serialize = "h1")]
    H1,
    /// `<h2>` heading.
    #[strum(serialize = "h2")]
    H2,
    /// `<h3>` heading.
    #[strum(serialize = "h3")]
    H3,
    /// `<h4>` heading.
    #[strum(serialize = "h4")]
    H4,
    /// `<h5>` heading.
    #[strum(serialize = "h5")]
    H5,
    /// `<h6>` heading.
    #[strum(serialize = "h6")]
    H6,

    /// `<p>` paragraph.
    #[strum(serialize = "p")]
    P,
    /// `<div>` division.
    #[strum(serialize = "div")]
    Div,
    /// `<blockquote>` indented quotation block.
    #[strum(serialize = "blockquote")]
    Blockquote,
    /// `<pre>` preformatted region (explicit line breaks honored).
    #[strum(serialize = "pre")]
    Pre,
    /// `<code>` monospace span.
    #[strum(serialize = "code")]
    Code,

    /// `<span>` inline container.
    #[strum(serialize = "span")]
    Span,
    /// `<a>` hyperlink.
    #[strum(serialize = "a")]
    Anchor,
    /// `<b>` bold.
    #[strum(serialize = "b")]
    Bold,
    /// `<i>` italic.
    #[strum(serialize = "i")]
    Italic,
    /// `<u>` underline.
    #[strum(serialize = "u")]
    Underline,
    /// `<strong>` strong emphasis (rendered bold).
    #[strum(serialize = "strong")]
    Strong,
    /// `<em>` emphasis (rendered italic).
    #[strum(serialize = "em")]
    Em,
    /// `<sub>` subscript.
    #[strum(serialize = "sub")]
    Sub,
    /// `<sup>` superscript.
    #[strum(serialize = "sup")]
    Sup,

    /// `<br>` forced line break.
    #[strum(serialize = "br")]
    Br,
    /// `<hr>` horizontal rule.
    #[strum(serialize = "hr")]
    Hr,

    /// `<ul>` unordered list.
    #[strum(serialize = "ul")]
    Ul,
    /// `<ol>` ordered list.
    #[strum(serialize = "ol")]
    Ol,
    /// `<li>` list item.
    #[strum(serialize = "li")]
    Li,

    /// `<table>` table container.
    #[strum(serialize = "table")]
    Table,
    /// `<thead>` header row-group.
    #[strum(serialize = "thead")]
    THead,
    /// `<tbody>` body row-group.
    #[strum(serialize = "tbody")]
    TBody,
    /// `<tfoot>` footer row-group.
    #[strum(serialize = "tfoot")]
    TFoot,
    /// `<tr>` table row.
    #[strum(serialize = "tr")]
    Tr,
    /// `<td>` data cell.
    #[strum(serialize = "td")]
    Td,
    /// `<th>` header cell.
    #[strum(serialize = "th")]
    Th,

    /// `<img>` embedded image.
    #[strum(serialize = "img")]
    Img,

    /// Fallback for tags outside the dialect; keeps the original name.
    /// Laid out as a generic inline container.
    #[strum(default)]
    Unknown(String),
}

impl NodeKind {
    /// Map a tag name to its kind. Never fails: unrecognized names become
    /// [`NodeKind::Unknown`] with the original spelling.
    #[must_use]
    pub fn from_tag_name(name: &str) -> Self {
        // EnumString with a default variant is total.
        name.parse().unwrap_or_else(|_| Self::Unknown(name.to_string()))
    }

    /// True for the generic fallback kind.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }

    /// Heading level 1-6, if this is a heading kind.
    #[must_use]
    pub const fn heading_level(&self) -> Option<u8> {
        match self {
            Self::H1 => Some(1),
            Self::H2 => Some(2),
            Self::H3 => Some(3),
            Self::H4 => Some(4),
            Self::H5 => Some(5),
            Self::H6 => Some(6),
            _ => None,
        }
    }
}

/// Static classification of a node kind, looked up once per node instead of
/// re-deriving behavior from the tag name at each use site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeTraits {
    /// May own children. Non-container kinds never gain children.
    pub container: bool,
    /// An open element of this kind is implicitly closed when a new
    /// element of the same kind starts (`<p>`, `<li>`, table rows/cells).
    pub auto_closing: bool,
    /// Participates in the cascade (stylesheet entries and the `style`
    /// attribute apply).
    pub stylable: bool,
    /// Structures the block flow: resets the line cursor to column zero
    /// when the element closes.
    pub structuring: bool,
    /// Establishes a text flow of its own (paragraph-like content model).
    pub text_block: bool,
}

impl NodeTraits {
    const fn new(
        container: bool,
        auto_closing: bool,
        stylable: bool,
        structuring: bool,
        text_block: bool,
    ) -> Self {
        Self {
            container,
            auto_closing,
            stylable,
            structuring,
            text_block,
        }
    }
}

/// The per-kind trait table.
///
/// One row per kind; all parsing and layout behavior that depends on the
/// kind's category reads from here.
#[must_use]
pub fn traits(kind: &NodeKind) -> NodeTraits {
    match kind {
        //                                        container  auto  style  struct text
        NodeKind::Document => NodeTraits::new(true, false, false, true, false),
        NodeKind::Text => NodeTraits::new(false, false, false, false, false),
        NodeKind::StyleBlock => NodeTraits::new(true, false, false, false, false),
        NodeKind::Script => NodeTraits::new(true, false, false, false, false),

        NodeKind::Html | NodeKind::Body | NodeKind::Div | NodeKind::Blockquote => {
            NodeTraits::new(true, false, true, true, false)
        }

        NodeKind::H1
        | NodeKind::H2
        | NodeKind::H3
        | NodeKind::H4
        | NodeKind::H5
        | NodeKind::H6 => NodeTraits::new(true, false, true, true, true),

        NodeKind::P => NodeTraits::new(true, true, true, true, true),
        NodeKind::Pre | NodeKind::Code => NodeTraits::new(true, false, true, true, true),

        NodeKind::Span
        | NodeKind::Anchor
        | NodeKind::Bold
        | NodeKind::Italic
        | NodeKind::Underline
        | NodeKind::Strong
        | NodeKind::Em
        | NodeKind::Sub
        | NodeKind::Sup => NodeTraits::new(true, false, true, false, false),

        NodeKind::Br => NodeTraits::new(false, false, false, false, false),
        NodeKind::Hr => NodeTraits::new(false, false, true, true, false),

        NodeKind::Ul | NodeKind::Ol => NodeTraits::new(true, false, true, true, false),
        NodeKind::Li => NodeTraits::new(true, true, true, true, true),

        NodeKind::Table => NodeTraits::new(true, false, true, true, false),
        NodeKind::THead | NodeKind::TBody | NodeKind::TFoot => {
            NodeTraits::new(true, false, true, true, false)
        }
        NodeKind::Tr => NodeTraits::new(true, true, true, true, false),
        NodeKind::Td | NodeKind::Th => NodeTraits::new(true, true, true, true, true),

        NodeKind::Img => NodeTraits::new(false, false, true, false, false),

        NodeKind::Unknown(_) => NodeTraits::new(true, false, true, false, false),
    }
}
