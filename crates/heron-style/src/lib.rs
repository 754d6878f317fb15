//! Style model, cascade resolver, and flow layout engine for the Heron
//! renderer.
//!
//! # Scope
//!
//! This crate implements:
//! - **Style model** - flag-tagged property bags parsed from inline
//!   `style` attributes and `<style>` block rule text, with CSS-style
//!   shorthand expansion, named colors, and unit inference
//! - **Cascade resolver** - ordered bag resolution per node (global
//!   rules before the inline bag) and flag-gated application onto the
//!   formatting state
//! - **Flow layout** - the single-pass recursive engine producing
//!   positioned fragments: greedy line breaking, block placement with
//!   margin-collapse carry flags, list numbering, two-pass table column
//!   sizing, and image placement
//!
//! Font measurement and image decoding are collaborator traits
//! ([`FontMetrics`], [`ImageProvider`]); the engine crate supplies real
//! implementations, and approximate/null ones ship here for tests.

/// Cascade resolution and the live formatting state.
pub mod cascade;
/// Color values and the named web-color table.
pub mod color;
/// Flow layout: fragments, line breaking, lists, tables, the engine.
pub mod layout;
/// Property bags and inline style declaration parsing.
pub mod property;
/// Stylesheet blocks mapped to property bags.
pub mod stylesheet;

// Re-exports for convenience
pub use cascade::{ApplyCategories, FormattingState, InlineStyles, apply_to_state, resolve};
pub use color::Rgba;
pub use layout::{
    ApproximateFontMetrics, FlowCarry, FlowLayout, FontMetrics, FontSelector, Fragment,
    FragmentKind, ImageProvider, ImageRef, LayoutOptions, LayoutResult, NoImages, Rect,
};
pub use property::{
    BorderStyle, Edges, Length, PropertyBag, PropertyFlags, SizeUnit, parse_property_bag,
};
pub use stylesheet::StyleSheet;
