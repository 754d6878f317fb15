//! Document loading and layout pipeline for the Heron renderer.
//!
//! # Scope
//!
//! This crate composes the lower layers into the renderer-facing API:
//! - **Loading** - read + parse + root validation, with numeric outcome
//!   codes for host applications
//! - **Style preparation** - stylesheet extraction from `<style>` blocks
//!   and inline-bag collection, once per document
//! - **Layout** - running a flow pass and holding its fragment sequence
//!   and occupied size for the painter
//! - **Collaborators** - fontdue-backed font metrics and a content-hash
//!   image cache
//!
//! The engine holds no rendering state: the painter consumes the
//! fragment sequence and the occupied size, nothing else.

/// Fontdue-backed font measurement.
pub mod font_metrics;
/// Image decoding behind a content-hash cache.
pub mod image_loader;

pub use font_metrics::FontCollection;
pub use image_loader::{ImageCache, source_hash};

use std::fs;

use thiserror::Error;

use heron_common::diagnostics::Diagnostic;
use heron_dom::{MarkupTree, NodeId};
use heron_markup::parse;
use heron_style::{
    Fragment, ImageProvider, InlineStyles, LayoutOptions, StyleSheet,
};

/// Outcome code for a successful load.
pub const OUTCOME_SUCCESS: i32 = 0;

/// Why a document failed to load. Each variant maps onto the numeric
/// outcome code host applications present.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source could not be read at all (code -1).
    #[error("cannot read '{path}': {reason}")]
    Unreadable {
        /// The path that was attempted.
        path: String,
        /// The underlying I/O failure.
        reason: String,
    },
    /// The source was empty, or parsing produced nothing (code -2).
    #[error("'{path}' is empty or unparsable")]
    Empty {
        /// The path that was attempted.
        path: String,
    },
    /// Parsing succeeded but no root element exists (code -3).
    #[error("'{path}' has no root element")]
    MissingRoot {
        /// The path that was attempted.
        path: String,
    },
}

impl LoadError {
    /// The numeric outcome code for this failure.
    #[must_use]
    pub const fn outcome_code(&self) -> i32 {
        match self {
            Self::Unreadable { .. } => -1,
            Self::Empty { .. } => -2,
            Self::MissingRoot { .. } => -3,
        }
    }
}

/// A loaded document: the parsed tree, its prepared styles, the
/// accumulated diagnostics, and the fragments of the most recent layout
/// pass.
#[derive(Debug)]
pub struct Document {
    /// Source path, when loaded from a file.
    pub source_path: String,
    /// Parsed node tree.
    pub tree: MarkupTree,
    /// Document stylesheet from every `<style>` block.
    pub stylesheet: StyleSheet,
    /// Inline `style`-attribute bags, keyed by node.
    pub inline_styles: InlineStyles,
    /// Parse and style diagnostics in document order.
    pub diagnostics: Vec<Diagnostic>,

    fragments: Vec<Fragment>,
    occupied: (f32, f32),
    selected: Option<NodeId>,
}

impl Document {
    /// Parse markup text into a document, validating that it has
    /// content and a root element.
    ///
    /// # Errors
    ///
    /// [`LoadError::Empty`] when the text parses to nothing;
    /// [`LoadError::MissingRoot`] when no element sits under the
    /// document node.
    pub fn from_text(text: &str, path: &str) -> Result<Self, LoadError> {
        let (tree, mut diagnostics) = parse(text, true, false);

        if tree.children(tree.root()).is_empty() {
            return Err(LoadError::Empty {
                path: path.to_string(),
            });
        }
        if tree.document_element().is_none() {
            return Err(LoadError::MissingRoot {
                path: path.to_string(),
            });
        }

        let mut style_log = heron_common::diagnostics::DiagnosticLog::new();
        let stylesheet = StyleSheet::from_tree(&tree, &mut style_log);
        let inline_styles = InlineStyles::collect(&tree, &mut style_log);
        diagnostics.extend(style_log.into_entries());

        Ok(Self {
            source_path: path.to_string(),
            tree,
            stylesheet,
            inline_styles,
            diagnostics,
            fragments: Vec::new(),
            occupied: (0.0, 0.0),
            selected: None,
        })
    }

    /// Read a file and parse it.
    ///
    /// # Errors
    ///
    /// [`LoadError::Unreadable`] when the file cannot be read, plus the
    /// validation failures of [`Document::from_text`].
    pub fn load(path: &str) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path).map_err(|e| LoadError::Unreadable {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_text(&text, path)
    }

    /// Run a layout pass: replaces the fragment sequence and records the
    /// total occupied size. `keep_selection` carries the recorded
    /// selection across the pass; otherwise it clears.
    ///
    /// Re-running is always a full re-derivation from the unchanged tree
    /// and stylesheet; there is no incremental path.
    pub fn layout(
        &mut self,
        options: &LayoutOptions,
        fonts: &dyn heron_style::FontMetrics,
        images: &dyn ImageProvider,
        keep_selection: bool,
    ) {
        if !keep_selection {
            self.selected = None;
        }

        let pass = heron_style::FlowLayout::new(
            &self.tree,
            &self.stylesheet,
            &self.inline_styles,
            fonts,
            images,
        );
        let result = pass.run(options);
        self.fragments = result.fragments;
        self.occupied = result.occupied;

        if let Some(selected) = self.selected {
            for fragment in &mut self.fragments {
                if fragment.node == Some(selected) {
                    fragment.selected = true;
                }
            }
        }
    }

    /// The fragment sequence of the most recent layout pass, in paint
    /// order.
    #[must_use]
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Total occupied size of the most recent pass: the max right edge
    /// reached and the final bottom edge.
    #[must_use]
    pub const fn occupied(&self) -> (f32, f32) {
        self.occupied
    }

    /// The topmost fragment containing the point, for hit-testing.
    /// Later fragments paint above earlier ones.
    #[must_use]
    pub fn fragment_at(&self, x: f32, y: f32) -> Option<&Fragment> {
        self.fragments
            .iter()
            .rev()
            .find(|f| f.bounds.contains(x, y))
    }

    /// Record the selected node (usually from a hit-test).
    pub fn select(&mut self, node: Option<NodeId>) {
        self.selected = node;
    }

    /// The currently selected node, if any.
    #[must_use]
    pub const fn selection(&self) -> Option<NodeId> {
        self.selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_style::{ApproximateFontMetrics, FragmentKind, NoImages};

    fn laid_out(html: &str) -> Document {
        let mut doc = Document::from_text(html, "test.html").unwrap();
        doc.layout(
            &LayoutOptions::default(),
            &ApproximateFontMetrics,
            &NoImages,
            false,
        );
        doc
    }

    #[test]
    fn test_load_missing_file_is_unreadable() {
        let error = Document::load("/no/such/file.html").unwrap_err();
        assert_eq!(error.outcome_code(), -1);
    }

    #[test]
    fn test_empty_text_outcome() {
        let error = Document::from_text("", "x.html").unwrap_err();
        assert_eq!(error.outcome_code(), -2);
    }

    #[test]
    fn test_missing_root_outcome() {
        // Parses to content, but no element under the document node.
        let error = Document::from_text("just prose", "x.html").unwrap_err();
        assert_eq!(error.outcome_code(), -3);
    }

    #[test]
    fn test_successful_pipeline() {
        let doc = laid_out("<html><body><p>Hello</p></body></html>");
        assert!(!doc.fragments().is_empty());
        assert!(doc.occupied().1 > 0.0);
    }

    #[test]
    fn test_relayout_replaces_fragments() {
        let mut doc = Document::from_text("<p>word word word word</p>", "x.html").unwrap();
        let wide = LayoutOptions {
            width: 800.0,
            ..LayoutOptions::default()
        };
        let narrow = LayoutOptions {
            width: 60.0,
            ..LayoutOptions::default()
        };

        doc.layout(&wide, &ApproximateFontMetrics, &NoImages, false);
        let wide_count = doc.fragments().len();
        doc.layout(&narrow, &ApproximateFontMetrics, &NoImages, false);
        let narrow_count = doc.fragments().len();

        assert!(
            narrow_count > wide_count,
            "narrow layout wraps into more runs"
        );
    }

    #[test]
    fn test_hit_test_finds_text_run() {
        let doc = laid_out("<p>Hello</p>");
        let run = doc
            .fragments()
            .iter()
            .find(|f| matches!(f.kind, FragmentKind::Text { .. }))
            .unwrap();
        let (x, y) = (
            (run.bounds.left + run.bounds.right) / 2.0,
            (run.bounds.top + run.bounds.bottom) / 2.0,
        );
        let hit = doc.fragment_at(x, y).unwrap();
        // The text run paints above the paragraph box.
        assert!(matches!(hit.kind, FragmentKind::Text { .. }));
    }

    #[test]
    fn test_selection_kept_across_relayout() {
        let mut doc = Document::from_text("<p>Hello</p>", "x.html").unwrap();
        doc.layout(
            &LayoutOptions::default(),
            &ApproximateFontMetrics,
            &NoImages,
            false,
        );
        let node = doc
            .fragments()
            .iter()
            .find_map(|f| match f.kind {
                FragmentKind::Text { .. } => f.node,
                _ => None,
            })
            .unwrap();

        doc.select(Some(node));
        doc.layout(
            &LayoutOptions::default(),
            &ApproximateFontMetrics,
            &NoImages,
            true,
        );
        assert!(doc.fragments().iter().any(|f| f.selected));

        doc.layout(
            &LayoutOptions::default(),
            &ApproximateFontMetrics,
            &NoImages,
            false,
        );
        assert!(doc.fragments().iter().all(|f| !f.selected));
        assert_eq!(doc.selection(), None);
    }

    #[test]
    fn test_diagnostics_surface_through_document() {
        let doc = laid_out("<html><body><foo>x</foo></body></html>");
        assert!(
            doc.diagnostics
                .iter()
                .any(|d| d.message.contains("unknown tag"))
        );
    }
}
