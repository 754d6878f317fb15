//! Node tree construction from scanned tokens.
//!
//! The builder consumes the scanner's token stream and maintains a stack
//! of open elements. Node construction and tree attachment stay separate:
//! every node is allocated first, then attached under the current open
//! element, and only container kinds are ever pushed onto the stack.
//!
//! Mis-nesting is repaired, never fatal: auto-closing kinds implicitly
//! close a matching open element, stray end tags are dropped with a
//! warning, and end-of-input closes whatever remains open.

use heron_common::diagnostics::DiagnosticLog;
use heron_dom::{MarkupTree, NodeId, NodeKind, traits};

use crate::scanner::TagToken;

/// Whether a new element of kind `new` implicitly closes an open element
/// of kind `open` before it is inserted.
///
/// Mirrors the dialect's auto-closing rules: a paragraph ends the previous
/// paragraph, a list item the previous item, and table rows/cells end any
/// cell (and, for rows, the previous row) still open.
fn implicitly_closes(new: &NodeKind, open: &NodeKind) -> bool {
    match new {
        NodeKind::P => matches!(open, NodeKind::P),
        NodeKind::Li => matches!(open, NodeKind::Li),
        NodeKind::Tr => matches!(open, NodeKind::Tr | NodeKind::Td | NodeKind::Th),
        NodeKind::Td | NodeKind::Th => matches!(open, NodeKind::Td | NodeKind::Th),
        _ => false,
    }
}

/// Whether whitespace-only text runs are kept under this kind.
///
/// Structural containers (lists, tables, divisions, the document itself)
/// discard indentation between their children; text-flow and inline kinds
/// keep every run, as does raw payload capture under style/script.
fn whitespace_significant(kind: &NodeKind) -> bool {
    !matches!(
        kind,
        NodeKind::Document
            | NodeKind::Html
            | NodeKind::Body
            | NodeKind::Div
            | NodeKind::Blockquote
            | NodeKind::Ul
            | NodeKind::Ol
            | NodeKind::Table
            | NodeKind::THead
            | NodeKind::TBody
            | NodeKind::TFoot
            | NodeKind::Tr
    )
}

/// Incremental tree builder over a stack of open elements.
pub struct TreeBuilder {
    tree: MarkupTree,
    /// Open elements, document node at the bottom. Only container kinds
    /// are ever pushed.
    stack: Vec<NodeId>,
}

impl TreeBuilder {
    /// Create a builder with an empty tree (document node open).
    #[must_use]
    pub fn new() -> Self {
        let tree = MarkupTree::new();
        Self {
            tree,
            stack: vec![NodeId::ROOT],
        }
    }

    fn current(&self) -> NodeId {
        // The document node is never popped.
        *self.stack.last().unwrap_or(&NodeId::ROOT)
    }

    fn current_kind(&self) -> &NodeKind {
        self.tree.kind(self.current())
    }

    /// Handle a start tag: map the name to a kind, apply auto-closing,
    /// allocate + attach, and open the element when it is a container.
    pub fn start_tag(&mut self, tag: &TagToken, log: &mut DiagnosticLog) {
        let kind = NodeKind::from_tag_name(&tag.name);
        if kind.is_unknown() {
            log.warning(format!(
                "unknown tag '<{}>', treating as generic element",
                tag.name
            ));
        }

        while self.stack.len() > 1 && implicitly_closes(&kind, self.current_kind()) {
            let _ = self.stack.pop();
        }

        let kind_traits = traits(&kind);
        let id = self.tree.alloc(kind);
        for attr in &tag.attributes {
            self.tree
                .add_attribute(id, attr.name.clone(), attr.value.clone());
        }
        let _ = self.tree.attach_child(self.current(), id);

        if kind_traits.container && !tag.self_closing {
            self.stack.push(id);
        }
    }

    /// Handle an end tag: close the nearest matching open element,
    /// closing anything opened inside it on the way.
    pub fn end_tag(&mut self, tag: &TagToken, log: &mut DiagnosticLog) {
        let kind = NodeKind::from_tag_name(&tag.name);

        // Search the open stack top-down, never matching the document.
        let Some(depth) = self
            .stack
            .iter()
            .skip(1)
            .rposition(|&id| *self.tree.kind(id) == kind)
            .map(|i| i + 1)
        else {
            log.warning(format!("stray closing tag '</{}>'", tag.name));
            return;
        };

        while self.stack.len() > depth + 1 {
            let popped = self.stack.pop().map(|id| self.tree.kind(id).clone());
            if let Some(open) = popped {
                if !traits(&open).auto_closing {
                    log.warning(format!("unclosed element '<{open}>'"));
                }
            }
        }
        let _ = self.stack.pop();
    }

    /// Handle a text run: attach a text node under the current element,
    /// discarding whitespace-only runs inside structural containers.
    pub fn text(&mut self, content: &str) {
        if content.is_empty() {
            return;
        }
        if content.chars().all(char::is_whitespace) && !whitespace_significant(self.current_kind())
        {
            return;
        }
        let id = self.tree.alloc_text(content);
        let _ = self.tree.attach_child(self.current(), id);
    }

    /// Close everything still open and yield the finished tree.
    #[must_use]
    pub fn finish(mut self, log: &mut DiagnosticLog) -> MarkupTree {
        while self.stack.len() > 1 {
            if let Some(id) = self.stack.pop() {
                let kind = self.tree.kind(id);
                if !traits(kind).auto_closing {
                    log.warning(format!("unclosed element '<{kind}>' at end of input"));
                }
            }
        }
        self.tree
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
