//! Markup tokenizer and node-tree builder for the Heron renderer.
//!
//! # Scope
//!
//! This crate implements:
//! - **Tag/attribute scanner** - tag boundaries, quoted and bare attribute
//!   values, boolean attributes, self-closing tags, raw `<script>` regions
//! - **Character entities** - named and numeric reference resolution, and
//!   the inverse escaping operation
//! - **Tree builder** - typed node construction driven by the static kind
//!   table, auto-closing repair, and stray-tag recovery
//!
//! Parsing never aborts: every malformed span is recovered (as prose text
//! or a generic node) and reported through the returned diagnostics.

/// Node tree construction from scanned tokens.
pub mod builder;
/// Character entity resolution.
pub mod entities;
/// Tag and attribute scanner.
pub mod scanner;

pub use builder::TreeBuilder;
pub use entities::{decode_entities, encode_entities, lookup_entity};
pub use scanner::{RawAttribute, RawToken, Scanner, TagToken};

use heron_common::diagnostics::{Diagnostic, DiagnosticLog};
use heron_dom::{MarkupTree, NodeId, NodeKind};

/// Parse a decoded text buffer into a node tree.
///
/// `resolve_entities` controls character-reference substitution in text
/// and attribute values. `trace` echoes every scanned token to stderr for
/// debugging.
///
/// Never fails: the result is always a tree (possibly just the document
/// node) plus the ordered diagnostics accumulated along the way.
#[must_use]
pub fn parse(text: &str, resolve_entities: bool, trace: bool) -> (MarkupTree, Vec<Diagnostic>) {
    let mut scanner = Scanner::new(text, resolve_entities);
    let mut builder = TreeBuilder::new();
    let mut log = DiagnosticLog::new();

    while let Some(token) = scanner.next_token(&mut log) {
        if trace {
            eprintln!("[heron markup] {token:?}");
        }
        match &token {
            RawToken::Text(content) => builder.text(content),
            RawToken::Tag(tag) if tag.closing => builder.end_tag(tag, &mut log),
            RawToken::Tag(tag) => {
                builder.start_tag(tag, &mut log);
                // `<x/>` opens and closes in one token; start_tag already
                // refrains from pushing self-closing elements.
            }
            RawToken::Comment(_) => {}
        }
    }

    let tree = builder.finish(&mut log);
    (tree, log.into_entries())
}

/// Print an indented view of the tree to stdout, for debugging.
pub fn print_tree(tree: &MarkupTree) {
    print_subtree(tree, tree.root(), 0);
}

fn print_subtree(tree: &MarkupTree, id: NodeId, depth: usize) {
    let indent = "  ".repeat(depth);
    if let Some(node) = tree.get(id) {
        match &node.kind {
            NodeKind::Text => println!("{indent}#text {:?}", node.text),
            kind => {
                let attrs: Vec<String> = node
                    .attributes
                    .iter()
                    .map(|a| format!("{}={:?}", a.name, a.value))
                    .collect();
                if attrs.is_empty() {
                    println!("{indent}<{kind}>");
                } else {
                    println!("{indent}<{kind} {}>", attrs.join(" "));
                }
            }
        }
        for &child in tree.children(id) {
            print_subtree(tree, child, depth + 1);
        }
    }
}
