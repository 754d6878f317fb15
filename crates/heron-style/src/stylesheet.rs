//! Stylesheets: `selector { clauses }` blocks mapped to property bags.
//!
//! Selector keys are a tag name, optionally joined with a class name
//! (`p`, `p.note`). Duplicate selectors merge, later declarations winning
//! per explicitly-set property, so repeated blocks behave like one.

use std::collections::HashMap;

use heron_common::diagnostics::DiagnosticLog;
use heron_dom::{MarkupTree, NodeId, NodeKind};

use crate::property::{PropertyBag, parse_property_bag};

/// A mapping from selector key to property bag.
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    entries: HashMap<String, PropertyBag>,
}

impl StyleSheet {
    /// An empty stylesheet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct selector keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no rule was parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the bag for a selector key (already lowercased).
    #[must_use]
    pub fn get(&self, selector: &str) -> Option<&PropertyBag> {
        self.entries.get(selector)
    }

    /// Insert a bag under a selector key, merging into any existing entry.
    pub fn insert(&mut self, selector: String, bag: PropertyBag) {
        self.entries
            .entry(selector)
            .or_default()
            .merge_from(&bag);
    }

    /// Parse stylesheet text: a sequence of `selector { clauses }` groups.
    ///
    /// Commas in the selector share the rule body across several keys.
    /// Malformed groups are skipped with an error; the rest of the sheet
    /// still parses.
    #[must_use]
    pub fn parse(text: &str, log: &mut DiagnosticLog) -> Self {
        let mut sheet = Self::new();
        sheet.parse_into(text, log);
        sheet
    }

    fn parse_into(&mut self, text: &str, log: &mut DiagnosticLog) {
        let mut rest = text;

        while let Some(open) = rest.find('{') {
            let selector_text = rest[..open].trim();
            let after_open = &rest[open + 1..];
            let Some(close) = after_open.find('}') else {
                log.error("stylesheet block missing '}'");
                return;
            };
            let body = &after_open[..close];
            rest = &after_open[close + 1..];

            if selector_text.is_empty() {
                log.error("stylesheet block with empty selector");
                continue;
            }

            let bag = parse_property_bag(body, log);
            for selector in selector_text.split(',') {
                let key = selector.trim().to_ascii_lowercase();
                if key.is_empty() {
                    continue;
                }
                self.insert(key, bag.clone());
            }
        }

        if !rest.trim().is_empty() {
            log.error(format!(
                "trailing stylesheet text ignored: '{}'",
                rest.trim()
            ));
        }
    }

    /// Build the document stylesheet from every `<style>` block in the
    /// tree, in document order (later blocks win ties per property).
    #[must_use]
    pub fn from_tree(tree: &MarkupTree, log: &mut DiagnosticLog) -> Self {
        let mut sheet = Self::new();
        collect_style_blocks(tree, tree.root(), &mut sheet, log);
        sheet
    }
}

/// Recursively collect and parse `<style>` payloads in document order.
fn collect_style_blocks(
    tree: &MarkupTree,
    id: NodeId,
    sheet: &mut StyleSheet,
    log: &mut DiagnosticLog,
) {
    if *tree.kind(id) == NodeKind::StyleBlock {
        sheet.parse_into(&tree.direct_text(id), log);
    }
    for &child in tree.children(id) {
        collect_style_blocks(tree, child, sheet, log);
    }
}
