//! Markup node tree for the Heron renderer.
//!
//! # Design
//!
//! The tree uses arena allocation with [`NodeId`] indices for all
//! relationships, providing O(1) access and traversal without borrow
//! checker issues. Children are owned by the arena in insertion order;
//! the parent link is a plain index (non-owning), so no reference cycles
//! exist and dropping the tree tears down every subtree.
//!
//! Tree shape is mutated exclusively through [`MarkupTree::attach_child`]
//! and [`MarkupTree::detach_child`]; the two operations keep the
//! parent/child/sibling links consistent by construction.

/// Node kinds and the static per-kind trait table.
pub mod kind;

pub use kind::{NodeKind, NodeTraits, traits};

/// A type-safe index into the node tree.
///
/// Provides O(1) access to any node in the tree without borrowing issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root document node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);
}

/// One name/value attribute pair on an element.
///
/// Attributes keep their document order; lookup by name is ASCII
/// case-insensitive and names are unique within a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name as written (lookup is case-insensitive).
    pub name: String,
    /// Decoded attribute value.
    pub value: String,
}

impl Attribute {
    /// Create a new attribute with the given name and value.
    #[must_use]
    pub const fn new(name: String, value: String) -> Self {
        Self { name, value }
    }
}

/// A node in the markup tree.
///
/// Stores indices for parent/child/sibling relationships, enabling O(1)
/// traversal in any direction. Only container kinds ever hold children;
/// only text-kind nodes carry a text payload.
#[derive(Debug, Clone)]
pub struct Node {
    /// The static category of this node.
    pub kind: NodeKind,

    /// Non-owning back-reference to the parent, absent for the root.
    pub parent: Option<NodeId>,

    /// Owned children in insertion (= reading/rendering) order.
    pub children: Vec<NodeId>,

    /// The node immediately following this one among its parent's children.
    pub next_sibling: Option<NodeId>,

    /// The node immediately preceding this one among its parent's children.
    pub prev_sibling: Option<NodeId>,

    /// Ordered attribute pairs, unique by (case-insensitive) name.
    pub attributes: Vec<Attribute>,

    /// Decoded text payload for text-kind nodes; empty otherwise.
    pub text: String,
}

impl Node {
    /// Look up an attribute value by name, ASCII case-insensitively.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    /// The space-separated class names from the `class` attribute, in
    /// document order. Order is significant for cascade resolution.
    #[must_use]
    pub fn classes(&self) -> Vec<&str> {
        self.attribute("class")
            .map(|v| v.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }

    /// The static trait row for this node's kind.
    #[must_use]
    pub fn traits(&self) -> NodeTraits {
        traits(&self.kind)
    }
}

/// Arena-based markup tree with O(1) node access and traversal.
///
/// All nodes live in a contiguous vector indexed by [`NodeId`]; the
/// synthetic document node is always at index 0.
#[derive(Debug, Clone)]
pub struct MarkupTree {
    /// All nodes in the tree, indexed by NodeId.
    nodes: Vec<Node>,
}

impl MarkupTree {
    /// Create a new tree with just the document node.
    #[must_use]
    pub fn new() -> Self {
        let document = Node {
            kind: NodeKind::Document,
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
            attributes: Vec::new(),
            text: String::new(),
        };
        MarkupTree {
            nodes: vec![document],
        }
    }

    /// Get the root document node ID.
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by its ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get a mutable reference to a node by its ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Get the number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree is empty (should always have at least the document).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a new node of the given kind and return its ID.
    ///
    /// The node is not yet attached to the tree: construction and tree
    /// membership are separate operations, joined only by
    /// [`MarkupTree::attach_child`].
    pub fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
            attributes: Vec::new(),
            text: String::new(),
        });
        id
    }

    /// Allocate a new text node carrying the given decoded payload.
    pub fn alloc_text(&mut self, text: impl Into<String>) -> NodeId {
        let id = self.alloc(NodeKind::Text);
        self.nodes[id.0].text = text.into();
        id
    }

    /// Append `child` as the last child of `parent`, updating parent,
    /// child-list, and sibling links together.
    ///
    /// Attaching under a non-container kind is rejected (returns `false`)
    /// so the "non-container kinds never have children" invariant cannot
    /// be violated from outside.
    pub fn attach_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !traits(&self.nodes[parent.0].kind).container {
            return false;
        }

        // Current last child of parent (if any), for sibling links.
        let prev_last_child = self.nodes[parent.0].children.last().copied();

        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);

        if let Some(prev_id) = prev_last_child {
            self.nodes[prev_id.0].next_sibling = Some(child);
            self.nodes[child.0].prev_sibling = Some(prev_id);
        }
        true
    }

    /// Remove `child` from `parent`'s child list, clearing the child's
    /// parent and sibling links and repairing its former neighbors'.
    ///
    /// The subtree under `child` is untouched and can be re-attached.
    /// Returns `false` when `child` is not a child of `parent`.
    pub fn detach_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.nodes[child.0].parent != Some(parent) {
            return false;
        }

        let Some(pos) = self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == child)
        else {
            return false;
        };
        let _ = self.nodes[parent.0].children.remove(pos);

        let prev = self.nodes[child.0].prev_sibling;
        let next = self.nodes[child.0].next_sibling;
        if let Some(prev_id) = prev {
            self.nodes[prev_id.0].next_sibling = next;
        }
        if let Some(next_id) = next {
            self.nodes[next_id.0].prev_sibling = prev;
        }

        let detached = &mut self.nodes[child.0];
        detached.parent = None;
        detached.prev_sibling = None;
        detached.next_sibling = None;
        true
    }

    /// Add an attribute to a node, keeping names unique: if the name is
    /// already present (case-insensitively) the value is replaced in
    /// place, preserving the attribute's original position.
    pub fn add_attribute(&mut self, id: NodeId, name: String, value: String) {
        let node = &mut self.nodes[id.0];
        if let Some(existing) = node
            .attributes
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(&name))
        {
            existing.value = value;
        } else {
            node.attributes.push(Attribute::new(name, value));
        }
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get all children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Get the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.first().copied())
    }

    /// Get the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.last().copied())
    }

    /// Get the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling)
    }

    /// Get the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling)
    }

    /// Check if `descendant` is a descendant of `ancestor`.
    #[must_use]
    pub fn is_descendant_of(&self, descendant: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.parent(descendant);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Iterate over all ancestors of a node, from parent to root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(id),
        }
    }

    /// The kind of a node, or the synthetic document kind for a stale id.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        const DOCUMENT: &NodeKind = &NodeKind::Document;
        self.get(id).map_or(DOCUMENT, |n| &n.kind)
    }

    /// Get text content if this node is a text node.
    #[must_use]
    pub fn as_text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match n.kind {
            NodeKind::Text => Some(n.text.as_str()),
            _ => None,
        })
    }

    /// The document element: the first element child of the document
    /// node, if any. Text and style payloads do not qualify.
    #[must_use]
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(NodeId::ROOT)
            .iter()
            .find(|&&id| {
                !matches!(
                    self.kind(id),
                    NodeKind::Text | NodeKind::StyleBlock | NodeKind::Script
                )
            })
            .copied()
    }

    /// Concatenated text payloads of a node's direct text children.
    ///
    /// Used for `<style>` and `<script>` payload extraction.
    #[must_use]
    pub fn direct_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            if let Some(text) = self.as_text(child) {
                out.push_str(text);
            }
        }
        out
    }
}

impl Default for MarkupTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over ancestors of a node.
pub struct AncestorIterator<'a> {
    tree: &'a MarkupTree,
    current: Option<NodeId>,
}

impl Iterator for AncestorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}
