//! Tests for tree mutation: attach_child / detach_child pairing, attribute
//! uniqueness, and the container invariant.

use heron_dom::{MarkupTree, NodeId, NodeKind};

// ========== attach_child ==========

#[test]
fn test_attach_sets_parent_and_order() {
    let mut tree = MarkupTree::new();
    let div = tree.alloc(NodeKind::Div);
    let p1 = tree.alloc(NodeKind::P);
    let p2 = tree.alloc(NodeKind::P);

    assert!(tree.attach_child(NodeId::ROOT, div));
    assert!(tree.attach_child(div, p1));
    assert!(tree.attach_child(div, p2));

    assert_eq!(tree.children(div), &[p1, p2]);
    assert_eq!(tree.parent(p1), Some(div));
    assert_eq!(tree.next_sibling(p1), Some(p2));
    assert_eq!(tree.prev_sibling(p2), Some(p1));
}

#[test]
fn test_attach_rejected_on_non_container() {
    let mut tree = MarkupTree::new();
    let br = tree.alloc(NodeKind::Br);
    let text = tree.alloc_text("x");

    assert!(!tree.attach_child(br, text));
    assert_eq!(tree.children(br).len(), 0);
    assert_eq!(tree.parent(text), None);
}

#[test]
fn test_alloc_does_not_attach() {
    let mut tree = MarkupTree::new();
    let p = tree.alloc(NodeKind::P);

    // Construction and tree membership are separate operations.
    assert_eq!(tree.parent(p), None);
    assert_eq!(tree.children(NodeId::ROOT).len(), 0);
}

// ========== detach_child ==========

#[test]
fn test_detach_middle_of_three() {
    let mut tree = MarkupTree::new();
    let div = tree.alloc(NodeKind::Div);
    let _ = tree.attach_child(NodeId::ROOT, div);

    let a = tree.alloc(NodeKind::Span);
    let b = tree.alloc(NodeKind::Span);
    let c = tree.alloc(NodeKind::Span);
    let _ = tree.attach_child(div, a);
    let _ = tree.attach_child(div, b);
    let _ = tree.attach_child(div, c);

    assert!(tree.detach_child(div, b));

    // a and c are siblings now; b is fully unlinked.
    assert_eq!(tree.children(div), &[a, c]);
    assert_eq!(tree.next_sibling(a), Some(c));
    assert_eq!(tree.prev_sibling(c), Some(a));
    assert_eq!(tree.parent(b), None);
    assert_eq!(tree.prev_sibling(b), None);
    assert_eq!(tree.next_sibling(b), None);
}

#[test]
fn test_detach_wrong_parent_is_noop() {
    let mut tree = MarkupTree::new();
    let div = tree.alloc(NodeKind::Div);
    let other = tree.alloc(NodeKind::Div);
    let child = tree.alloc(NodeKind::P);
    let _ = tree.attach_child(NodeId::ROOT, div);
    let _ = tree.attach_child(NodeId::ROOT, other);
    let _ = tree.attach_child(div, child);

    assert!(!tree.detach_child(other, child));
    assert_eq!(tree.parent(child), Some(div));
    assert_eq!(tree.children(div), &[child]);
}

#[test]
fn test_detach_then_reattach() {
    let mut tree = MarkupTree::new();
    let div = tree.alloc(NodeKind::Div);
    let ul = tree.alloc(NodeKind::Ul);
    let li = tree.alloc(NodeKind::Li);
    let _ = tree.attach_child(NodeId::ROOT, div);
    let _ = tree.attach_child(NodeId::ROOT, ul);
    let _ = tree.attach_child(div, li);

    assert!(tree.detach_child(div, li));
    assert!(tree.attach_child(ul, li));

    assert_eq!(tree.parent(li), Some(ul));
    assert_eq!(tree.children(div).len(), 0);
    assert_eq!(tree.children(ul), &[li]);
}

// ========== attributes ==========

#[test]
fn test_attribute_lookup_case_insensitive() {
    let mut tree = MarkupTree::new();
    let img = tree.alloc(NodeKind::Img);
    tree.add_attribute(img, "SRC".to_string(), "cat.png".to_string());

    let node = tree.get(img).unwrap();
    assert_eq!(node.attribute("src"), Some("cat.png"));
    assert_eq!(node.attribute("Src"), Some("cat.png"));
    assert_eq!(node.attribute("href"), None);
}

#[test]
fn test_attribute_names_unique() {
    let mut tree = MarkupTree::new();
    let a = tree.alloc(NodeKind::Anchor);
    tree.add_attribute(a, "href".to_string(), "first".to_string());
    tree.add_attribute(a, "HREF".to_string(), "second".to_string());

    let node = tree.get(a).unwrap();
    assert_eq!(node.attributes.len(), 1);
    // Replacement keeps the original position and spelling.
    assert_eq!(node.attributes[0].name, "href");
    assert_eq!(node.attribute("href"), Some("second"));
}

#[test]
fn test_classes_in_document_order() {
    let mut tree = MarkupTree::new();
    let p = tree.alloc(NodeKind::P);
    tree.add_attribute(p, "class".to_string(), "note  wide\tlast".to_string());

    let node = tree.get(p).unwrap();
    assert_eq!(node.classes(), vec!["note", "wide", "last"]);
}

// ========== queries ==========

#[test]
fn test_document_element_skips_non_elements() {
    let mut tree = MarkupTree::new();
    let text = tree.alloc_text("stray");
    let style = tree.alloc(NodeKind::StyleBlock);
    let body = tree.alloc(NodeKind::Body);
    let _ = tree.attach_child(NodeId::ROOT, text);
    let _ = tree.attach_child(NodeId::ROOT, style);
    let _ = tree.attach_child(NodeId::ROOT, body);

    assert_eq!(tree.document_element(), Some(body));
}

#[test]
fn test_ancestors_walk() {
    let mut tree = MarkupTree::new();
    let body = tree.alloc(NodeKind::Body);
    let div = tree.alloc(NodeKind::Div);
    let p = tree.alloc(NodeKind::P);
    let _ = tree.attach_child(NodeId::ROOT, body);
    let _ = tree.attach_child(body, div);
    let _ = tree.attach_child(div, p);

    let chain: Vec<_> = tree.ancestors(p).collect();
    assert_eq!(chain, vec![div, body, NodeId::ROOT]);
    assert!(tree.is_descendant_of(p, body));
    assert!(!tree.is_descendant_of(body, p));
}

#[test]
fn test_direct_text_concatenation() {
    let mut tree = MarkupTree::new();
    let style = tree.alloc(NodeKind::StyleBlock);
    let t1 = tree.alloc_text("p { color: red }\n");
    let t2 = tree.alloc_text("div { opacity: 0.5 }");
    let _ = tree.attach_child(NodeId::ROOT, style);
    let _ = tree.attach_child(style, t1);
    let _ = tree.attach_child(style, t2);

    assert_eq!(
        tree.direct_text(style),
        "p { color: red }\ndiv { opacity: 0.5 }"
    );
}
