//! Integration tests for the markup parser: tree shape, recovery, and
//! diagnostics.

use heron_common::diagnostics::Severity;
use heron_dom::{MarkupTree, NodeId, NodeKind};
use heron_markup::parse;

/// Find the first node of `kind` in document order.
fn find_kind(tree: &MarkupTree, kind: &NodeKind) -> Option<NodeId> {
    fn walk(tree: &MarkupTree, id: NodeId, kind: &NodeKind) -> Option<NodeId> {
        if tree.kind(id) == kind {
            return Some(id);
        }
        for &child in tree.children(id) {
            if let Some(found) = walk(tree, child, kind) {
                return Some(found);
            }
        }
        None
    }
    walk(tree, tree.root(), kind)
}

#[test]
fn test_simple_document_shape() {
    let (tree, diagnostics) = parse("<html><body><p>Hello</p></body></html>", true, false);
    assert!(diagnostics.is_empty());

    let html = find_kind(&tree, &NodeKind::Html).unwrap();
    let body = find_kind(&tree, &NodeKind::Body).unwrap();
    let p = find_kind(&tree, &NodeKind::P).unwrap();

    assert_eq!(tree.parent(html), Some(NodeId::ROOT));
    assert_eq!(tree.parent(body), Some(html));
    assert_eq!(tree.parent(p), Some(body));
    assert_eq!(tree.as_text(tree.children(p)[0]), Some("Hello"));
}

#[test]
fn test_unknown_tag_recovers_with_warning() {
    let (tree, diagnostics) = parse("<foo>bar</foo>", true, false);

    let unknown = find_kind(&tree, &NodeKind::Unknown("foo".to_string())).unwrap();
    assert_eq!(tree.as_text(tree.children(unknown)[0]), Some("bar"));

    let warnings: Vec<_> = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("foo"));
}

#[test]
fn test_paragraph_auto_close() {
    let (tree, _) = parse("<body><p>one<p>two</body>", true, false);
    let body = find_kind(&tree, &NodeKind::Body).unwrap();

    let paragraphs: Vec<_> = tree
        .children(body)
        .iter()
        .filter(|&&id| *tree.kind(id) == NodeKind::P)
        .copied()
        .collect();
    assert_eq!(paragraphs.len(), 2, "second <p> must close the first");
    assert_eq!(
        tree.as_text(tree.children(paragraphs[0])[0]),
        Some("one")
    );
    assert_eq!(
        tree.as_text(tree.children(paragraphs[1])[0]),
        Some("two")
    );
}

#[test]
fn test_list_items_auto_close() {
    let (tree, _) = parse("<ul><li>a<li>b<li>c</ul>", true, false);
    let ul = find_kind(&tree, &NodeKind::Ul).unwrap();
    assert_eq!(tree.children(ul).len(), 3);
    for &li in tree.children(ul) {
        assert_eq!(*tree.kind(li), NodeKind::Li);
    }
}

#[test]
fn test_table_cells_auto_close() {
    let (tree, _) = parse(
        "<table><tr><td>a<td>b<tr><td>c</table>",
        true,
        false,
    );
    let table = find_kind(&tree, &NodeKind::Table).unwrap();
    let rows: Vec<_> = tree.children(table).to_vec();
    assert_eq!(rows.len(), 2);
    assert_eq!(tree.children(rows[0]).len(), 2);
    assert_eq!(tree.children(rows[1]).len(), 1);
}

#[test]
fn test_void_elements_take_no_children() {
    let (tree, _) = parse("<p>a<br>b<img src=x.png>c</p>", true, false);
    let p = find_kind(&tree, &NodeKind::P).unwrap();

    let kinds: Vec<_> = tree
        .children(p)
        .iter()
        .map(|&id| tree.kind(id).clone())
        .collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::Text,
            NodeKind::Br,
            NodeKind::Text,
            NodeKind::Img,
            NodeKind::Text
        ]
    );

    let br = find_kind(&tree, &NodeKind::Br).unwrap();
    assert_eq!(tree.children(br).len(), 0);
}

#[test]
fn test_style_block_payload_captured() {
    let (tree, _) = parse(
        "<html><style>p { color: red }</style><body></body></html>",
        true,
        false,
    );
    let style = find_kind(&tree, &NodeKind::StyleBlock).unwrap();
    assert_eq!(tree.direct_text(style), "p { color: red }");
}

#[test]
fn test_script_region_preserved_raw() {
    let (tree, diagnostics) = parse("<script>if (a<b) x;</script>", true, false);
    assert!(diagnostics.is_empty());
    let script = find_kind(&tree, &NodeKind::Script).unwrap();
    assert_eq!(tree.direct_text(script), "if (a<b) x;");
}

#[test]
fn test_entities_resolved_in_text() {
    let (tree, _) = parse("<p>a &amp; b &#65;</p>", true, false);
    let p = find_kind(&tree, &NodeKind::P).unwrap();
    assert_eq!(tree.as_text(tree.children(p)[0]), Some("a & b A"));
}

#[test]
fn test_entities_left_alone_when_disabled() {
    let (tree, _) = parse("<p>a &amp; b</p>", false, false);
    let p = find_kind(&tree, &NodeKind::P).unwrap();
    assert_eq!(tree.as_text(tree.children(p)[0]), Some("a &amp; b"));
}

#[test]
fn test_stray_close_tag_warns_and_continues() {
    let (tree, diagnostics) = parse("<p>text</div></p>", true, false);
    assert!(find_kind(&tree, &NodeKind::P).is_some());
    assert!(
        diagnostics
            .iter()
            .any(|d| d.message.contains("stray closing tag"))
    );
}

#[test]
fn test_mis_nested_inline_repaired() {
    let (tree, diagnostics) = parse("<div><b>bold</div>", true, false);
    let div = find_kind(&tree, &NodeKind::Div).unwrap();
    let b = find_kind(&tree, &NodeKind::Bold).unwrap();
    assert_eq!(tree.parent(b), Some(div));
    assert!(
        diagnostics
            .iter()
            .any(|d| d.message.contains("unclosed element"))
    );
}

#[test]
fn test_whitespace_dropped_in_structural_containers() {
    let (tree, _) = parse("<ul>\n  <li>a</li>\n  <li>b</li>\n</ul>", true, false);
    let ul = find_kind(&tree, &NodeKind::Ul).unwrap();
    assert_eq!(tree.children(ul).len(), 2);
}

#[test]
fn test_whitespace_kept_between_inline_elements() {
    let (tree, _) = parse("<p><b>a</b> <i>b</i></p>", true, false);
    let p = find_kind(&tree, &NodeKind::P).unwrap();
    let kinds: Vec<_> = tree
        .children(p)
        .iter()
        .map(|&id| tree.kind(id).clone())
        .collect();
    assert_eq!(
        kinds,
        vec![NodeKind::Bold, NodeKind::Text, NodeKind::Italic]
    );
}

#[test]
fn test_empty_input_yields_bare_document() {
    let (tree, diagnostics) = parse("", true, false);
    assert_eq!(tree.len(), 1);
    assert!(diagnostics.is_empty());
    assert_eq!(tree.document_element(), None);
}
