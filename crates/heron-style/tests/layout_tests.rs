//! Integration tests for the flow layout engine: block placement, line
//! breaking, lists, tables, and images, using the deterministic
//! approximate font metrics (0.6px per character per pixel of size).

use heron_common::diagnostics::DiagnosticLog;
use heron_dom::{MarkupTree, NodeId, NodeKind};
use heron_markup::parse;
use heron_style::layout::FixedImages;
use heron_style::{
    ApproximateFontMetrics, FlowLayout, FragmentKind, ImageProvider, InlineStyles, LayoutOptions,
    LayoutResult, NoImages, Rgba, StyleSheet,
};

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

fn layout_with(html: &str, width: f32, images: &dyn ImageProvider) -> (MarkupTree, LayoutResult) {
    let (tree, _) = parse(html, true, false);
    let mut log = DiagnosticLog::new();
    let sheet = StyleSheet::from_tree(&tree, &mut log);
    let inline = InlineStyles::collect(&tree, &mut log);
    let result = FlowLayout::new(&tree, &sheet, &inline, &ApproximateFontMetrics, images).run(
        &LayoutOptions {
            width,
            ..LayoutOptions::default()
        },
    );
    (tree, result)
}

fn layout(html: &str, width: f32) -> (MarkupTree, LayoutResult) {
    layout_with(html, width, &NoImages)
}

/// All text runs in fragment order.
fn text_runs(result: &LayoutResult) -> Vec<(String, f32)> {
    result
        .fragments
        .iter()
        .filter_map(|f| match &f.kind {
            FragmentKind::Text { text, run_length, .. } => Some((text.clone(), *run_length)),
            _ => None,
        })
        .collect()
}

// ========== blocks ==========

#[test]
fn test_styled_paragraph_scenario() {
    // One paragraph fragment with the resolved color and margins, and one
    // text run "Hi" inside it.
    let (tree, result) = layout(
        r##"<p style="color:#FF0000; margin: 4px 8px;">Hi</p>"##,
        800.0,
    );
    let p = find_kind(&tree, &NodeKind::P).unwrap();

    let block = result
        .fragments
        .iter()
        .find(|f| f.node == Some(p) && matches!(f.kind, FragmentKind::Block))
        .expect("paragraph box fragment");
    assert_eq!(block.color, Rgba::rgb(255, 0, 0));
    assert!((block.bounds.top - 4.0).abs() < 0.01, "margin top 4px");
    assert!((block.bounds.left - 8.0).abs() < 0.01, "margin left 8px");
    assert!(
        (block.bounds.right - 792.0).abs() < 0.01,
        "margin right 8px"
    );

    let runs = text_runs(&result);
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].0, "Hi");

    let run = result
        .fragments
        .iter()
        .find(|f| matches!(f.kind, FragmentKind::Text { .. }))
        .unwrap();
    assert_eq!(run.color, Rgba::rgb(255, 0, 0));
}

#[test]
fn test_sibling_blocks_stack_downward() {
    let (tree, result) = layout("<p>one</p><p>two</p>", 800.0);
    let _ = tree;
    let blocks: Vec<_> = result
        .fragments
        .iter()
        .filter(|f| matches!(f.kind, FragmentKind::Block))
        .collect();
    assert_eq!(blocks.len(), 2);
    assert!(
        blocks[1].bounds.top >= blocks[0].bounds.bottom,
        "second paragraph starts below the first"
    );
}

#[test]
fn test_occupied_size_recorded() {
    let (_, result) = layout("<p>word</p>", 800.0);
    assert!(result.occupied.0 > 0.0);
    assert!(result.occupied.1 > 0.0);
    // Nothing reached past the produced fragments.
    let max_right = result
        .fragments
        .iter()
        .map(|f| f.bounds.right)
        .fold(0.0_f32, f32::max);
    assert!((result.occupied.0 - max_right).abs() < 0.01);
}

// ========== line breaking ==========

#[test]
fn test_text_wraps_within_width() {
    // 16px text -> 9.6px per char under the approximate metrics.
    let (_, result) = layout(
        "<p>one two three four five six seven eight nine ten</p>",
        120.0,
    );
    let runs = text_runs(&result);
    assert!(runs.len() > 1, "long text must wrap");

    for (text, width) in &runs {
        let unbreakable = !text
            .chars()
            .any(heron_style::layout::is_break_char);
        assert!(
            *width <= 120.0 + 0.01 || unbreakable,
            "run '{text}' of width {width} overflows 120"
        );
    }

    // Reassembling the runs preserves the words in order.
    let joined: String = runs
        .iter()
        .map(|(t, _)| t.trim())
        .collect::<Vec<_>>()
        .join(" ");
    assert_eq!(joined, "one two three four five six seven eight nine ten");
}

#[test]
fn test_runs_advance_down_the_page() {
    let (_, result) = layout("<p>aaa bbb ccc ddd eee fff ggg</p>", 60.0);
    let tops: Vec<f32> = result
        .fragments
        .iter()
        .filter(|f| matches!(f.kind, FragmentKind::Text { .. }))
        .map(|f| f.bounds.top)
        .collect();
    for pair in tops.windows(2) {
        assert!(pair[1] > pair[0], "each wrapped line sits lower");
    }
}

#[test]
fn test_br_forces_line_break() {
    let (_, result) = layout("<p>up<br>down</p>", 800.0);
    let runs: Vec<_> = result
        .fragments
        .iter()
        .filter(|f| matches!(f.kind, FragmentKind::Text { .. }))
        .collect();
    assert_eq!(runs.len(), 2);
    assert!(runs[1].bounds.top > runs[0].bounds.top);
    assert!((runs[1].bounds.left - runs[0].bounds.left).abs() < 0.01);
}

#[test]
fn test_preformatted_breaks_at_newlines() {
    let (_, result) = layout("<pre>first\nsecond</pre>", 800.0);
    let runs = text_runs(&result);
    assert_eq!(
        runs.iter().map(|(t, _)| t.as_str()).collect::<Vec<_>>(),
        vec!["first", "second"]
    );
}

#[test]
fn test_inline_spans_share_the_line() {
    let (_, result) = layout("<p><b>a</b><i>b</i></p>", 800.0);
    let runs: Vec<_> = result
        .fragments
        .iter()
        .filter(|f| matches!(f.kind, FragmentKind::Text { .. }))
        .collect();
    assert_eq!(runs.len(), 2);
    assert!(
        (runs[0].bounds.top - runs[1].bounds.top).abs() < 0.01,
        "inline kinds do not reset the line"
    );
    assert!(runs[1].bounds.left >= runs[0].bounds.right - 0.01);
}

#[test]
fn test_bold_and_italic_bits_reach_fragments() {
    let (_, result) = layout("<p><b>bold</b><em>slant</em></p>", 800.0);
    let fonts: Vec<_> = result
        .fragments
        .iter()
        .filter_map(|f| match &f.kind {
            FragmentKind::Text { font, .. } => Some(font.clone()),
            _ => None,
        })
        .collect();
    assert!(fonts[0].bold && !fonts[0].italic);
    assert!(fonts[1].italic && !fonts[1].bold);
}

// ========== lists ==========

#[test]
fn test_ordered_list_markers() {
    let (_, result) = layout("<ol><li>a</li><li>b</li></ol>", 800.0);
    let runs = text_runs(&result);
    let texts: Vec<&str> = runs.iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(texts, vec!["1.", "a", "2.", "b"]);
}

#[test]
fn test_marker_hangs_left_of_item_text() {
    let (_, result) = layout("<ul><li>item</li></ul>", 800.0);
    let runs: Vec<_> = result
        .fragments
        .iter()
        .filter(|f| matches!(f.kind, FragmentKind::Text { .. }))
        .collect();
    let (marker, item) = (runs[0], runs[1]);
    assert!(marker.bounds.right < item.bounds.left + 0.01);
    assert!((marker.bounds.top - item.bounds.top).abs() < 0.01);
}

#[test]
fn test_nested_unordered_glyphs_cycle() {
    let (_, result) = layout(
        "<ul><li>one<ul><li>two<ul><li>three</li></ul></li></ul></li></ul>",
        800.0,
    );
    let runs = text_runs(&result);
    let markers: Vec<&str> = runs
        .iter()
        .map(|(t, _)| t.as_str())
        .filter(|t| ["\u{2022}", "\u{25E6}", "\u{25AA}"].contains(t))
        .collect();
    assert_eq!(markers, vec!["\u{2022}", "\u{25E6}", "\u{25AA}"]);
}

#[test]
fn test_nested_ordered_alternates_numerals_and_letters() {
    let (_, result) = layout(
        "<ol><li>one<ol><li>two</li></ol></li></ol>",
        800.0,
    );
    let runs = text_runs(&result);
    let texts: Vec<&str> = runs.iter().map(|(t, _)| t.as_str()).collect();
    assert!(texts.contains(&"1."));
    assert!(texts.contains(&"a."));
}

#[test]
fn test_list_items_indented() {
    let (_, result) = layout("<p>flush</p><ul><li>indented</li></ul>", 800.0);
    let runs: Vec<_> = result
        .fragments
        .iter()
        .filter(|f| matches!(f.kind, FragmentKind::Text { .. }))
        .collect();
    let flush = runs[0];
    let indented = runs.last().unwrap();
    assert!(indented.bounds.left > flush.bounds.left + 10.0);
}

// ========== tables ==========

#[test]
fn test_table_column_scenario() {
    // 100px fixed, flexible, 20% in a 300px area.
    let spacing = heron_style::layout::CELL_SPACING;
    let (tree, result) = layout(
        r#"<table><tr>
            <td width="100px">a</td>
            <td>b</td>
            <td width="20%">c</td>
        </tr></table>"#,
        300.0,
    );

    let table = find_kind(&tree, &NodeKind::Table).unwrap();
    let cells: Vec<NodeId> = {
        let tr = find_kind(&tree, &NodeKind::Tr).unwrap();
        tree.children(tr).to_vec()
    };

    let cell_box = |id: NodeId| {
        result
            .fragments
            .iter()
            .find(|f| f.node == Some(id) && matches!(f.kind, FragmentKind::Block))
            .expect("cell box fragment")
    };

    let remaining = 300.0 - 2.0 * spacing - 100.0;
    assert!((cell_box(cells[0]).bounds.width() - 100.0).abs() < 0.01);
    assert!((cell_box(cells[2]).bounds.width() - remaining * 0.2).abs() < 0.01);
    // The flexible column absorbs whatever remains.
    assert!((cell_box(cells[1]).bounds.width() - (remaining - remaining * 0.2)).abs() < 0.01);

    // Columns fill the table width exactly (within tolerance).
    let total: f32 = cells
        .iter()
        .map(|&c| cell_box(c).bounds.width())
        .sum::<f32>()
        + 2.0 * spacing;
    assert!((total - 300.0).abs() < 0.01);

    let table_box = result
        .fragments
        .iter()
        .find(|f| f.node == Some(table))
        .unwrap();
    assert!(table_box.bounds.height() > 0.0);
}

#[test]
fn test_table_rows_stack_and_cells_align() {
    let (tree, result) = layout(
        "<table><tr><td>a</td><td>bb</td></tr><tr><td>c</td><td>d</td></tr></table>",
        400.0,
    );
    let rows: Vec<NodeId> = {
        let table = find_kind(&tree, &NodeKind::Table).unwrap();
        tree.children(table).to_vec()
    };
    let first_row_cells = tree.children(rows[0]).to_vec();
    let second_row_cells = tree.children(rows[1]).to_vec();

    let box_of = |id: NodeId| {
        result
            .fragments
            .iter()
            .find(|f| f.node == Some(id) && matches!(f.kind, FragmentKind::Block))
            .unwrap()
            .bounds
    };

    // Cells in one row share top and height.
    let a = box_of(first_row_cells[0]);
    let b = box_of(first_row_cells[1]);
    assert!((a.top - b.top).abs() < 0.01);
    assert!((a.bottom - b.bottom).abs() < 0.01);

    // The second row sits below the first.
    let c = box_of(second_row_cells[0]);
    assert!(c.top >= a.bottom);

    // Columns align across rows.
    assert!((c.left - a.left).abs() < 0.01);
}

#[test]
fn test_free_rows_and_cells_join_the_body() {
    // A row without a group and cells without a row still form a grid.
    let (tree, result) = layout(
        "<table><thead><tr><th>h</th></tr></thead><tr><td>r</td></tr><td>f</td></table>",
        400.0,
    );
    let _ = tree;
    let cell_boxes: Vec<_> = result
        .fragments
        .iter()
        .filter(|f| matches!(f.kind, FragmentKind::Block))
        .collect();
    // Table box + three cell boxes.
    assert_eq!(cell_boxes.len(), 4);

    let runs = text_runs(&result);
    let texts: Vec<&str> = runs.iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(texts, vec!["h", "r", "f"]);
}

#[test]
fn test_empty_table_degrades_to_zero_height() {
    let (tree, result) = layout("<table></table>", 400.0);
    let table = find_kind(&tree, &NodeKind::Table).unwrap();
    let table_box = result
        .fragments
        .iter()
        .find(|f| f.node == Some(table))
        .unwrap();
    assert!((table_box.bounds.height() - 0.0).abs() < 0.01);
}

// ========== images ==========

#[test]
fn test_image_uses_intrinsic_size() {
    let images = FixedImages {
        width: 40.0,
        height: 30.0,
    };
    let (_, result) = layout_with("<p><img src=\"x.png\"></p>", 800.0, &images);
    let image = result
        .fragments
        .iter()
        .find(|f| matches!(f.kind, FragmentKind::Image { .. }))
        .unwrap();
    assert!((image.bounds.width() - 40.0).abs() < 0.01);
    assert!((image.bounds.height() - 30.0).abs() < 0.01);
}

#[test]
fn test_image_attributes_override_logical_size() {
    let images = FixedImages {
        width: 40.0,
        height: 30.0,
    };
    let (_, result) = layout_with(
        "<p><img src=\"x.png\" width=\"80\" height=\"20\"></p>",
        800.0,
        &images,
    );
    let FragmentKind::Image {
        physical_width,
        logical_width,
        logical_height,
        ..
    } = result
        .fragments
        .iter()
        .find(|f| matches!(f.kind, FragmentKind::Image { .. }))
        .unwrap()
        .kind
        .clone()
    else {
        panic!("image fragment expected")
    };
    assert!((physical_width - 40.0).abs() < 0.01);
    assert!((logical_width - 80.0).abs() < 0.01);
    assert!((logical_height - 20.0).abs() < 0.01);
}

#[test]
fn test_tall_image_shifts_same_line_text_down() {
    let images = FixedImages {
        width: 20.0,
        height: 60.0,
    };
    let (_, result) = layout_with("<p>ab<img src=\"x.png\">cd</p>", 800.0, &images);

    let texts: Vec<_> = result
        .fragments
        .iter()
        .filter(|f| matches!(f.kind, FragmentKind::Text { .. }))
        .collect();
    let image = result
        .fragments
        .iter()
        .find(|f| matches!(f.kind, FragmentKind::Image { .. }))
        .unwrap();

    // Both runs end up on the same (shifted) baseline; the image top
    // stays at the top of the line.
    assert!((texts[0].bounds.top - texts[1].bounds.top).abs() < 0.01);
    assert!(texts[0].bounds.top > image.bounds.top);
    assert!((image.bounds.height() - 60.0).abs() < 0.01);
}

#[test]
fn test_wide_image_forces_line_break() {
    let images = FixedImages {
        width: 500.0,
        height: 20.0,
    };
    let (_, result) = layout_with("<p>text<img src=\"x.png\"></p>", 520.0, &images);
    let text = result
        .fragments
        .iter()
        .find(|f| matches!(f.kind, FragmentKind::Text { .. }))
        .unwrap();
    let image = result
        .fragments
        .iter()
        .find(|f| matches!(f.kind, FragmentKind::Image { .. }))
        .unwrap();
    assert!(image.bounds.top >= text.bounds.bottom - 0.01);
    assert!((image.bounds.left - text.bounds.left).abs() < 0.01);
}

#[test]
fn test_missing_image_degrades_to_placeholder() {
    let (_, result) = layout("<p><img src=\"gone.png\"></p>", 800.0);
    let FragmentKind::Image {
        physical_width,
        physical_height,
        ..
    } = result
        .fragments
        .iter()
        .find(|f| matches!(f.kind, FragmentKind::Image { .. }))
        .unwrap()
        .kind
        .clone()
    else {
        panic!("image fragment expected")
    };
    assert!((physical_width - 0.0).abs() < 0.01);
    assert!((physical_height - 0.0).abs() < 0.01);
}

// ========== links ==========

#[test]
fn test_link_fragment_covers_its_text() {
    let (tree, result) = layout("<p><a href=\"x.html\">go</a></p>", 800.0);
    let anchor = find_kind(&tree, &NodeKind::Anchor).unwrap();

    let link = result
        .fragments
        .iter()
        .find(|f| matches!(f.kind, FragmentKind::Link { .. }))
        .unwrap();
    assert_eq!(link.node, Some(anchor));
    let FragmentKind::Link { href, .. } = &link.kind else {
        panic!()
    };
    assert_eq!(href, "x.html");

    let run = result
        .fragments
        .iter()
        .find(|f| matches!(f.kind, FragmentKind::Text { .. }))
        .unwrap();
    assert!(link.bounds.left <= run.bounds.left + 0.01);
    assert!(link.bounds.right >= run.bounds.right - 0.01);

    // Link text picks up the link color and underline.
    let FragmentKind::Text { font, .. } = &run.kind else {
        panic!()
    };
    assert!(font.underline);
    assert_eq!(run.color, Rgba::rgb(0x00, 0x00, 0xee));
}

// ========== degenerate inputs ==========

#[test]
fn test_empty_document_produces_nothing() {
    let (_, result) = layout("", 800.0);
    assert!(result.fragments.is_empty());
    assert!((result.occupied.1 - 0.0).abs() < 0.01);
}

#[test]
fn test_zero_width_area_still_terminates() {
    let (_, result) = layout("<p>some words here</p>", 0.0);
    // Best-effort fragments, no abort, no infinite loop.
    assert!(!result.fragments.is_empty());
}
