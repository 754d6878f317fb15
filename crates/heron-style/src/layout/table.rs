//! Table layout bookkeeping and the two-pass column sizing algorithm.
//!
//! Pass 1 walks the table's row groups (plus free rows and cells outside
//! any group) and records each column's requested size: an explicit
//! width, a percentage, or the flexible sentinel. Pass 2 distributes the
//! available width: fixed columns are satisfied first, percentage
//! columns take their share of what remains, and flexible columns split
//! the leftover equally.

use heron_dom::{MarkupTree, NodeId, NodeKind};

use super::fragment::Rect;

/// Distance separating adjoining cells, and the table edge from its
/// first and last rows.
pub const CELL_SPACING: f32 = 2.0;

/// A column's requested size from pass 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnRequest {
    /// No cell in the column asked for a size; shares leftover space.
    Flexible,
    /// Largest explicit pixel width any cell asked for.
    Pixels(f32),
    /// Largest percentage any cell asked for.
    Percent(f32),
}

impl ColumnRequest {
    /// Fold another cell's request into the column's running maximum.
    ///
    /// Explicit pixels dominate percentages, which dominate the flexible
    /// sentinel; like kinds keep the larger magnitude.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::Pixels(a), Self::Pixels(b)) => Self::Pixels(a.max(b)),
            (Self::Pixels(a), _) | (_, Self::Pixels(a)) => Self::Pixels(a),
            (Self::Percent(a), Self::Percent(b)) => Self::Percent(a.max(b)),
            (Self::Percent(a), _) | (_, Self::Percent(a)) => Self::Percent(a),
            (Self::Flexible, Self::Flexible) => Self::Flexible,
        }
    }
}

/// Per-cell layout record: the node it came from and the fragment it
/// produced, for cross-lookup between the two passes and hit-testing.
#[derive(Debug, Clone)]
pub struct TableCellMetric {
    /// The `<td>`/`<th>` node, when the cell came from one.
    pub node: Option<NodeId>,
    /// Index of the cell's box fragment in the output sequence.
    pub fragment: Option<usize>,
    /// The cell's final rectangle.
    pub bounds: Rect,
}

/// Per-row layout record.
#[derive(Debug, Clone)]
pub struct TableRowMetric {
    /// The `<tr>` node, absent for rows synthesized from free cells.
    pub node: Option<NodeId>,
    /// Cells in column order.
    pub cells: Vec<TableCellMetric>,
    /// Resolved row height (max of the cells' measured extents).
    pub height: f32,
}

/// Per-table layout bookkeeping, pushed while the table lays out so
/// nested tables stack.
#[derive(Debug, Clone, Default)]
pub struct TableMetric {
    /// Pass-1 requested size per column.
    pub requested: Vec<ColumnRequest>,
    /// Pass-2 resolved pixel width per column.
    pub preferred: Vec<f32>,
    /// Header row-group metrics.
    pub head: Vec<TableRowMetric>,
    /// Body row-group metrics (includes synthesized free rows).
    pub body: Vec<TableRowMetric>,
    /// Footer row-group metrics.
    pub foot: Vec<TableRowMetric>,
}

/// A row as collected from the tree: its `<tr>` node (absent when
/// synthesized) and its cell nodes in order.
#[derive(Debug, Clone)]
pub struct TableRow {
    /// Originating `<tr>`, if any.
    pub node: Option<NodeId>,
    /// Cell nodes in column order.
    pub cells: Vec<NodeId>,
}

/// The table's rows partitioned into head/body/foot groups.
#[derive(Debug, Clone, Default)]
pub struct TableStructure {
    /// Rows from `<thead>`.
    pub head: Vec<TableRow>,
    /// Rows from `<tbody>`, free `<tr>`s, and synthesized free-cell rows.
    pub body: Vec<TableRow>,
    /// Rows from `<tfoot>`.
    pub foot: Vec<TableRow>,
}

impl TableStructure {
    /// All rows in paint order: head, body, foot.
    pub fn rows(&self) -> impl Iterator<Item = &TableRow> {
        self.head.iter().chain(self.body.iter()).chain(self.foot.iter())
    }

    /// The column count: the widest row's cell count.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.rows().map(|r| r.cells.len()).max().unwrap_or(0)
    }
}

/// Collect cell node ids from a `<tr>` element's children.
fn collect_cells_from_row(tree: &MarkupTree, tr: NodeId) -> Vec<NodeId> {
    tree.children(tr)
        .iter()
        .filter(|&&id| matches!(tree.kind(id), NodeKind::Td | NodeKind::Th))
        .copied()
        .collect()
}

/// Walk the table's children and partition rows into groups.
///
/// Free rows (a `<tr>` directly under the table) join the body. Free
/// cells (a `<td>`/`<th>` directly under the table) are synthesized into
/// a body row, continuing the trailing synthesized row unless a group or
/// row boundary has intervened since.
#[must_use]
pub fn collect_structure(tree: &MarkupTree, table: NodeId) -> TableStructure {
    let mut structure = TableStructure::default();
    // Whether the last body row can still absorb free cells.
    let mut open_synthetic_row = false;

    for &child in tree.children(table) {
        match tree.kind(child) {
            NodeKind::THead | NodeKind::TBody | NodeKind::TFoot => {
                let group_rows: Vec<TableRow> = tree
                    .children(child)
                    .iter()
                    .filter(|&&id| *tree.kind(id) == NodeKind::Tr)
                    .map(|&tr| TableRow {
                        node: Some(tr),
                        cells: collect_cells_from_row(tree, tr),
                    })
                    .collect();
                match tree.kind(child) {
                    NodeKind::THead => structure.head.extend(group_rows),
                    NodeKind::TFoot => structure.foot.extend(group_rows),
                    _ => structure.body.extend(group_rows),
                }
                open_synthetic_row = false;
            }
            NodeKind::Tr => {
                structure.body.push(TableRow {
                    node: Some(child),
                    cells: collect_cells_from_row(tree, child),
                });
                open_synthetic_row = false;
            }
            NodeKind::Td | NodeKind::Th => {
                if open_synthetic_row {
                    if let Some(row) = structure.body.last_mut() {
                        row.cells.push(child);
                        continue;
                    }
                }
                structure.body.push(TableRow {
                    node: None,
                    cells: vec![child],
                });
                open_synthetic_row = true;
            }
            // Text and anything else directly under the table is not
            // part of the grid.
            _ => {}
        }
    }

    structure
}

/// Pass 2: resolve requested sizes into pixel widths that fill
/// `available` exactly (fixed first, then percentages of the remainder,
/// then an equal split of the leftover among flexible columns).
///
/// When no column is flexible the leftover is spread equally over all
/// columns, so the widths still sum to the available width.
#[must_use]
pub fn preferred_column_sizes(requested: &[ColumnRequest], available: f32) -> Vec<f32> {
    let count = requested.len();
    if count == 0 {
        return Vec::new();
    }

    let for_columns = (available - CELL_SPACING * (count - 1) as f32).max(0.0);

    let fixed_sum: f32 = requested
        .iter()
        .map(|r| match r {
            ColumnRequest::Pixels(w) => *w,
            _ => 0.0,
        })
        .sum();
    let remaining = (for_columns - fixed_sum).max(0.0);

    // Percentages are shares of the space left after fixed columns.
    let mut widths: Vec<f32> = requested
        .iter()
        .map(|r| match r {
            ColumnRequest::Pixels(w) => *w,
            ColumnRequest::Percent(p) => p / 100.0 * remaining,
            ColumnRequest::Flexible => 0.0,
        })
        .collect();

    let percent_sum: f32 = requested
        .iter()
        .zip(&widths)
        .map(|(r, w)| match r {
            ColumnRequest::Percent(_) => *w,
            _ => 0.0,
        })
        .sum();
    let leftover = (remaining - percent_sum).max(0.0);

    let flexible_count = requested
        .iter()
        .filter(|r| matches!(r, ColumnRequest::Flexible))
        .count();

    if flexible_count > 0 {
        // Equal-weight share per flexible column.
        let share = leftover / flexible_count as f32;
        for (request, width) in requested.iter().zip(widths.iter_mut()) {
            if matches!(request, ColumnRequest::Flexible) {
                *width = share;
            }
        }
    } else if leftover > 0.0 {
        let bonus = leftover / count as f32;
        for width in &mut widths {
            *width += bonus;
        }
    }

    widths
}

/// Left edge of each column, from the table content left edge and the
/// preferred widths, with inter-cell spacing between columns.
#[must_use]
pub fn column_offsets(preferred: &[f32], start_x: f32) -> Vec<f32> {
    let mut offsets = Vec::with_capacity(preferred.len());
    let mut x = start_x;
    for &w in preferred {
        offsets.push(x);
        x += w + CELL_SPACING;
    }
    offsets
}
