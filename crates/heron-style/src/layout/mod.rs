//! Flow layout: node tree in, positioned fragments out.
//!
//! # Module Structure
//!
//! - [`fragment`] - output rectangles and fragment kinds
//! - [`fonts`] - font selection and the measurement collaborator
//! - [`images`] - the image decoding collaborator
//! - [`linebreak`] - greedy line breaking for proportional text
//! - [`list`] - list numbering context and bullet glyph selection
//! - [`table`] - table bookkeeping and two-pass column sizing
//! - [`flow`] - the recursive flow engine tying it all together

pub mod flow;
pub mod fonts;
pub mod fragment;
pub mod images;
pub mod linebreak;
pub mod list;
pub mod table;

// Re-exports for convenience
pub use flow::{FlowCarry, FlowLayout, LayoutOptions, LayoutResult};
pub use fonts::{ApproximateFontMetrics, FontMetrics, FontSelector};
pub use fragment::{Fragment, FragmentKind, Rect};
pub use images::{FixedImages, ImageProvider, ImageRef, NoImages};
pub use linebreak::{find_break, is_break_char};
pub use list::{BulletStyle, ListContext, forced_style};
pub use table::{
    CELL_SPACING, ColumnRequest, TableCellMetric, TableMetric, TableRowMetric,
    collect_structure, column_offsets, preferred_column_sizes,
};
