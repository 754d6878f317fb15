//! Shared utilities for the Heron renderer.

/// Collected parse and style diagnostics.
pub mod diagnostics;
/// Decoded image data shared between layout and the renderer.
pub mod image;
/// Deduplicated console warnings for unsupported features.
pub mod warning;

pub use diagnostics::{Diagnostic, DiagnosticLog, Severity};
pub use image::DecodedImage;
pub use warning::{clear_warnings, warn_once};
