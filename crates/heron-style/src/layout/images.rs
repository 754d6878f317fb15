//! Image collaborator interface for layout.
//!
//! Image decoding and texture upload are external concerns; layout only
//! needs the intrinsic size and an opaque handle the painter can map
//! back to the uploaded texture.

use serde::Serialize;

/// A decoded image as layout sees it: intrinsic size plus the painter's
/// opaque handle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImageRef {
    /// Intrinsic (physical) width in pixels.
    pub width: f32,
    /// Intrinsic (physical) height in pixels.
    pub height: f32,
    /// Opaque handle identifying the decoded data to the painter.
    pub handle: u64,
}

/// Decoding collaborator consulted during layout.
///
/// Lookups are read-only and idempotent within a pass; implementations
/// are expected to cache so repeated passes do not re-decode.
pub trait ImageProvider {
    /// Decode (or fetch from cache) the image behind `uri`. `None` means
    /// the source is unavailable; layout degrades to a zero-intrinsic-size
    /// placeholder.
    fn decode(&self, uri: &str) -> Option<ImageRef>;
}

/// A provider with no images: every lookup fails. Used in tests and for
/// text-only rendering.
pub struct NoImages;

impl ImageProvider for NoImages {
    fn decode(&self, _uri: &str) -> Option<ImageRef> {
        None
    }
}

/// A fixed-size provider for tests: every lookup succeeds with the same
/// dimensions.
pub struct FixedImages {
    /// Width returned for every image.
    pub width: f32,
    /// Height returned for every image.
    pub height: f32,
}

impl ImageProvider for FixedImages {
    fn decode(&self, _uri: &str) -> Option<ImageRef> {
        Some(ImageRef {
            width: self.width,
            height: self.height,
            handle: 0,
        })
    }
}
