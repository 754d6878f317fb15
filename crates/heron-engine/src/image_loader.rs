//! Image decoding behind a content-hash cache.
//!
//! Layout asks for image sizes through the [`ImageProvider`] trait; this
//! implementation decodes files with the `image` crate and caches the
//! result keyed by a 64-bit hash of the source reference, so repeated
//! lookups within and across layout passes never re-decode.

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::{Path, PathBuf};

use heron_common::image::DecodedImage;
use heron_common::warning::warn_once;
use heron_style::{ImageProvider, ImageRef};

/// Hash of an image source reference, used as the cache key and as the
/// opaque handle layout hands to the painter.
#[must_use]
pub fn source_hash(uri: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    uri.hash(&mut hasher);
    hasher.finish()
}

/// File-backed image cache. Failed decodes are cached too, so a missing
/// file is only reported (and retried) once per document.
pub struct ImageCache {
    /// Directory image references resolve against (the document's).
    base_dir: PathBuf,
    /// Decoded images (or recorded failures) by source hash.
    entries: RefCell<HashMap<u64, Option<DecodedImage>>>,
}

impl ImageCache {
    /// Create a cache resolving relative references against `base_dir`.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            entries: RefCell::new(HashMap::new()),
        }
    }

    /// Drop all cached entries (call when the document changes).
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    /// The decoded pixel data behind a handle previously returned from
    /// [`ImageProvider::decode`], for the painter.
    #[must_use]
    pub fn pixels(&self, handle: u64) -> Option<DecodedImage> {
        self.entries.borrow().get(&handle).cloned().flatten()
    }

    fn decode_file(&self, uri: &str) -> Option<DecodedImage> {
        let path = if Path::new(uri).is_absolute() {
            PathBuf::from(uri)
        } else {
            self.base_dir.join(uri)
        };
        match image::open(&path) {
            Ok(decoded) => {
                let rgba = decoded.to_rgba8();
                let (width, height) = rgba.dimensions();
                Some(DecodedImage::new(width, height, rgba.into_raw()))
            }
            Err(error) => {
                warn_once("image", &format!("cannot decode '{uri}': {error}"));
                None
            }
        }
    }
}

impl ImageProvider for ImageCache {
    fn decode(&self, uri: &str) -> Option<ImageRef> {
        if uri.is_empty() {
            return None;
        }
        let key = source_hash(uri);

        if let Some(cached) = self.entries.borrow().get(&key) {
            return cached.as_ref().map(|image| {
                let (width, height) = image.dimensions_f32();
                ImageRef {
                    width,
                    height,
                    handle: key,
                }
            });
        }

        let decoded = self.decode_file(uri);
        let reference = decoded.as_ref().map(|image| {
            let (width, height) = image.dimensions_f32();
            ImageRef {
                width,
                height,
                handle: key,
            }
        });
        let _ = self.entries.borrow_mut().insert(key, decoded);
        reference
    }
}
