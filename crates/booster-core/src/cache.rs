//! RAM image cache
//!
//! The updater runs entirely from RAM while it rewrites flash, so the
//! staged image is copied into a fixed-capacity buffer first. After the
//! copy the only permitted mutation is a single-byte patch.

use heapless::Vec;

use crate::error::{Error, Result};
use crate::geometry::RAM_CACHE_CAPACITY;

/// Fixed-capacity copy of the image being flashed
#[derive(Debug, Default)]
pub struct RamImageCache {
    data: Vec<u8, RAM_CACHE_CAPACITY>,
}

impl RamImageCache {
    /// Create an empty cache. Usable in a `static`.
    pub const fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Maximum image size the cache can hold
    pub const fn capacity(&self) -> usize {
        RAM_CACHE_CAPACITY
    }

    /// Replace the cache contents with exactly `src`
    ///
    /// On `InvalidImageSize` the cache is left unmodified.
    pub fn fill(&mut self, src: &[u8]) -> Result<()> {
        if src.len() > RAM_CACHE_CAPACITY {
            return Err(Error::InvalidImageSize);
        }
        self.data.clear();
        self.data
            .extend_from_slice(src)
            .map_err(|_| Error::InvalidImageSize)
    }

    /// Overwrite one byte of the cached image
    ///
    /// Offsets past the cached length fail with `MissingMultiboot`: the
    /// only byte ever patched is inside the boot header.
    pub fn patch(&mut self, offset: usize, value: u8) -> Result<()> {
        let byte = self.data.get_mut(offset).ok_or(Error::MissingMultiboot)?;
        *byte = value;
        Ok(())
    }

    /// The cached image
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Number of cached bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
