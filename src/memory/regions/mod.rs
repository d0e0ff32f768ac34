//! Memory region descriptions and chunked traversal

use crate::core::types::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A contiguous committed, readable and writable range of a process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRegion {
    /// Base address of the region
    pub base_address: Address,
    /// Size of the region in bytes
    pub size: usize,
}

impl MemoryRegion {
    /// Create a new region description
    pub const fn new(base_address: Address, size: usize) -> Self {
        MemoryRegion { base_address, size }
    }

    /// Get the end address of the region (exclusive)
    pub fn end_address(&self) -> Address {
        Address::new(self.base_address.as_usize().saturating_add(self.size))
    }

    /// Check if `len` bytes starting at `address` lie within this region
    pub fn contains_range(&self, address: Address, len: usize) -> bool {
        let start = address.as_usize();
        let base = self.base_address.as_usize();
        match start.checked_add(len) {
            Some(end) => start >= base && end <= self.end_address().as_usize(),
            None => false,
        }
    }

    /// Split the region into reads of at most `chunk_size` bytes.
    ///
    /// Consecutive chunks share `overlap` bytes, so with `overlap = width - 1`
    /// every window of `width` bytes lies entirely inside exactly one chunk's
    /// scannable range. Yields `(offset, len)` pairs relative to the base.
    pub fn chunks(&self, chunk_size: usize, overlap: usize) -> RegionChunks {
        RegionChunks {
            size: self.size,
            chunk_size: chunk_size.max(overlap + 1),
            overlap,
            next: Some(0),
        }
    }
}

impl fmt::Display for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.base_address, self.end_address())
    }
}

/// Iterator returned by [`MemoryRegion::chunks`]
#[derive(Debug, Clone)]
pub struct RegionChunks {
    size: usize,
    chunk_size: usize,
    overlap: usize,
    next: Option<usize>,
}

impl Iterator for RegionChunks {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next?;
        if start >= self.size {
            self.next = None;
            return None;
        }

        let len = self.chunk_size.min(self.size - start);
        self.next = if start + len >= self.size {
            None
        } else {
            Some(start + len - self.overlap)
        };
        Some((start, len))
    }
}
