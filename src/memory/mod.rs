//! Memory operations module for scanning and writing process memory
//!
//! This module provides:
//! - The accessor traits the scanner and writer are written against
//! - Memory region descriptions
//! - The value scanner (full sweep and refine)
//! - The value writer
//! - An in-memory snapshot backend

pub mod regions;
pub mod scanner;
pub mod snapshot;
pub mod writer;

pub use regions::MemoryRegion;
pub use scanner::{find_matches, MemoryScanner, ScanOptions};
pub use snapshot::{SnapshotAccess, SnapshotHandle, SnapshotProcess};
pub use writer::MemoryWriter;

use crate::core::types::{Address, MemoryResult, ProcessId};

/// Read, write and region enumeration for one opened process.
///
/// Dropping the value releases the underlying handle.
pub trait ProcessMemory {
    /// Process ID this handle refers to
    fn pid(&self) -> ProcessId;

    /// Committed, readable and writable regions, in a stable order
    fn regions(&self) -> MemoryResult<Vec<MemoryRegion>>;

    /// Read exactly `len` bytes at `address`; a short read is an error
    fn read_bytes(&self, address: Address, len: usize) -> MemoryResult<Vec<u8>>;

    /// Write all of `data` at `address`; a short write is an error
    fn write_bytes(&self, address: Address, data: &[u8]) -> MemoryResult<()>;
}

/// Opens processes for scanning and modification
pub trait MemoryAccess {
    /// Handle type produced by [`MemoryAccess::open`]
    type Process: ProcessMemory + Sync;

    /// Open a process by ID
    fn open(&self, pid: ProcessId) -> MemoryResult<Self::Process>;
}

impl<T: MemoryAccess + ?Sized> MemoryAccess for &T {
    type Process = T::Process;

    fn open(&self, pid: ProcessId) -> MemoryResult<Self::Process> {
        (**self).open(pid)
    }
}
