//! In-memory process images
//!
//! A [`SnapshotProcess`] holds a set of regions as plain byte buffers and
//! implements [`ProcessMemory`] over them. It backs offline scans of captured
//! memory and lets tests model regions that disappear between enumeration
//! and read.

use super::{MemoryAccess, MemoryRegion, ProcessMemory};
use crate::core::types::{Address, MemoryError, MemoryResult, ProcessId};
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug)]
struct SnapshotRegion {
    region: MemoryRegion,
    /// `None` when the region is enumerated but cannot be read
    data: Option<Vec<u8>>,
}

/// A process image made of in-memory regions
#[derive(Debug)]
pub struct SnapshotProcess {
    pid: ProcessId,
    regions: RwLock<Vec<SnapshotRegion>>,
    writes: AtomicUsize,
}

impl SnapshotProcess {
    /// Create an empty image
    pub fn new(pid: ProcessId) -> Self {
        SnapshotProcess {
            pid,
            regions: RwLock::new(Vec::new()),
            writes: AtomicUsize::new(0),
        }
    }

    /// Builder form of [`SnapshotProcess::add_region`]
    pub fn with_region(self, base: usize, data: Vec<u8>) -> Self {
        self.add_region(Address::new(base), data);
        self
    }

    /// Builder form of [`SnapshotProcess::add_unreadable_region`]
    pub fn with_unreadable_region(self, base: usize, size: usize) -> Self {
        self.add_unreadable_region(Address::new(base), size);
        self
    }

    /// Add a readable and writable region holding `data`
    pub fn add_region(&self, base: Address, data: Vec<u8>) {
        self.regions_mut().push(SnapshotRegion {
            region: MemoryRegion::new(base, data.len()),
            data: Some(data),
        });
    }

    /// Add a region that is enumerated but fails every read and write
    pub fn add_unreadable_region(&self, base: Address, size: usize) {
        self.regions_mut().push(SnapshotRegion {
            region: MemoryRegion::new(base, size),
            data: None,
        });
    }

    /// Make the region starting at `base` unreadable, as if it was unmapped
    pub fn revoke(&self, base: Address) -> bool {
        let mut regions = self.regions_mut();
        match regions.iter_mut().find(|r| r.region.base_address == base) {
            Some(entry) => {
                entry.data = None;
                true
            }
            None => false,
        }
    }

    /// Number of successful writes applied to this image
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn regions_ref(&self) -> RwLockReadGuard<'_, Vec<SnapshotRegion>> {
        self.regions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn regions_mut(&self) -> RwLockWriteGuard<'_, Vec<SnapshotRegion>> {
        self.regions.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl ProcessMemory for SnapshotProcess {
    fn pid(&self) -> ProcessId {
        self.pid
    }

    fn regions(&self) -> MemoryResult<Vec<MemoryRegion>> {
        Ok(self.regions_ref().iter().map(|r| r.region).collect())
    }

    fn read_bytes(&self, address: Address, len: usize) -> MemoryResult<Vec<u8>> {
        let regions = self.regions_ref();
        let entry = regions
            .iter()
            .find(|r| r.region.contains_range(address, len))
            .ok_or_else(|| MemoryError::read_failed(address, "address not mapped"))?;
        let data = entry
            .data
            .as_ref()
            .ok_or_else(|| MemoryError::read_failed(address, "region is not readable"))?;

        let start = address.as_usize() - entry.region.base_address.as_usize();
        Ok(data[start..start + len].to_vec())
    }

    fn write_bytes(&self, address: Address, bytes: &[u8]) -> MemoryResult<()> {
        let mut regions = self.regions_mut();
        let entry = regions
            .iter_mut()
            .find(|r| r.region.contains_range(address, bytes.len()))
            .ok_or_else(|| MemoryError::write_failed(address, "address not mapped"))?;
        let base = entry.region.base_address.as_usize();
        let data = entry
            .data
            .as_mut()
            .ok_or_else(|| MemoryError::write_failed(address, "region is not writable"))?;

        let start = address.as_usize() - base;
        data[start..start + bytes.len()].copy_from_slice(bytes);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Opened handle to a [`SnapshotProcess`]; tracked by its [`SnapshotAccess`]
#[derive(Debug)]
pub struct SnapshotHandle {
    process: Arc<SnapshotProcess>,
    open_handles: Arc<AtomicUsize>,
}

impl Deref for SnapshotHandle {
    type Target = SnapshotProcess;

    fn deref(&self) -> &Self::Target {
        &self.process
    }
}

impl Drop for SnapshotHandle {
    fn drop(&mut self) {
        self.open_handles.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ProcessMemory for SnapshotHandle {
    fn pid(&self) -> ProcessId {
        self.process.pid()
    }

    fn regions(&self) -> MemoryResult<Vec<MemoryRegion>> {
        self.process.regions()
    }

    fn read_bytes(&self, address: Address, len: usize) -> MemoryResult<Vec<u8>> {
        self.process.read_bytes(address, len)
    }

    fn write_bytes(&self, address: Address, data: &[u8]) -> MemoryResult<()> {
        self.process.write_bytes(address, data)
    }
}

/// A set of snapshot processes addressable by PID
#[derive(Debug, Default)]
pub struct SnapshotAccess {
    processes: HashMap<ProcessId, Arc<SnapshotProcess>>,
    open_handles: Arc<AtomicUsize>,
}

impl SnapshotAccess {
    /// Create an access layer with no processes
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a process image and return a shared reference to it
    pub fn insert(&mut self, process: SnapshotProcess) -> Arc<SnapshotProcess> {
        let process = Arc::new(process);
        self.processes.insert(process.pid(), Arc::clone(&process));
        process
    }

    /// Number of handles currently open
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }
}

impl MemoryAccess for SnapshotAccess {
    type Process = SnapshotHandle;

    fn open(&self, pid: ProcessId) -> MemoryResult<Self::Process> {
        let process = self
            .processes
            .get(&pid)
            .ok_or_else(|| MemoryError::ProcessNotFound(format!("PID: {}", pid)))?;
        self.open_handles.fetch_add(1, Ordering::SeqCst);
        Ok(SnapshotHandle {
            process: Arc::clone(process),
            open_handles: Arc::clone(&self.open_handles),
        })
    }
}
