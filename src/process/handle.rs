//! Windows process handle with RAII semantics

use crate::core::types::{Address, MemoryError, MemoryResult, ProcessId};
use crate::memory::{MemoryRegion, ProcessMemory};
use crate::windows::bindings::kernel32;
use crate::windows::types::Handle;
use std::fmt;

const MEM_COMMIT: u32 = 0x1000;
const PAGE_READWRITE: u32 = 0x04;
const PAGE_GUARD: u32 = 0x100;

/// Access rights for process handles
#[derive(Debug, Clone, Copy)]
pub struct ProcessAccess {
    value: u32,
}

impl ProcessAccess {
    /// Query information access
    pub const QUERY_INFORMATION: Self = Self { value: 0x0400 };
    /// Read memory access
    pub const VM_READ: Self = Self { value: 0x0010 };
    /// Write memory access
    pub const VM_WRITE: Self = Self { value: 0x0020 };
    /// Memory operation access, required alongside VM_WRITE
    pub const VM_OPERATION: Self = Self { value: 0x0008 };

    /// Combine access rights
    pub fn combine(rights: &[Self]) -> Self {
        let mut value = 0;
        for right in rights {
            value |= right.value;
        }
        Self { value }
    }

    /// Get raw value
    pub fn value(&self) -> u32 {
        self.value
    }
}

/// Safe wrapper around a Windows process handle
pub struct ProcessHandle {
    handle: Handle,
    pid: u32,
    access: ProcessAccess,
}

impl ProcessHandle {
    /// Open a process with specified access rights
    pub fn open(pid: u32, access: ProcessAccess) -> MemoryResult<Self> {
        let raw_handle = kernel32::open_process(pid, access.value())?;
        Ok(ProcessHandle {
            handle: unsafe { Handle::from_raw(raw_handle) },
            pid,
            access,
        })
    }

    /// Open a process for querying, reading and writing memory
    pub fn open_for_read_write(pid: u32) -> MemoryResult<Self> {
        Self::open(
            pid,
            ProcessAccess::combine(&[
                ProcessAccess::QUERY_INFORMATION,
                ProcessAccess::VM_READ,
                ProcessAccess::VM_WRITE,
                ProcessAccess::VM_OPERATION,
            ]),
        )
    }

    /// Get the access rights
    pub fn access(&self) -> ProcessAccess {
        self.access
    }

    /// Check if handle is valid
    pub fn is_valid(&self) -> bool {
        self.handle.is_open()
    }

    fn ensure_valid(&self) -> MemoryResult<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(MemoryError::InvalidHandle(
                "Process handle is null".to_string(),
            ))
        }
    }
}

impl ProcessMemory for ProcessHandle {
    fn pid(&self) -> ProcessId {
        self.pid
    }

    fn regions(&self) -> MemoryResult<Vec<MemoryRegion>> {
        self.ensure_valid()?;

        let mut regions = Vec::new();
        let mut address = 0usize;

        loop {
            let mbi = match unsafe { kernel32::virtual_query_ex(self.handle.as_raw(), address) } {
                Ok(mbi) => mbi,
                Err(_) => break,
            };
            let base = mbi.BaseAddress as usize;

            if mbi.State == MEM_COMMIT
                && mbi.Protect & PAGE_READWRITE != 0
                && mbi.Protect & PAGE_GUARD == 0
            {
                regions.push(MemoryRegion::new(Address::new(base), mbi.RegionSize));
            }

            match base.checked_add(mbi.RegionSize) {
                Some(next) if next > address => address = next,
                _ => break,
            }
        }

        Ok(regions)
    }

    fn read_bytes(&self, address: Address, len: usize) -> MemoryResult<Vec<u8>> {
        self.ensure_valid()?;

        let mut buffer = vec![0u8; len];
        let bytes_read =
            unsafe { kernel32::read_process_memory(self.handle.as_raw(), address.as_usize(), &mut buffer)? };

        if bytes_read != len {
            return Err(MemoryError::read_failed(
                address,
                format!("Partial read: expected {} bytes, read {} bytes", len, bytes_read),
            ));
        }
        Ok(buffer)
    }

    fn write_bytes(&self, address: Address, data: &[u8]) -> MemoryResult<()> {
        self.ensure_valid()?;

        let bytes_written =
            unsafe { kernel32::write_process_memory(self.handle.as_raw(), address.as_usize(), data)? };

        if bytes_written != data.len() {
            return Err(MemoryError::write_failed(
                address,
                format!(
                    "Partial write: expected {} bytes, wrote {} bytes",
                    data.len(),
                    bytes_written
                ),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid)
            .field("valid", &self.is_valid())
            .field("access", &format!("0x{:X}", self.access.value()))
            .finish()
    }
}
