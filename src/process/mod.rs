//! Live process access for the current platform
//!
//! [`SystemMemory`] is the [`MemoryAccess`] used by the binary. On Windows it
//! opens processes through `OpenProcess`, on Linux through procfs. Other
//! platforms report every open as unsupported.

#[cfg(windows)]
pub mod handle;
#[cfg(target_os = "linux")]
pub mod procfs;

#[cfg(windows)]
pub use handle::{ProcessAccess, ProcessHandle};
#[cfg(target_os = "linux")]
pub use procfs::ProcfsProcess;

use crate::core::types::{MemoryResult, ProcessId};
use crate::memory::MemoryAccess;

#[cfg(windows)]
type SystemProcess = ProcessHandle;
#[cfg(target_os = "linux")]
type SystemProcess = ProcfsProcess;
#[cfg(not(any(windows, target_os = "linux")))]
type SystemProcess = unsupported::NoProcess;

/// Opens live processes with the platform backend
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMemory;

impl SystemMemory {
    /// Create the platform accessor
    pub fn new() -> Self {
        SystemMemory
    }
}

impl MemoryAccess for SystemMemory {
    type Process = SystemProcess;

    #[cfg(windows)]
    fn open(&self, pid: ProcessId) -> MemoryResult<Self::Process> {
        ProcessHandle::open_for_read_write(pid)
    }

    #[cfg(target_os = "linux")]
    fn open(&self, pid: ProcessId) -> MemoryResult<Self::Process> {
        ProcfsProcess::open(pid)
    }

    #[cfg(not(any(windows, target_os = "linux")))]
    fn open(&self, pid: ProcessId) -> MemoryResult<Self::Process> {
        Err(crate::core::types::MemoryError::UnsupportedOperation(format!(
            "cannot open process {} on {}",
            pid,
            std::env::consts::OS
        )))
    }
}

#[cfg(not(any(windows, target_os = "linux")))]
mod unsupported {
    use crate::core::types::{Address, MemoryResult, ProcessId};
    use crate::memory::{MemoryRegion, ProcessMemory};

    /// Never constructed; live access is unavailable on this platform
    #[derive(Debug)]
    pub enum NoProcess {}

    impl ProcessMemory for NoProcess {
        fn pid(&self) -> ProcessId {
            match *self {}
        }

        fn regions(&self) -> MemoryResult<Vec<MemoryRegion>> {
            match *self {}
        }

        fn read_bytes(&self, _address: Address, _len: usize) -> MemoryResult<Vec<u8>> {
            match *self {}
        }

        fn write_bytes(&self, _address: Address, _data: &[u8]) -> MemoryResult<()> {
            match *self {}
        }
    }
}
