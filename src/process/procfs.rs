//! Linux process memory through `/proc/<pid>/maps` and `/proc/<pid>/mem`

use crate::core::types::{Address, MemoryError, MemoryResult, ProcessId};
use crate::memory::{MemoryRegion, ProcessMemory};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::path::PathBuf;

/// An opened `/proc/<pid>/mem` file; closed on drop
#[derive(Debug)]
pub struct ProcfsProcess {
    pid: ProcessId,
    root: PathBuf,
    mem: File,
    writable: bool,
}

impl ProcfsProcess {
    /// Open a process, falling back to read-only when writes are refused
    pub fn open(pid: ProcessId) -> MemoryResult<Self> {
        let root = PathBuf::from(format!("/proc/{}", pid));
        if pid == 0 || !root.is_dir() {
            return Err(MemoryError::ProcessNotFound(format!("PID: {}", pid)));
        }

        let path = root.join("mem");
        let (mem, writable) = match OpenOptions::new().read(true).write(true).open(&path) {
            Ok(file) => (file, true),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                (File::open(&path).map_err(|e| open_error(pid, e))?, false)
            }
            Err(e) => return Err(open_error(pid, e)),
        };

        Ok(ProcfsProcess {
            pid,
            root,
            mem,
            writable,
        })
    }

    /// Whether the mem file was opened for writing
    pub fn is_writable(&self) -> bool {
        self.writable
    }
}

impl ProcessMemory for ProcfsProcess {
    fn pid(&self) -> ProcessId {
        self.pid
    }

    fn regions(&self) -> MemoryResult<Vec<MemoryRegion>> {
        let maps = fs::read_to_string(self.root.join("maps")).map_err(|e| open_error(self.pid, e))?;
        Ok(maps.lines().filter_map(parse_maps_line).collect())
    }

    fn read_bytes(&self, address: Address, len: usize) -> MemoryResult<Vec<u8>> {
        let mut buffer = vec![0u8; len];
        self.mem
            .read_exact_at(&mut buffer, address.as_usize() as u64)
            .map_err(|e| MemoryError::read_failed(address, e.to_string()))?;
        Ok(buffer)
    }

    fn write_bytes(&self, address: Address, data: &[u8]) -> MemoryResult<()> {
        if !self.writable {
            return Err(MemoryError::access_denied(
                self.pid,
                "process memory was opened read-only",
            ));
        }
        self.mem
            .write_all_at(data, address.as_usize() as u64)
            .map_err(|e| MemoryError::write_failed(address, e.to_string()))
    }
}

/// Parse one `/proc/<pid>/maps` line, keeping private or shared `rw` mappings
pub fn parse_maps_line(line: &str) -> Option<MemoryRegion> {
    let mut fields = line.split_whitespace();
    let range = fields.next()?;
    let perms = fields.next()?;
    if !perms.starts_with("rw") {
        return None;
    }

    let (start, end) = range.split_once('-')?;
    let start = usize::from_str_radix(start, 16).ok()?;
    let end = usize::from_str_radix(end, 16).ok()?;
    if end <= start {
        return None;
    }
    Some(MemoryRegion::new(Address::new(start), end - start))
}

fn open_error(pid: ProcessId, err: io::Error) -> MemoryError {
    match err.kind() {
        io::ErrorKind::NotFound => MemoryError::ProcessNotFound(format!("PID: {}", pid)),
        io::ErrorKind::PermissionDenied => MemoryError::access_denied(pid, err.to_string()),
        _ => MemoryError::IoError(err),
    }
}
