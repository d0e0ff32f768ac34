//! Owned kernel object handle, closed on drop

use crate::windows::bindings::kernel32;
use std::fmt;
use tracing::debug;
use winapi::um::winnt::HANDLE;

/// A kernel object handle owned by this process
pub struct Handle {
    raw: HANDLE,
}

impl Handle {
    /// Take ownership of a handle returned by a kernel32 call.
    ///
    /// # Safety
    /// `raw` must be null or an open handle that nothing else will close.
    pub unsafe fn from_raw(raw: HANDLE) -> Self {
        Handle { raw }
    }

    #[cfg(test)]
    pub(crate) fn empty() -> Self {
        Handle {
            raw: std::ptr::null_mut(),
        }
    }

    /// Whether a kernel object is attached
    pub fn is_open(&self) -> bool {
        !self.raw.is_null()
    }

    /// Borrow the raw handle for a kernel32 call
    pub fn as_raw(&self) -> HANDLE {
        self.raw
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if !self.is_open() {
            return;
        }
        if let Err(err) = unsafe { kernel32::close_handle(self.raw) } {
            debug!(handle = ?self.raw, error = %err, "CloseHandle failed");
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:p})", self.raw)
    }
}

// Process handles may be used from any thread of the owning process
unsafe impl Send for Handle {}
unsafe impl Sync for Handle {}
