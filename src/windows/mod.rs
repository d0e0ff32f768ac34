//! Windows API layer for process memory access
//!
//! Provides safe wrappers around the Windows API functions the Windows
//! backend needs. All unsafe FFI calls are contained within this module.

pub mod bindings;
pub mod types;

pub use bindings::kernel32;
pub use types::Handle;
