//! memsearch: value search, refine and modify over process memory
//!
//! The [`ScanEngine`] sweeps a process's writable regions for a typed value,
//! narrows prior hits on later calls, and writes values back. Process access
//! goes through the [`memory::MemoryAccess`] trait, implemented for live
//! processes by [`process::SystemMemory`] and for captured images by
//! [`memory::SnapshotAccess`].

pub mod api;
pub mod config;
pub mod core;
pub mod engine;
pub mod memory;
pub mod process;
#[cfg(windows)]
pub mod windows;

// Re-export main types from core module
pub use crate::core::types::{
    Address, MemoryError, MemoryResult, NumericType, Operator, ProcessId, ScanCriteria, ScanHit,
    TypedValue,
};

pub use engine::ScanEngine;
pub use memory::{MemoryAccess, ProcessMemory};
pub use process::SystemMemory;
