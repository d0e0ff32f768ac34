//! Core module containing fundamental types and the value codec
//!
//! This module provides the building blocks used throughout memsearch:
//! address handling, numeric types and typed values, scan criteria and
//! hits, error types, and the little-endian codec.

pub mod codec;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    Address, MemoryError, MemoryResult, NumericType, Operator, ProcessId, ScanCriteria, ScanHit,
    TypedValue,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
