//! Core type definitions for memsearch
//!
//! This module contains all fundamental types used throughout the crate,
//! including the address wrapper, numeric types, scan criteria and hits,
//! and the error type.

mod address;
mod error;
mod scan_result;
mod value;

// Re-export all public types
pub use address::Address;
pub use error::{MemoryError, MemoryResult};
pub use scan_result::{Operator, ScanCriteria, ScanHit};
pub use value::{NumericType, TypedValue};

// Common type aliases
pub type ProcessId = u32;
