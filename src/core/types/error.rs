//! Error types for memory search and modify operations

use std::fmt;
use thiserror::Error;

/// Main error type for memory operations
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Invalid memory address: {0}")]
    InvalidAddress(String),

    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Access denied to process {pid}: {reason}")]
    AccessDenied { pid: u32, reason: String },

    #[error("Failed to read memory at {address}: {reason}")]
    ReadFailed { address: String, reason: String },

    #[error("Failed to write memory at {address}: {reason}")]
    WriteFailed { address: String, reason: String },

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Insufficient bytes: expected {expected}, got {actual}")]
    InsufficientBytes { expected: usize, actual: usize },

    #[error("Unsupported data type: {0}")]
    UnsupportedType(String),

    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for memory operations
pub type MemoryResult<T> = Result<T, MemoryError>;

impl MemoryError {
    /// Creates an access denied error for a process
    pub fn access_denied(pid: u32, reason: impl Into<String>) -> Self {
        MemoryError::AccessDenied {
            pid,
            reason: reason.into(),
        }
    }

    /// Creates a read failed error
    pub fn read_failed(address: impl fmt::Display, reason: impl Into<String>) -> Self {
        MemoryError::ReadFailed {
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a write failed error
    pub fn write_failed(address: impl fmt::Display, reason: impl Into<String>) -> Self {
        MemoryError::WriteFailed {
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates an insufficient bytes error
    pub fn insufficient_bytes(expected: usize, actual: usize) -> Self {
        MemoryError::InsufficientBytes { expected, actual }
    }

    /// Stable variant name, used by the request layer to tag error responses
    pub fn kind(&self) -> &'static str {
        match self {
            MemoryError::InvalidAddress(_) => "InvalidAddress",
            MemoryError::ProcessNotFound(_) => "ProcessNotFound",
            MemoryError::AccessDenied { .. } => "AccessDenied",
            MemoryError::ReadFailed { .. } => "ReadFailed",
            MemoryError::WriteFailed { .. } => "WriteFailed",
            MemoryError::InvalidValue(_) => "InvalidValue",
            MemoryError::InsufficientBytes { .. } => "InsufficientBytes",
            MemoryError::UnsupportedType(_) => "UnsupportedType",
            MemoryError::InvalidOperator(_) => "InvalidOperator",
            MemoryError::InvalidHandle(_) => "InvalidHandle",
            MemoryError::UnsupportedOperation(_) => "UnsupportedOperation",
            MemoryError::IoError(_) => "IoError",
            MemoryError::JsonError(_) => "JsonError",
        }
    }
}
