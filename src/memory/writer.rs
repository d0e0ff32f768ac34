//! Typed value writes into process memory

use super::ProcessMemory;
use crate::core::types::{Address, MemoryResult, TypedValue};
use tracing::debug;

/// Writes encoded values through a [`ProcessMemory`] handle
pub struct MemoryWriter<'a, P: ?Sized> {
    process: &'a P,
}

impl<'a, P: ProcessMemory + ?Sized> MemoryWriter<'a, P> {
    /// Create a new memory writer
    pub fn new(process: &'a P) -> Self {
        MemoryWriter { process }
    }

    /// Write raw bytes to memory; empty writes are a no-op
    pub fn write_bytes(&self, address: Address, data: &[u8]) -> MemoryResult<()> {
        if data.is_empty() {
            return Ok(());
        }
        self.process.write_bytes(address, data)
    }

    /// Write the encoding of `value` at `address`.
    ///
    /// A short or refused write is returned as an error; nothing is retried.
    pub fn write_value(&self, address: Address, value: &TypedValue) -> MemoryResult<()> {
        debug!(%address, value = %value, "writing value");
        self.write_bytes(address, value.bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{MemoryError, NumericType};
    use crate::memory::SnapshotProcess;

    #[test]
    fn test_write_value_encodes() {
        let process = SnapshotProcess::new(1).with_region(0x1000, vec![0; 16]);
        let writer = MemoryWriter::new(&process);

        let value = TypedValue::new(NumericType::Float64, 2.5).unwrap();
        writer.write_value(Address::new(0x1008), &value).unwrap();

        assert_eq!(
            process.read_bytes(Address::new(0x1008), 8).unwrap(),
            2.5f64.to_le_bytes().to_vec()
        );
    }

    #[test]
    fn test_write_outside_region_fails() {
        let process = SnapshotProcess::new(1).with_region(0x1000, vec![0; 4]);
        let writer = MemoryWriter::new(&process);

        let value = TypedValue::new(NumericType::Int64, 1.0).unwrap();
        let err = writer.write_value(Address::new(0x1000), &value).unwrap_err();
        assert!(matches!(err, MemoryError::WriteFailed { .. }));
        assert_eq!(process.write_count(), 0);
    }

    #[test]
    fn test_empty_write_is_noop() {
        let process = SnapshotProcess::new(1);
        let writer = MemoryWriter::new(&process);
        assert!(writer.write_bytes(Address::new(0xDEAD), &[]).is_ok());
        assert_eq!(process.write_count(), 0);
    }
}
