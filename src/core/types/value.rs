//! Numeric types and typed values used as search targets

use super::error::{MemoryError, MemoryResult};
use crate::core::codec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric encodings the scanner understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericType {
    Int32,
    Int64,
    Float32,
    Float64,
}

impl NumericType {
    /// Returns the size in bytes for this type
    pub const fn size(&self) -> usize {
        codec::width(*self)
    }

    /// Checks if this is a two's-complement integer type
    pub const fn is_integer(&self) -> bool {
        matches!(self, NumericType::Int32 | NumericType::Int64)
    }

    /// Wire tag of the type
    pub const fn as_str(&self) -> &'static str {
        match self {
            NumericType::Int32 => "int32",
            NumericType::Int64 => "int64",
            NumericType::Float32 => "float32",
            NumericType::Float64 => "float64",
        }
    }
}

impl FromStr for NumericType {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int32" => Ok(NumericType::Int32),
            "int64" => Ok(NumericType::Int64),
            "float32" => Ok(NumericType::Float32),
            "float64" => Ok(NumericType::Float64),
            other => Err(MemoryError::UnsupportedType(other.to_string())),
        }
    }
}

impl fmt::Display for NumericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A numeric value bound to its type.
///
/// Holds the value as `f64` for comparisons and the exact encoded bytes for
/// byte-level matching and writes. Construction validates representability,
/// so a `TypedValue` always encodes.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedValue {
    ty: NumericType,
    number: f64,
    bytes: Vec<u8>,
}

impl TypedValue {
    /// Creates a typed value from a float
    pub fn new(ty: NumericType, value: f64) -> MemoryResult<Self> {
        let bytes = codec::encode(value, ty)?;
        let number = codec::decode(&bytes, ty)?;
        Ok(TypedValue { ty, number, bytes })
    }

    /// Creates a typed value from an integer without passing through `f64`,
    /// so every `Int64` keeps its exact bit pattern
    pub fn from_i64(ty: NumericType, value: i64) -> MemoryResult<Self> {
        let bytes = match ty {
            NumericType::Int32 => i32::try_from(value)
                .map_err(|_| {
                    MemoryError::InvalidValue(format!("{} cannot be represented as {}", value, ty))
                })?
                .to_le_bytes()
                .to_vec(),
            NumericType::Int64 => value.to_le_bytes().to_vec(),
            NumericType::Float32 | NumericType::Float64 => codec::encode(value as f64, ty)?,
        };
        let number = codec::decode(&bytes, ty)?;
        Ok(TypedValue { ty, number, bytes })
    }

    /// Returns the numeric type
    pub fn ty(&self) -> NumericType {
        self.ty
    }

    /// Returns the value as used for ordered comparisons
    pub fn as_f64(&self) -> f64 {
        self.number
    }

    /// Returns the little-endian encoding
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the encoded width in bytes
    pub fn width(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match codec::render(&self.bytes, self.ty) {
            Ok(text) => write!(f, "{} ({})", text, self.ty),
            Err(_) => write!(f, "<invalid> ({})", self.ty),
        }
    }
}
