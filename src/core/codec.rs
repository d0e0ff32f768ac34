//! Fixed-width little-endian codec for the searchable numeric types
//!
//! Every comparison in the scanner works on the `f64` produced by [`decode`],
//! so operator logic is written once regardless of the underlying encoding.
//! Display strings come from [`format`] / [`render`] and are never compared.

use crate::core::types::{MemoryError, MemoryResult, NumericType};

// i64::MAX as f64 rounds up to 2^63, which is already out of range.
const I64_UPPER_EXCLUSIVE: f64 = 9_223_372_036_854_775_808.0;
const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;

/// Byte width of an encoded value
pub const fn width(ty: NumericType) -> usize {
    match ty {
        NumericType::Int32 | NumericType::Float32 => 4,
        NumericType::Int64 | NumericType::Float64 => 8,
    }
}

/// Encodes `value` as the little-endian representation of `ty`.
///
/// Integer types truncate fractional input toward zero and reject non-finite
/// or out-of-range values. `Float32` rejects finite values that would
/// overflow to infinity.
pub fn encode(value: f64, ty: NumericType) -> MemoryResult<Vec<u8>> {
    match ty {
        NumericType::Int32 => {
            if !value.is_finite()
                || value <= i32::MIN as f64 - 1.0
                || value >= i32::MAX as f64 + 1.0
            {
                return Err(out_of_range(value, ty));
            }
            Ok((value.trunc() as i32).to_le_bytes().to_vec())
        }
        NumericType::Int64 => {
            if !value.is_finite() || value < I64_LOWER || value >= I64_UPPER_EXCLUSIVE {
                return Err(out_of_range(value, ty));
            }
            Ok((value.trunc() as i64).to_le_bytes().to_vec())
        }
        NumericType::Float32 => {
            let narrowed = value as f32;
            if value.is_finite() && narrowed.is_infinite() {
                return Err(out_of_range(value, ty));
            }
            Ok(narrowed.to_le_bytes().to_vec())
        }
        NumericType::Float64 => Ok(value.to_le_bytes().to_vec()),
    }
}

/// Decodes the first `width(ty)` bytes of `bytes` into an `f64`
pub fn decode(bytes: &[u8], ty: NumericType) -> MemoryResult<f64> {
    let value = match ty {
        NumericType::Int32 => i32::from_le_bytes(take::<4>(bytes)?) as f64,
        NumericType::Int64 => i64::from_le_bytes(take::<8>(bytes)?) as f64,
        NumericType::Float32 => f32::from_le_bytes(take::<4>(bytes)?) as f64,
        NumericType::Float64 => f64::from_le_bytes(take::<8>(bytes)?),
    };
    Ok(value)
}

/// Formats a decoded number for display
pub fn format(value: f64, ty: NumericType) -> String {
    if ty.is_integer() {
        format!("{}", value as i64)
    } else {
        format!("{:.6}", value)
    }
}

/// Formats the value stored in `bytes` for display.
///
/// Integer types are rendered from the bytes directly so 64-bit values beyond
/// 2^53 keep every digit.
pub fn render(bytes: &[u8], ty: NumericType) -> MemoryResult<String> {
    match ty {
        NumericType::Int32 => Ok(i32::from_le_bytes(take::<4>(bytes)?).to_string()),
        NumericType::Int64 => Ok(i64::from_le_bytes(take::<8>(bytes)?).to_string()),
        NumericType::Float32 | NumericType::Float64 => Ok(format(decode(bytes, ty)?, ty)),
    }
}

/// Parses a display string produced by [`format`] or [`render`] back into a number
pub fn parse_display(text: &str, ty: NumericType) -> MemoryResult<f64> {
    let text = text.trim();
    if ty.is_integer() {
        if let Ok(exact) = text.parse::<i64>() {
            return Ok(exact as f64);
        }
    }
    text.parse::<f64>()
        .map_err(|_| MemoryError::InvalidValue(format!("'{}' is not a {} value", text, ty)))
}

fn take<const N: usize>(bytes: &[u8]) -> MemoryResult<[u8; N]> {
    if bytes.len() < N {
        return Err(MemoryError::insufficient_bytes(N, bytes.len()));
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    Ok(out)
}

fn out_of_range(value: f64, ty: NumericType) -> MemoryError {
    MemoryError::InvalidValue(format!("{} cannot be represented as {}", value, ty))
}
