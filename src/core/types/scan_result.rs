//! Scan criteria and scan hit types

use super::{Address, MemoryError, MemoryResult, NumericType, TypedValue};
use crate::core::codec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Comparison applied to each candidate location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Equal,
    Greater,
    Less,
    Increased,
    Decreased,
}

impl Operator {
    /// Checks if this operator compares against a previously observed value
    pub fn requires_previous(&self) -> bool {
        matches!(self, Operator::Increased | Operator::Decreased)
    }

    /// Wire tag of the operator
    pub const fn as_str(&self) -> &'static str {
        match self {
            Operator::Equal => "equal",
            Operator::Greater => "greater",
            Operator::Less => "less",
            Operator::Increased => "increased",
            Operator::Decreased => "decreased",
        }
    }
}

impl FromStr for Operator {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equal" => Ok(Operator::Equal),
            "greater" => Ok(Operator::Greater),
            "less" => Ok(Operator::Less),
            "increased" => Ok(Operator::Increased),
            "decreased" => Ok(Operator::Decreased),
            other => Err(MemoryError::InvalidOperator(other.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target value and operator of a single scan call
#[derive(Debug, Clone, PartialEq)]
pub struct ScanCriteria {
    pub target: TypedValue,
    pub operator: Operator,
}

impl ScanCriteria {
    /// Creates new scan criteria
    pub fn new(target: TypedValue, operator: Operator) -> Self {
        ScanCriteria { target, operator }
    }

    /// Numeric type being searched
    pub fn ty(&self) -> NumericType {
        self.target.ty()
    }

    /// Window width in bytes
    pub fn width(&self) -> usize {
        self.target.width()
    }

    /// Rejects operators that need a baseline when there is none
    pub fn validate_full_scan(&self) -> MemoryResult<()> {
        if self.operator.requires_previous() {
            return Err(MemoryError::InvalidOperator(format!(
                "'{}' requires previous results",
                self.operator
            )));
        }
        Ok(())
    }

    /// Tests one window against the target.
    ///
    /// `Equal` compares bytes so NaN patterns match themselves; `Greater` and
    /// `Less` compare decoded values. Baseline operators never match here.
    pub fn matches_window(&self, window: &[u8]) -> bool {
        match self.operator {
            Operator::Equal => window == self.target.bytes(),
            Operator::Greater => codec::decode(window, self.ty())
                .map(|current| current > self.target.as_f64())
                .unwrap_or(false),
            Operator::Less => codec::decode(window, self.ty())
                .map(|current| current < self.target.as_f64())
                .unwrap_or(false),
            Operator::Increased | Operator::Decreased => false,
        }
    }

    /// Tests a freshly read value against a prior observation
    pub fn matches_baseline(&self, current: f64, baseline: f64) -> bool {
        match self.operator {
            Operator::Increased => current > baseline,
            Operator::Decreased => current < baseline,
            Operator::Equal | Operator::Greater | Operator::Less => false,
        }
    }
}

/// A location whose value satisfied the criteria at scan time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanHit {
    pub address: Address,
    /// Display form of the observed value
    pub value: String,
    /// Observed bytes as lowercase hex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl ScanHit {
    /// Creates a hit from the bytes observed at `address`
    pub fn observed(address: Address, bytes: &[u8], ty: NumericType) -> MemoryResult<Self> {
        let width = ty.size();
        if bytes.len() < width {
            return Err(MemoryError::insufficient_bytes(width, bytes.len()));
        }
        Ok(ScanHit {
            address,
            value: codec::render(bytes, ty)?,
            raw: Some(hex::encode(&bytes[..width])),
        })
    }

    /// Creates a hit carrying only a display value
    pub fn new(address: Address, value: impl Into<String>) -> Self {
        ScanHit {
            address,
            value: value.into(),
            raw: None,
        }
    }

    /// Rebuilds the value observed when this hit was produced.
    ///
    /// Prefers the raw bytes; falls back to parsing the display string, which
    /// loses precision for floats and very large integers.
    pub fn baseline(&self, ty: NumericType) -> MemoryResult<f64> {
        if let Some(raw) = &self.raw {
            if let Ok(bytes) = hex::decode(raw) {
                if bytes.len() == ty.size() {
                    return codec::decode(&bytes, ty);
                }
            }
        }
        codec::parse_display(&self.value, ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria(ty: NumericType, value: f64, operator: Operator) -> ScanCriteria {
        ScanCriteria::new(TypedValue::new(ty, value).unwrap(), operator)
    }

    #[test]
    fn test_operator_tags() {
        for op in [
            Operator::Equal,
            Operator::Greater,
            Operator::Less,
            Operator::Increased,
            Operator::Decreased,
        ] {
            assert_eq!(op.as_str().parse::<Operator>().unwrap(), op);
        }
        assert!(matches!(
            "between".parse::<Operator>(),
            Err(MemoryError::InvalidOperator(_))
        ));
    }

    #[test]
    fn test_requires_previous() {
        assert!(Operator::Increased.requires_previous());
        assert!(Operator::Decreased.requires_previous());
        assert!(!Operator::Equal.requires_previous());
        assert!(!Operator::Greater.requires_previous());
        assert!(!Operator::Less.requires_previous());
    }

    #[test]
    fn test_full_scan_validation() {
        assert!(criteria(NumericType::Int32, 1.0, Operator::Equal)
            .validate_full_scan()
            .is_ok());
        let err = criteria(NumericType::Int32, 0.0, Operator::Increased)
            .validate_full_scan()
            .unwrap_err();
        assert!(matches!(err, MemoryError::InvalidOperator(_)));
    }

    #[test]
    fn test_equal_is_bytewise() {
        let nan_bits = f32::NAN.to_le_bytes();
        let c = criteria(NumericType::Float32, f64::NAN, Operator::Equal);
        assert!(c.matches_window(&nan_bits));
        assert!(!c.matches_window(&1.0f32.to_le_bytes()));
    }

    #[test]
    fn test_ordered_comparisons() {
        let greater = criteria(NumericType::Int32, 150.0, Operator::Greater);
        assert!(greater.matches_window(&200i32.to_le_bytes()));
        assert!(!greater.matches_window(&150i32.to_le_bytes()));
        assert!(!greater.matches_window(&(-200i32).to_le_bytes()));

        let less = criteria(NumericType::Float64, 0.5, Operator::Less);
        assert!(less.matches_window(&0.25f64.to_le_bytes()));
        assert!(!less.matches_window(&f64::NAN.to_le_bytes()));
        assert!(!less.matches_window(&[0, 0, 0]));
    }

    #[test]
    fn test_baseline_prefers_raw() {
        let big = (1i64 << 62) + 3;
        let hit = ScanHit::observed(Address::new(0x10), &big.to_le_bytes(), NumericType::Int64)
            .unwrap();
        assert_eq!(hit.raw.as_deref(), Some(hex::encode(big.to_le_bytes()).as_str()));
        assert_eq!(hit.baseline(NumericType::Int64).unwrap(), big as f64);

        let display_only = ScanHit::new(Address::new(0x10), "200");
        assert_eq!(display_only.baseline(NumericType::Int32).unwrap(), 200.0);

        let wrong_width = ScanHit {
            address: Address::new(0x10),
            value: "7".to_string(),
            raw: Some("0700".to_string()),
        };
        assert_eq!(wrong_width.baseline(NumericType::Int32).unwrap(), 7.0);
    }

    #[test]
    fn test_hit_wire_form() {
        let hit = ScanHit::observed(Address::new(0x1004), &200i32.to_le_bytes(), NumericType::Int32)
            .unwrap();
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"address": "0x1004", "value": "200", "raw": "c8000000"})
        );

        let parsed: ScanHit =
            serde_json::from_str(r#"{"address":"0x1004","value":"200"}"#).unwrap();
        assert_eq!(parsed, ScanHit::new(Address::new(0x1004), "200"));
    }
}
