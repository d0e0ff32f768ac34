//! JSON request and response types for the line protocol
//!
//! Requests arrive as untyped JSON; this module coerces the loose fields
//! (numbers sent as strings, type and operator names, hex addresses) into
//! typed values before anything reaches the engine.

use crate::core::types::{
    Address, MemoryError, MemoryResult, NumericType, Operator, ProcessId, ScanHit, TypedValue,
};
use crate::engine::ScanEngine;
use crate::memory::MemoryAccess;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// One request line, tagged by `command`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum Request {
    Search(SearchRequest),
    Modify(ModifyRequest),
}

/// Search, or refine when `previousResults` is non-empty
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub pid: ProcessId,
    #[serde(default)]
    pub value: Value,
    pub data_type: String,
    pub operation: String,
    #[serde(default)]
    pub previous_results: Vec<ScanHit>,
}

/// Write a value at an address
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyRequest {
    pub pid: ProcessId,
    pub address: String,
    #[serde(default)]
    pub value: Value,
    pub data_type: String,
}

/// One response line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Results { results: Vec<ScanHit> },
    Modified { ok: bool },
    Error { error: String, kind: String },
}

impl Response {
    /// Successful modify
    pub fn ok() -> Self {
        Response::Modified { ok: true }
    }

    /// Error response carrying the variant name in `kind`
    pub fn error(err: &MemoryError) -> Self {
        Response::Error {
            error: err.to_string(),
            kind: err.kind().to_string(),
        }
    }

    /// Check if this is an error response
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }
}

impl From<MemoryResult<Vec<ScanHit>>> for Response {
    fn from(result: MemoryResult<Vec<ScanHit>>) -> Self {
        match result {
            Ok(results) => Response::Results { results },
            Err(e) => Response::error(&e),
        }
    }
}

impl From<MemoryResult<()>> for Response {
    fn from(result: MemoryResult<()>) -> Self {
        match result {
            Ok(()) => Response::ok(),
            Err(e) => Response::error(&e),
        }
    }
}

/// Resolve a JSON target into a typed value.
///
/// Accepts JSON numbers and numeric strings. A missing or `null` value is
/// only accepted for `increased`/`decreased`, whose target is never
/// compared, and resolves to zero.
pub fn resolve_value(
    value: &Value,
    ty: NumericType,
    operator: Option<Operator>,
) -> MemoryResult<TypedValue> {
    match value {
        Value::Number(n) => {
            if ty.is_integer() {
                if let Some(exact) = n.as_i64() {
                    return TypedValue::from_i64(ty, exact);
                }
            }
            match n.as_f64() {
                Some(number) => TypedValue::new(ty, number),
                None => Err(MemoryError::InvalidValue(format!(
                    "{} is not a {} value",
                    n, ty
                ))),
            }
        }
        Value::String(text) => resolve_text(text, ty),
        Value::Null if operator.map_or(false, |op| op.requires_previous()) => {
            TypedValue::from_i64(ty, 0)
        }
        Value::Null => Err(MemoryError::InvalidValue("value is required".to_string())),
        other => Err(MemoryError::InvalidValue(format!(
            "expected a number or numeric string, got {}",
            other
        ))),
    }
}

fn resolve_text(text: &str, ty: NumericType) -> MemoryResult<TypedValue> {
    let text = text.trim();
    if ty.is_integer() {
        if let Ok(exact) = text.parse::<i64>() {
            return TypedValue::from_i64(ty, exact);
        }
    }
    let number = text
        .parse::<f64>()
        .map_err(|_| MemoryError::InvalidValue(format!("'{}' is not a {} value", text, ty)))?;
    TypedValue::new(ty, number)
}

/// Run one parsed request against the engine
pub fn handle<A: MemoryAccess>(engine: &ScanEngine<A>, request: &Request) -> Response {
    match request {
        Request::Search(search) => run_search(engine, search).into(),
        Request::Modify(modify) => run_modify(engine, modify).into(),
    }
}

/// Parse and run one request line; a malformed line becomes an error response
pub fn handle_line<A: MemoryAccess>(engine: &ScanEngine<A>, line: &str) -> Response {
    match serde_json::from_str::<Request>(line) {
        Ok(request) => handle(engine, &request),
        Err(e) => {
            debug!(error = %e, "malformed request");
            Response::error(&MemoryError::from(e))
        }
    }
}

fn run_search<A: MemoryAccess>(
    engine: &ScanEngine<A>,
    request: &SearchRequest,
) -> MemoryResult<Vec<ScanHit>> {
    let ty: NumericType = request.data_type.parse()?;
    let operator: Operator = request.operation.parse()?;
    let target = resolve_value(&request.value, ty, Some(operator))?;
    engine.scan(request.pid, &target, operator, &request.previous_results)
}

fn run_modify<A: MemoryAccess>(
    engine: &ScanEngine<A>,
    request: &ModifyRequest,
) -> MemoryResult<()> {
    let ty: NumericType = request.data_type.parse()?;
    let address: Address = request.address.parse()?;
    let value = resolve_value(&request.value, ty, None)?;
    engine.modify(request.pid, address, &value)
}
