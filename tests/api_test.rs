//! Request handling over the JSON line protocol

use memsearch::api::{handle_line, Response};
use memsearch::memory::{ScanOptions, SnapshotAccess, SnapshotProcess};
use memsearch::{Address, ProcessMemory, ScanEngine};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;

const PID: u32 = 77;

fn setup() -> (ScanEngine<SnapshotAccess>, Arc<SnapshotProcess>) {
    let mut data = 100i32.to_le_bytes().to_vec();
    data.extend_from_slice(&200i32.to_le_bytes());

    let mut access = SnapshotAccess::new();
    let image = access.insert(SnapshotProcess::new(PID).with_region(0x1000, data));
    let options = ScanOptions {
        parallel: false,
        max_threads: 1,
        chunk_size: 4096,
    };
    (ScanEngine::new(access, options).unwrap(), image)
}

fn call(engine: &ScanEngine<SnapshotAccess>, request: Value) -> Value {
    serde_json::to_value(handle_line(engine, &request.to_string())).unwrap()
}

#[test]
fn test_search_then_refine() {
    let (engine, image) = setup();

    let found = call(
        &engine,
        json!({"command": "search", "pid": PID, "value": "200", "dataType": "int32", "operation": "equal"}),
    );
    assert_eq!(
        found,
        json!({"results": [{"address": "0x1004", "value": "200", "raw": "c8000000"}]})
    );

    image
        .write_bytes(Address::new(0x1004), &250i32.to_le_bytes())
        .unwrap();

    let refined = call(
        &engine,
        json!({
            "command": "search",
            "pid": PID,
            "dataType": "int32",
            "operation": "increased",
            "previousResults": found["results"]
        }),
    );
    assert_eq!(refined["results"][0]["value"], "250");
    assert_eq!(refined["results"].as_array().unwrap().len(), 1);
}

#[test]
fn test_refine_with_display_only_results() {
    let (engine, _) = setup();

    let refined = call(
        &engine,
        json!({
            "command": "search",
            "pid": PID,
            "value": null,
            "dataType": "int32",
            "operation": "decreased",
            "previousResults": [{"address": "0x1004", "value": "300"}]
        }),
    );
    assert_eq!(
        refined,
        json!({"results": [{"address": "0x1004", "value": "200", "raw": "c8000000"}]})
    );
}

#[test]
fn test_modify() {
    let (engine, image) = setup();

    let response = call(
        &engine,
        json!({"command": "modify", "pid": PID, "address": "0x1000", "value": 12345, "dataType": "int32"}),
    );
    assert_eq!(response, json!({"ok": true}));
    assert_eq!(
        image.read_bytes(Address::new(0x1000), 4).unwrap(),
        12345i32.to_le_bytes().to_vec()
    );
}

#[test]
fn test_modify_invalid_value_does_not_write() {
    let (engine, image) = setup();

    let response = call(
        &engine,
        json!({"command": "modify", "pid": PID, "address": "0x1000", "value": "lots", "dataType": "int32"}),
    );
    assert_eq!(response["kind"], "InvalidValue");

    let response = call(
        &engine,
        json!({"command": "modify", "pid": PID, "address": "0x1000", "value": 1e12, "dataType": "int32"}),
    );
    assert_eq!(response["kind"], "InvalidValue");

    assert_eq!(image.write_count(), 0);
    assert_eq!(engine.access().open_handles(), 0);
}

#[test]
fn test_error_kinds() {
    let (engine, _) = setup();

    let cases = [
        (
            json!({"command": "search", "pid": PID, "value": 1, "dataType": "int16", "operation": "equal"}),
            "UnsupportedType",
        ),
        (
            json!({"command": "search", "pid": PID, "value": 1, "dataType": "int32", "operation": "between"}),
            "InvalidOperator",
        ),
        (
            json!({"command": "search", "pid": PID, "value": 1, "dataType": "int32", "operation": "increased"}),
            "InvalidOperator",
        ),
        (
            json!({"command": "search", "pid": PID + 1, "value": 1, "dataType": "int32", "operation": "equal"}),
            "ProcessNotFound",
        ),
        (
            json!({"command": "modify", "pid": PID, "address": "1000", "value": 1, "dataType": "int32"}),
            "InvalidAddress",
        ),
        (
            json!({"command": "modify", "pid": PID, "address": "0x9000", "value": 1, "dataType": "int32"}),
            "WriteFailed",
        ),
        (json!({"command": "attach", "pid": PID}), "JsonError"),
    ];

    for (request, kind) in cases {
        let response = call(&engine, request.clone());
        assert_eq!(response["kind"], kind, "request {}", request);
        assert!(response["error"].is_string());
    }
}

#[test]
fn test_malformed_line() {
    let (engine, _) = setup();
    let response = handle_line(&engine, "{not json");
    assert!(response.is_error());
    match response {
        Response::Error { kind, .. } => assert_eq!(kind, "JsonError"),
        other => panic!("unexpected response {:?}", other),
    }
}
