#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use tabulara_core::{FixedClock, Store};
use tabulara_engine::{Dispatcher, DispatcherConfig};

pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap()
}

/// Dispatcher with default config and a fixed clock
pub fn dispatcher() -> Dispatcher {
    dispatcher_with(DispatcherConfig::default())
}

pub fn dispatcher_with(config: DispatcherConfig) -> Dispatcher {
    Dispatcher::new(config).with_clock(FixedClock::new(test_now()))
}

/// Well-formed envelope around a payload
pub fn envelope(command_id: &str, command_type: &str, payload: Value) -> Value {
    json!({
        "command_id": command_id,
        "type": command_type,
        "actor": { "id": "ops-1", "role": "ops-user" },
        "timestamp": "2026-01-05T09:59:00Z",
        "payload": payload,
    })
}

pub fn create_session_body(command_id: &str) -> Value {
    envelope(
        command_id,
        "CreateSession",
        json!({ "project_id": "p1", "schema_id": "invoice-v1" }),
    )
}

pub fn import_body(command_id: &str, session_id: &str, blob_ids: &[&str]) -> Value {
    envelope(
        command_id,
        "ImportDocument",
        json!({
            "session_id": session_id,
            "blob_ids": blob_ids,
            "metadata": {
                "source": "upload",
                "file_name": "invoice.pdf",
                "mime_type": "application/pdf",
            },
        }),
    )
}

pub fn duplicate_body(
    command_id: &str,
    session_id: &str,
    document_id: &str,
    duplicate_of: &str,
    source_import: &str,
) -> Value {
    envelope(
        command_id,
        "ConfirmDuplicate",
        json!({
            "session_id": session_id,
            "document_id": document_id,
            "duplicate_of_document_id": duplicate_of,
            "correlation": { "source_import_command_id": source_import, "detector": "hash" },
        }),
    )
}

pub fn preprocess_body(command_id: &str, session_id: &str, document_id: &str) -> Value {
    envelope(
        command_id,
        "ApplyPreprocessing",
        json!({
            "session_id": session_id,
            "document_id": document_id,
            "page_ids": ["p1", "p2"],
            "preprocessing_profile": "deskew-v1",
        }),
    )
}

pub fn reprocess_body(command_id: &str, session_id: &str, document_id: &str, target: &str) -> Value {
    envelope(
        command_id,
        "ReprocessDocument",
        json!({
            "session_id": session_id,
            "document_id": document_id,
            "target_state": target,
            "reason": "operator request",
        }),
    )
}

pub fn extraction_body(
    command_id: &str,
    session_id: &str,
    document_id: &str,
    force_fail_stage: Option<&str>,
) -> Value {
    let mut payload = json!({
        "session_id": session_id,
        "document_id": document_id,
        "extraction_profile": "default-v1",
        "source_state": "preprocess-ready",
    });
    if let Some(stage) = force_fail_stage {
        payload["force_fail_stage"] = Value::from(stage);
    }
    envelope(command_id, "RunExtraction", payload)
}

/// Import blobs and return the new document ids
pub fn import(d: &mut Dispatcher, command_id: &str, session_id: &str, blob_ids: &[&str]) -> Vec<String> {
    let result = d.dispatch(&import_body(command_id, session_id, blob_ids));
    assert!(result.is_accepted(), "import rejected: {}", result.body);
    result.body["documents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|doc| doc["document_id"].as_str().unwrap().to_string())
        .collect()
}

/// Import one blob into `s1` and preprocess it
pub fn preprocessed_document(d: &mut Dispatcher, blob_id: &str) -> String {
    let document_id = import(d, &format!("cmd-import-{}", blob_id), "s1", &[blob_id]).remove(0);
    let result = d.dispatch(&preprocess_body(
        &format!("cmd-preprocess-{}", blob_id),
        "s1",
        &document_id,
    ));
    assert!(result.is_accepted(), "preprocess rejected: {}", result.body);
    document_id
}

/// Copy of the store, for before/after comparisons
pub fn snapshot(d: &Dispatcher) -> Store {
    d.store().clone()
}
