//! Document Import and Duplicate Dispatch Tests
//!
//! ## Scenarios Covered
//!
//! 1. ImportDocument creates one document per blob and one event
//! 2. ImportDocument creates a placeholder session when needed
//! 3. Re-importing a blob yields a suffixed document id
//! 4. ConfirmDuplicate keys are order independent and idempotent per pair
//! 5. ConfirmDuplicate lineage checks

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::*;
use tabulara_core::apply::{DEFAULT_PLACEHOLDER_PROJECT_ID, DEFAULT_PLACEHOLDER_SCHEMA_ID};
use tabulara_engine::{DispatchOutcome, DispatcherConfig};

#[test]
fn test_import_creates_document_per_blob() {
    // GIVEN an empty dispatcher
    let mut d = dispatcher();

    // WHEN two blobs are imported into s1
    let result = d.dispatch(&import_body("cmd-import", "s1", &["b1", "b2"]));

    // THEN two documents exist and one event describes them both
    assert!(result.is_accepted());
    let ids: Vec<&str> = result.body["documents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|doc| doc["document_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["s1:b1", "s1:b2"]);
    assert_eq!(result.body["documents"][0]["lifecycle_state"], "imported");

    let events = result.body["events"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["type"], "DocumentImported");
    assert_eq!(events[0]["data"]["document_ids"][1], "s1:b2");
    assert_eq!(d.documents_in_session("s1").len(), 2);
}

#[test]
fn test_import_creates_placeholder_session() {
    // GIVEN a dispatcher with custom placeholder ids
    let config = DispatcherConfig {
        placeholder_project_id: "intake".to_string(),
        placeholder_schema_id: "generic".to_string(),
        ..DispatcherConfig::default()
    };
    let mut d = dispatcher_with(config);

    // WHEN importing into an unknown session
    let result = d.dispatch(&import_body("cmd-import", "s9", &["b1"]));

    // THEN the session is created with those ids and the event says so
    let session = d.session("s9").unwrap();
    assert_eq!(session.project_id, "intake");
    assert_eq!(session.schema_id, "generic");
    assert_eq!(result.body["events"][0]["data"]["session_created"], true);
    assert_ne!(session.project_id, DEFAULT_PLACEHOLDER_PROJECT_ID);
    assert_ne!(session.schema_id, DEFAULT_PLACEHOLDER_SCHEMA_ID);
}

#[test]
fn test_reimport_suffixes_document_id() {
    // GIVEN b1 already imported into s1
    let mut d = dispatcher();
    import(&mut d, "cmd-import-1", "s1", &["b1"]);

    // WHEN b1 is imported again twice
    let second = import(&mut d, "cmd-import-2", "s1", &["b1"]);
    let third = import(&mut d, "cmd-import-3", "s1", &["b1"]);

    // THEN the original id is kept and new ids are suffixed
    assert_eq!(second, vec!["s1:b1:reimport-1"]);
    assert_eq!(third, vec!["s1:b1:reimport-2"]);
    assert_eq!(d.document("s1:b1").unwrap().import_command_id, "cmd-import-1");
}

#[test]
fn test_duplicate_keys_are_order_independent() {
    // GIVEN two imported documents
    let mut d = dispatcher();
    import(&mut d, "cmd-import", "s1", &["b1", "b2"]);

    // WHEN the pair is confirmed in both orders
    let forward = d.dispatch(&duplicate_body("cmd-dup-1", "s1", "s1:b2", "s1:b1", "cmd-import"));
    let reverse = d.dispatch(&duplicate_body("cmd-dup-2", "s1", "s1:b1", "s1:b2", "cmd-import"));

    // THEN both report the same keys and only one record exists
    assert!(forward.is_accepted());
    assert!(reverse.is_accepted());
    let fwd = &forward.body["duplicate"]["correlation"];
    let rev = &reverse.body["duplicate"]["correlation"];
    assert_eq!(fwd["pair_key"], "s1:b1::s1:b2");
    assert_eq!(fwd["deterministic_key"], rev["deterministic_key"]);
    assert_eq!(fwd["pair_key"], rev["pair_key"]);
    assert_eq!(forward.body["already_marked"], false);
    assert_eq!(reverse.body["already_marked"], true);
    assert_eq!(d.duplicates_in_session("s1").len(), 1);
}

#[test]
fn test_duplicate_requires_matching_import_lineage() {
    // GIVEN documents imported by different commands
    let mut d = dispatcher();
    import(&mut d, "cmd-import-a", "s1", &["b1"]);
    import(&mut d, "cmd-import-b", "s1", &["b2", "b3"]);
    let before = snapshot(&d);

    // WHEN confirming a pair citing an import that produced neither document
    let result = d.dispatch(&duplicate_body("cmd-dup", "s1", "s1:b2", "s1:b3", "cmd-import-a"));

    // THEN the lineage check fails and nothing changes
    assert_eq!(result.outcome, DispatchOutcome::PreconditionConflict);
    let details = result.body["error"]["details"].as_array().unwrap();
    assert!(details.iter().any(|i| i["reason"] == "lineage_mismatch"));
    assert_eq!(snapshot(&d), before);
}

#[test]
fn test_duplicate_unknown_source_import() {
    // GIVEN two imported documents
    let mut d = dispatcher();
    import(&mut d, "cmd-import", "s1", &["b1", "b2"]);

    // WHEN the cited import command was never processed
    let result = d.dispatch(&duplicate_body("cmd-dup", "s1", "s1:b1", "s1:b2", "cmd-nope"));

    // THEN the source import is reported missing
    assert_eq!(result.status_code(), 409);
    let details = result.body["error"]["details"].as_array().unwrap();
    assert!(details.iter().any(|i| i["reason"] == "source_import_not_found"));
}
