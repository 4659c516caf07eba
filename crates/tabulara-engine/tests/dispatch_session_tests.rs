//! Session Dispatch Tests
//!
//! ## Scenarios Covered
//!
//! 1. CreateSession returns a fresh unpinned session in `created` status
//! 2. PinSession toggles the pin flag and emits the matching event
//! 3. PinSession on an unknown session is a precondition conflict

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::*;
use serde_json::json;
use tabulara_engine::DispatchOutcome;

fn pin_body(command_id: &str, session_id: &str, pinned: bool) -> serde_json::Value {
    envelope(
        command_id,
        "PinSession",
        json!({ "session_id": session_id, "pinned": pinned }),
    )
}

#[test]
fn test_create_session_returns_fresh_session() {
    // GIVEN an empty dispatcher
    let mut d = dispatcher();

    // WHEN two sessions are created
    let first = d.dispatch(&create_session_body("cmd-1"));
    let second = d.dispatch(&create_session_body("cmd-2"));

    // THEN both are accepted with distinct ids and default state
    assert_eq!(first.status_code(), 202);
    assert_eq!(first.body["accepted"], true);
    assert_eq!(first.body["command_id"], "cmd-1");
    assert_eq!(first.body["mutation_applied"], true);
    assert_eq!(first.body["event_appended"], true);
    assert_eq!(first.body["session"]["pinned"], false);
    assert_eq!(first.body["session"]["status"], "created");
    assert_eq!(first.body["session"]["project_id"], "p1");
    assert_ne!(first.body["session"]["id"], second.body["session"]["id"]);

    let events = first.body["events"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["type"], "SessionCreated");
    assert_eq!(events[0]["caused_by"], "cmd-1");
}

#[test]
fn test_mutation_timestamps_come_from_clock() {
    // GIVEN a dispatcher on a fixed clock and an envelope timestamp in the past
    let mut d = dispatcher();

    // WHEN a session is created
    let result = d.dispatch(&create_session_body("cmd-1"));

    // THEN the stored timestamps are the clock's, not the envelope's
    let session_id = result.body["session"]["id"].as_str().unwrap();
    assert_eq!(d.session(session_id).unwrap().created_at, test_now());
}

#[test]
fn test_pin_and_unpin_session() {
    // GIVEN an existing session
    let mut d = dispatcher();
    let created = d.dispatch(&create_session_body("cmd-1"));
    let session_id = created.body["session"]["id"].as_str().unwrap().to_string();

    // WHEN it is pinned and then unpinned
    let pinned = d.dispatch(&pin_body("cmd-2", &session_id, true));
    let unpinned = d.dispatch(&pin_body("cmd-3", &session_id, false));

    // THEN each command emits its own event and the flag follows
    assert_eq!(pinned.body["session"]["pinned"], true);
    assert_eq!(pinned.body["events"][0]["type"], "SessionPinned");
    assert_eq!(unpinned.body["session"]["pinned"], false);
    assert_eq!(unpinned.body["events"][0]["type"], "SessionUnpinned");
    assert!(!d.session(&session_id).unwrap().pinned);
    assert_eq!(d.audit_log_for_session(&session_id).len(), 3);
}

#[test]
fn test_pin_unknown_session_is_conflict() {
    // GIVEN an empty dispatcher
    let mut d = dispatcher();

    // WHEN pinning a session that does not exist
    let result = d.dispatch(&pin_body("cmd-1", "missing", true));

    // THEN the precondition fails and nothing is written
    assert_eq!(result.outcome, DispatchOutcome::PreconditionConflict);
    assert_eq!(result.status_code(), 409);
    assert_eq!(result.error_code(), Some("PRECONDITION_FAILED"));
    assert_eq!(result.body["error"]["category"], "precondition");
    assert_eq!(result.body["error"]["details"][0]["field"], "session_id");
    assert_eq!(result.body["error"]["details"][0]["reason"], "session_not_found");
    assert_eq!(result.body["mutation_applied"], false);
    assert_eq!(result.body["event_appended"], false);
    assert!(d.audit_log().is_empty());
    assert_eq!(d.ledger_len(), 0);
}
