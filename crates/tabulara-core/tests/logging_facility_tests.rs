#![allow(clippy::unwrap_used, clippy::expect_used)]

use tabulara_core::errors::{ExError, ExErrorKind, TabularaError};
use tabulara_core::logging_facility::test_capture::init_test_capture;
use tabulara_core::{log_op_end, log_op_error, log_op_start};
use tabulara_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};
use tracing::Level;

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name, command_id = "cmd-log-1");

    let events = capture.events_for_command("cmd-log-1");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].op.as_deref(), Some(op_name));
    assert_eq!(events[0].event.as_deref(), Some(EVENT_START));
}

#[test]
fn test_log_op_end_records_duration() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let end_event = capture
        .events()
        .into_iter()
        .find(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END))
        .expect("Should have end event");
    assert_eq!(end_event.field("duration_ms"), Some("42"));
}

#[test]
fn test_validation_errors_log_at_warn_with_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = TabularaError::UnsupportedCommandType {
        command_type: "ArchiveSession".to_string(),
    };
    log_op_error!(op_name, err, duration_ms = 1);

    let error_event = capture
        .events()
        .into_iter()
        .find(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END_ERROR))
        .expect("Should have error event");
    assert_eq!(error_event.level, Level::WARN);
    assert_eq!(error_event.field("err_code"), Some("CMD_TYPE_UNSUPPORTED"));
    assert_eq!(error_event.field("err_kind"), Some("UnsupportedCommandType"));
}

#[test]
fn test_invariant_errors_log_at_error() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_4";

    let err = ExError::new(ExErrorKind::InvariantViolation).with_message("broken");
    log_op_error!(op_name, err, duration_ms = 2, command_id = "cmd-log-4");

    let events = capture.events_for_command("cmd-log-4");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].level, Level::ERROR);
    assert_eq!(events[0].field("err_code"), Some("INVARIANT_VIOLATION"));
}

#[test]
fn test_boundary_single_start_end() {
    let capture = init_test_capture();
    let op_name = "test_boundary_unique_5";

    log_op_start!(op_name);
    log_op_end!(op_name, duration_ms = 7);

    let starts = capture.count_events(|e| {
        e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_START)
    });
    let ends = capture.count_events(|e| {
        e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END)
    });
    assert_eq!(starts, 1);
    assert_eq!(ends, 1);
}

#[test]
#[should_panic(expected = "Expected event")]
fn test_capture_assert_event_exists_fails() {
    let capture = init_test_capture();
    capture.assert_event_exists("nonexistent_op_truly_unique_999", EVENT_START);
}
