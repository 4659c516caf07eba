//! RunExtraction tests

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::*;
use proptest::prelude::*;
use tabulara_core::{extraction, Command, ExError, FailureStage, OutcomeView, TabularaError};

#[test]
fn test_successful_extraction_persists_outputs_and_two_events() {
    // GIVEN a preprocessed document
    let mut h = Harness::new();
    let doc = h.preprocessed_document("s1", "b1");

    // WHEN extraction runs
    let outcome = h.run("cmd-extract", extraction_cmd("s1", &doc, None)).unwrap();

    // THEN two ordered events are caused by the command
    let types: Vec<&str> = outcome.events.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(types, vec!["ExtractionCompleted", "DerivedDataUpdated"]);
    assert!(outcome.events.iter().all(|e| e.caused_by == "cmd-extract"));

    // AND the stored record matches the simulator output
    let record = h.store.get_extraction_output(&doc).unwrap();
    assert_eq!(record.outputs, extraction::simulate(&doc, "default-v1"));
    assert_eq!(record.generated_by_command_id, "cmd-extract");
    assert_eq!(
        h.store.get_document(&doc).unwrap().last_extraction_command_id.as_deref(),
        Some("cmd-extract")
    );
    assert!(matches!(outcome.view, OutcomeView::Extraction { .. }));
}

#[test]
fn test_imported_document_is_not_ready() {
    let mut h = Harness::new();
    let doc = h.import("cmd-import", "s1", &["b1"]).remove(0);

    match h.run("cmd-extract", extraction_cmd("s1", &doc, None)).unwrap_err() {
        TabularaError::PreconditionFailed { issues, .. } => {
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].field, "lifecycle_state");
            assert_eq!(issues[0].reason, "document_not_preprocess_ready");
        }
        other => panic!("Expected PreconditionFailed, got {:?}", other),
    }
}

#[test]
fn test_preconditions_are_collected_in_order() {
    let mut h = Harness::new();
    let cmd = Command::RunExtraction {
        session_id: "nope".to_string(),
        document_id: "nope:b1".to_string(),
        extraction_profile: "default-v1".to_string(),
        source_state: "raw".to_string(),
        force_fail_stage: None,
    };

    match h.run("cmd-extract", cmd).unwrap_err() {
        TabularaError::PreconditionFailed { issues, .. } => {
            let reasons: Vec<&str> = issues.iter().map(|i| i.reason.as_str()).collect();
            assert_eq!(
                reasons,
                vec!["source_state_mismatch", "session_not_found", "document_not_found"]
            );
        }
        other => panic!("Expected PreconditionFailed, got {:?}", other),
    }
}

#[test]
fn test_extractor_runtime_failure_is_byte_stable() {
    // GIVEN a preprocessed document
    let mut h = Harness::new();
    let doc = h.preprocessed_document("s1", "b1");
    let before = h.store.clone();

    // WHEN the extractor fails twice with identical input
    let render = |err: TabularaError| {
        serde_json::to_string(&ExError::from(err).to_error_object()).unwrap()
    };
    let first = h
        .run("cmd-extract", extraction_cmd("s1", &doc, Some(FailureStage::ExtractorRuntime)))
        .unwrap_err();
    let second = h
        .run("cmd-extract", extraction_cmd("s1", &doc, Some(FailureStage::ExtractorRuntime)))
        .unwrap_err();

    // THEN both error objects are identical and nothing changed
    assert_eq!(render(first), render(second));
    assert_eq!(h.store, before);
}

#[test]
fn test_extractor_runtime_fires_before_preconditions() {
    let mut h = Harness::new();
    let err = h
        .run(
            "cmd-extract",
            extraction_cmd("ghost", "ghost:b1", Some(FailureStage::ExtractorRuntime)),
        )
        .unwrap_err();
    assert!(matches!(err, TabularaError::ExtractionRuntime { .. }));
}

#[test]
fn test_retry_after_rollback_matches_clean_run() {
    // GIVEN two identical harnesses
    let mut clean = Harness::new();
    let mut retried = Harness::new();
    let doc = clean.preprocessed_document("s1", "b1");
    retried.preprocessed_document("s1", "b1");

    // WHEN one extracts directly and the other after a rolled back attempt
    let clean_outcome = clean
        .run("cmd-extract", extraction_cmd("s1", &doc, None))
        .unwrap();
    retried
        .run(
            "cmd-extract",
            extraction_cmd("s1", &doc, Some(FailureStage::PersistenceBeforeCommit)),
        )
        .unwrap_err();
    let retried_outcome = retried
        .run("cmd-extract", extraction_cmd("s1", &doc, None))
        .unwrap();

    // THEN the events match apart from their generated ids
    let strip = |o: &tabulara_core::CommandOutcome| {
        o.events
            .iter()
            .map(|e| (e.event_type.clone(), e.caused_by.clone(), e.data.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(strip(&clean_outcome), strip(&retried_outcome));
    assert_eq!(
        clean.store.get_extraction_output(&doc),
        retried.store.get_extraction_output(&doc)
    );
}

proptest! {
    #[test]
    fn prop_extraction_is_pure(document_id in "[a-z0-9:]{1,24}", profile in "[a-z0-9-]{1,16}") {
        let first = extraction::simulate(&document_id, &profile);
        let second = extraction::simulate(&document_id, &profile);
        prop_assert_eq!(&first, &second);
        prop_assert!(!first.tokens.is_empty());
        prop_assert_eq!(first.derived_values.len(), 3);
        for token in &first.tokens {
            prop_assert!(token.confidence >= 0.8 && token.confidence <= 0.99);
        }
    }
}
