//! Command dispatcher
//!
//! ## Dispatch pipeline (in order):
//! 1. Envelope validation (required fields, actor, timestamp)
//! 2. Command type resolution
//! 3. Idempotency check against the ledger
//! 4. Payload validation for the resolved type
//! 5. Transactional apply (handler, invariants, commit, ledger record)
//!
//! A failure at any stage stops the pipeline with the store and ledger
//! untouched.

use std::time::Instant;

use serde_json::Value;
use tabulara_core::apply::apply;
use tabulara_core::clock::{Clock, SystemClock};
use tabulara_core::errors::{ExError, Result, TabularaError};
use tabulara_core::model::{
    AuditEvent, DerivedArtifact, Document, DuplicateRecord, ExtractionOutputRecord, LedgerEntry,
    Session,
};
use tabulara_core::policy::{LifecyclePolicy, OpenProfileCatalog, ProfileCatalog, ReprocessOnlyPolicy};
use tabulara_core::rules::validation;
use tabulara_core::{log_op_end, log_op_error, log_op_start};
use tabulara_core::{CommandContext, CommandOutcome, IdempotencyLedger, Store};
use tabulara_core_types::RequestContext;

use crate::config::DispatcherConfig;
use crate::result::DispatchResult;

const OP_DISPATCH: &str = "dispatch";

/// Single-writer front door to one store and one ledger
pub struct Dispatcher {
    store: Store,
    ledger: IdempotencyLedger,
    config: DispatcherConfig,
    clock: Box<dyn Clock>,
    lifecycle_policy: Box<dyn LifecyclePolicy>,
    profile_catalog: Box<dyn ProfileCatalog>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatcherConfig::default())
    }
}

impl Dispatcher {
    /// Empty store, wall clock, default policies
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            store: Store::new(),
            ledger: IdempotencyLedger::new(),
            config,
            clock: Box::new(SystemClock),
            lifecycle_policy: Box::new(ReprocessOnlyPolicy),
            profile_catalog: Box::new(OpenProfileCatalog),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_lifecycle_policy(mut self, policy: impl LifecyclePolicy + 'static) -> Self {
        self.lifecycle_policy = Box::new(policy);
        self
    }

    pub fn with_profile_catalog(mut self, catalog: impl ProfileCatalog + 'static) -> Self {
        self.profile_catalog = Box::new(catalog);
        self
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Dispatch a parsed request body
    pub fn dispatch(&mut self, body: &Value) -> DispatchResult {
        let request = RequestContext::new();
        let command_id = body
            .get("command_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let command_type = body
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let start = Instant::now();
        log_op_start!(
            OP_DISPATCH,
            request_id = request.request_id.as_str(),
            command_id = command_id.as_str(),
            command_type = command_type.as_str()
        );

        match self.process(body) {
            Ok(outcome) => match DispatchResult::accepted(&outcome) {
                Ok(result) => {
                    log_op_end!(
                        OP_DISPATCH,
                        duration_ms = start.elapsed().as_millis() as u64,
                        request_id = request.request_id.as_str(),
                        command_id = command_id.as_str(),
                        command_type = command_type.as_str(),
                        event_count = outcome.events.len()
                    );
                    result
                }
                Err(e) => {
                    let err = ExError::from(TabularaError::from(e))
                        .with_op("render_response")
                        .with_command_id(command_id.clone());
                    log_op_error!(
                        OP_DISPATCH,
                        err.clone(),
                        duration_ms = start.elapsed().as_millis() as u64,
                        request_id = request.request_id.as_str(),
                        command_id = command_id.as_str()
                    );
                    DispatchResult::failed_after_commit(&err)
                }
            },
            Err(e) => {
                let err = ExError::from(e);
                log_op_error!(
                    OP_DISPATCH,
                    err.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    request_id = request.request_id.as_str(),
                    command_id = command_id.as_str(),
                    command_type = command_type.as_str()
                );
                DispatchResult::rejected(&err)
            }
        }
    }

    /// Dispatch a raw request body
    ///
    /// Text that is not JSON is rejected with `CMD_INVALID_JSON`.
    pub fn dispatch_raw(&mut self, raw: &str) -> DispatchResult {
        match serde_json::from_str::<Value>(raw) {
            Ok(body) => self.dispatch(&body),
            Err(e) => {
                let request = RequestContext::new();
                log_op_start!(OP_DISPATCH, request_id = request.request_id.as_str());
                let err = ExError::from(TabularaError::InvalidJson {
                    message: e.to_string(),
                });
                log_op_error!(
                    OP_DISPATCH,
                    err.clone(),
                    duration_ms = 0u64,
                    request_id = request.request_id.as_str()
                );
                DispatchResult::rejected(&err)
            }
        }
    }

    fn process(&mut self, body: &Value) -> Result<CommandOutcome> {
        let envelope = validation::validate_envelope(body)?;
        let command_type = validation::resolve_command_type(&envelope)?;
        // Replays are reported as conflicts even when their payload is now invalid
        self.ledger.ensure_unused(envelope.command_id.as_str())?;
        let command = validation::validate_payload(
            command_type,
            &envelope.payload,
            self.config.validation_options(),
        )?;

        let ctx = CommandContext::new(envelope.command_id.as_str(), self.clock.now())
            .with_placeholders(
                &self.config.placeholder_project_id,
                &self.config.placeholder_schema_id,
            )
            .with_lifecycle_policy(self.lifecycle_policy.as_ref())
            .with_profile_catalog(self.profile_catalog.as_ref())
            .with_invariant_checks(self.config.check_invariants);

        apply(&mut self.store, &mut self.ledger, &ctx, command)
    }

    // ===== Read-side queries =====

    pub fn session(&self, session_id: &str) -> Option<&Session> {
        self.store.get_session(session_id)
    }

    pub fn document(&self, document_id: &str) -> Option<&Document> {
        self.store.get_document(document_id)
    }

    pub fn documents_in_session(&self, session_id: &str) -> Vec<&Document> {
        self.store.documents_in_session(session_id)
    }

    pub fn duplicates_in_session(&self, session_id: &str) -> Vec<&DuplicateRecord> {
        self.store.duplicates_in_session(session_id)
    }

    pub fn artifacts_for_document(&self, document_id: &str) -> Vec<&DerivedArtifact> {
        self.store.artifacts_for_document(document_id)
    }

    pub fn extraction_output(&self, document_id: &str) -> Option<&ExtractionOutputRecord> {
        self.store.get_extraction_output(document_id)
    }

    pub fn audit_log(&self) -> &[AuditEvent] {
        self.store.audit_log()
    }

    pub fn audit_log_for_session(&self, session_id: &str) -> Vec<&AuditEvent> {
        self.store.audit_log_for_session(session_id)
    }

    pub fn ledger_entry(&self, command_id: &str) -> Option<&LedgerEntry> {
        self.ledger.get(command_id)
    }

    pub fn ledger_len(&self) -> usize {
        self.ledger.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_session(command_id: &str) -> Value {
        json!({
            "command_id": command_id,
            "type": "CreateSession",
            "actor": { "id": "u1", "role": "ops-user" },
            "timestamp": "2026-01-05T10:00:00Z",
            "payload": { "project_id": "p1", "schema_id": "invoice-v1" },
        })
    }

    #[test]
    fn test_accepted_create_session() {
        let mut dispatcher = Dispatcher::default();
        let result = dispatcher.dispatch(&create_session("cmd-1"));
        assert!(result.is_accepted());
        assert_eq!(result.body["session"]["status"], "created");
        assert_eq!(dispatcher.ledger_len(), 1);
    }

    #[test]
    fn test_replay_is_conflict_without_mutation() {
        let mut dispatcher = Dispatcher::default();
        dispatcher.dispatch(&create_session("cmd-1"));
        let replay = dispatcher.dispatch(&create_session("cmd-1"));
        assert_eq!(replay.status_code(), 409);
        assert_eq!(replay.error_code(), Some("IDEMPOTENCY_CONFLICT"));
        assert_eq!(dispatcher.store().session_count(), 1);
        assert_eq!(dispatcher.audit_log().len(), 1);
    }

    #[test]
    fn test_dispatch_raw_rejects_non_json() {
        let mut dispatcher = Dispatcher::default();
        let result = dispatcher.dispatch_raw("{not json");
        assert_eq!(result.status_code(), 400);
        assert_eq!(result.error_code(), Some("CMD_INVALID_JSON"));
    }
}
