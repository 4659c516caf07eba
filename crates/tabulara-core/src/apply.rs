//! Transactional apply function
//!
//! This module provides the `apply()` function, the single entry point for
//! state mutations.
//!
//! ## Atomicity Contract
//!
//! The `apply()` function guarantees:
//! - **All-or-nothing**: every write and audit event of a command lands in one
//!   commit, or none of them do
//! - **Ledger on commit**: the idempotency entry is recorded only after the
//!   store commit, so a failed command can be retried with the same id
//! - **No panics**: invalid input returns typed errors
//!
//! ## Example
//!
//! ```
//! use chrono::Utc;
//! use tabulara_core::{apply::{apply, CommandContext}, Command, IdempotencyLedger, Store};
//!
//! let mut store = Store::new();
//! let mut ledger = IdempotencyLedger::new();
//! let ctx = CommandContext::new("cmd-1", Utc::now());
//! let cmd = Command::CreateSession {
//!     project_id: "p1".to_string(),
//!     schema_id: "invoice-v1".to_string(),
//! };
//!
//! let outcome = apply(&mut store, &mut ledger, &ctx, cmd).unwrap();
//! assert_eq!(outcome.events.len(), 1);
//! assert!(ledger.contains("cmd-1"));
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::commands::Command;
use crate::envelope::CommandType;
use crate::errors::Result;
use crate::model::{
    AuditEvent, DerivedArtifact, Document, DuplicateRecord, ExtractionOutputRecord, LedgerEntry,
    Session,
};
use crate::ops::document_ops::{self, DuplicateRequest};
use crate::ops::extraction_ops::{self, ExtractionRequest};
use crate::ops::preprocessing_ops::{self, PreprocessingRequest};
use crate::ops::{session_ops, IdempotencyLedger, Store, Transaction};
use crate::policy::{LifecyclePolicy, OpenProfileCatalog, ProfileCatalog, ReprocessOnlyPolicy};
use crate::rules::invariants;

pub const DEFAULT_PLACEHOLDER_PROJECT_ID: &str = "project-placeholder";
pub const DEFAULT_PLACEHOLDER_SCHEMA_ID: &str = "schema-placeholder";

/// Per-command execution context
///
/// `now` is sampled once per command so every timestamp a command writes is
/// identical.
#[derive(Clone, Copy)]
pub struct CommandContext<'a> {
    pub command_id: &'a str,
    pub now: DateTime<Utc>,
    /// Project id for sessions created implicitly by ImportDocument
    pub placeholder_project_id: &'a str,
    /// Schema id for sessions created implicitly by ImportDocument
    pub placeholder_schema_id: &'a str,
    pub lifecycle_policy: &'a dyn LifecyclePolicy,
    pub profile_catalog: &'a dyn ProfileCatalog,
    /// Run `assert_invariants` on the staged state before commit
    pub check_invariants: bool,
}

impl<'a> CommandContext<'a> {
    /// Context with default placeholders and policies, invariant checks on
    pub fn new(command_id: &'a str, now: DateTime<Utc>) -> Self {
        Self {
            command_id,
            now,
            placeholder_project_id: DEFAULT_PLACEHOLDER_PROJECT_ID,
            placeholder_schema_id: DEFAULT_PLACEHOLDER_SCHEMA_ID,
            lifecycle_policy: &ReprocessOnlyPolicy,
            profile_catalog: &OpenProfileCatalog,
            check_invariants: true,
        }
    }

    pub fn with_placeholders(mut self, project_id: &'a str, schema_id: &'a str) -> Self {
        self.placeholder_project_id = project_id;
        self.placeholder_schema_id = schema_id;
        self
    }

    pub fn with_lifecycle_policy(mut self, policy: &'a dyn LifecyclePolicy) -> Self {
        self.lifecycle_policy = policy;
        self
    }

    pub fn with_profile_catalog(mut self, catalog: &'a dyn ProfileCatalog) -> Self {
        self.profile_catalog = catalog;
        self
    }

    pub fn with_invariant_checks(mut self, enabled: bool) -> Self {
        self.check_invariants = enabled;
        self
    }
}

/// Command-specific view of the committed state, flattened into responses
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutcomeView {
    Session {
        session: Session,
    },
    Documents {
        session: Session,
        documents: Vec<Document>,
    },
    Duplicate {
        duplicate: DuplicateRecord,
        already_marked: bool,
    },
    Preprocessing {
        document: Document,
        derived_artifacts: Vec<DerivedArtifact>,
    },
    Reprocessing {
        document: Document,
        /// Full session history including the new event
        audit_log: Vec<AuditEvent>,
    },
    Extraction {
        document: Document,
        extraction_outputs: ExtractionOutputRecord,
    },
}

/// What a handler hands back to `apply()`
#[derive(Debug, Clone)]
pub struct HandlerOutput {
    pub session_id: String,
    pub document_ids: Vec<String>,
    pub view: OutcomeView,
}

/// Result of a committed command
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub command_id: String,
    pub command_type: CommandType,
    pub session_id: String,
    pub document_ids: Vec<String>,
    /// Events appended by this command, in order
    pub events: Vec<AuditEvent>,
    pub view: OutcomeView,
}

fn run_handler(
    tx: &mut Transaction,
    ledger: &IdempotencyLedger,
    ctx: &CommandContext<'_>,
    cmd: Command,
) -> Result<HandlerOutput> {
    match cmd {
        Command::CreateSession {
            project_id,
            schema_id,
        } => session_ops::create_session(tx, ctx, project_id, schema_id),

        Command::PinSession { session_id, pinned } => {
            session_ops::pin_session(tx, ctx, session_id, pinned)
        }

        Command::ImportDocument {
            session_id,
            blob_ids,
            metadata,
        } => document_ops::import_document(tx, ctx, session_id, blob_ids, metadata),

        Command::ConfirmDuplicate {
            session_id,
            document_id,
            duplicate_of_document_id,
            source_import_command_id,
            detector,
        } => document_ops::confirm_duplicate(
            tx,
            ctx,
            ledger,
            DuplicateRequest {
                session_id,
                document_id,
                duplicate_of_document_id,
                source_import_command_id,
                detector,
            },
        ),

        Command::ApplyPreprocessing {
            session_id,
            document_id,
            page_ids,
            preprocessing_profile,
            force_fail_stage,
        } => preprocessing_ops::apply_preprocessing(
            tx,
            ctx,
            PreprocessingRequest {
                session_id,
                document_id,
                page_ids,
                preprocessing_profile,
                force_fail_stage,
            },
        ),

        Command::ReprocessDocument {
            session_id,
            document_id,
            target_state,
            reason,
        } => preprocessing_ops::reprocess_document(
            tx,
            ctx,
            session_id,
            document_id,
            target_state,
            reason,
        ),

        Command::RunExtraction {
            session_id,
            document_id,
            extraction_profile,
            source_state,
            force_fail_stage,
        } => extraction_ops::run_extraction(
            tx,
            ctx,
            ExtractionRequest {
                session_id,
                document_id,
                extraction_profile,
                source_state,
                force_fail_stage,
            },
        ),
    }
}

/// Apply a command to the store and record it in the ledger
///
/// # Atomicity Guarantee
///
/// If this function returns `Err`, neither the store nor the ledger has
/// changed. If it returns `Ok`, the store holds every write of the command and
/// the ledger holds its entry.
///
/// # Errors
///
/// - `DuplicateCommandId` if the command id is already in the ledger
/// - `PreconditionFailed`, `ExtractionRuntime` or `TransactionRolledBack`
///   from the handler
/// - `InvariantViolation` if the staged state breaks a store invariant
pub fn apply(
    store: &mut Store,
    ledger: &mut IdempotencyLedger,
    ctx: &CommandContext<'_>,
    cmd: Command,
) -> Result<CommandOutcome> {
    ledger.ensure_unused(ctx.command_id)?;
    let command_type = cmd.command_type();

    let mut tx = Transaction::begin(store);
    let output = match run_handler(&mut tx, ledger, ctx, cmd) {
        Ok(output) => output,
        Err(err) => {
            tx.abort();
            return Err(err);
        }
    };

    if ctx.check_invariants {
        let known = |id: &str| id == ctx.command_id || ledger.contains(id);
        if let Err(err) = invariants::assert_invariants(tx.store(), known) {
            tx.abort();
            return Err(err);
        }
    }

    let events = tx.commit(store);
    ledger.record(LedgerEntry {
        command_id: ctx.command_id.to_string(),
        command_type,
        session_id: output.session_id.clone(),
        document_ids: output.document_ids.clone(),
        event_ids: events.iter().map(|e| e.event_id.clone()).collect(),
        committed_at: ctx.now,
    })?;

    Ok(CommandOutcome {
        command_id: ctx.command_id.to_string(),
        command_type,
        session_id: output.session_id,
        document_ids: output.document_ids,
        events,
        view: output.view,
    })
}
