//! Tabulara Core - command processing kernel for the document intake console
//!
//! This crate provides the domain model and the transactional command engine:
//! - Envelope and per-type payload validation
//! - Idempotency ledger keyed by command id
//! - In-memory store mutated only through staged transactions
//! - Document lifecycle rules and duplicate correlation
//! - Deterministic extraction simulator with failure injection hooks
//! - Error and logging facilities shared with the dispatcher

pub mod apply;
pub mod clock;
pub mod commands;
pub mod envelope;
pub mod errors;
pub mod extraction;
pub mod logging_facility;
pub mod model;
pub mod ops;
pub mod policy;
pub mod rules;

#[doc(hidden)]
pub use tabulara_core_types as core_types;

// Re-export commonly used types
pub use apply::{apply, CommandContext, CommandOutcome, OutcomeView};
pub use clock::{Clock, FixedClock, SystemClock};
pub use commands::{Command, FailureStage};
pub use envelope::{CommandEnvelope, CommandType};
pub use errors::{ErrorCategory, ExError, ExErrorKind, FieldIssue, Result, TabularaError};
pub use ops::{IdempotencyLedger, Store};
pub use policy::{LifecyclePolicy, ProfileCatalog};
