//! Dispatch outcomes and response bodies
//!
//! Every dispatch ends in exactly one `DispatchResult`. Bodies always state
//! `mutation_applied` and `event_appended` explicitly.

use serde_json::{Map, Value};
use tabulara_core::errors::{ErrorCategory, ExError};
use tabulara_core::CommandOutcome;

/// Classification of a dispatch, one per status code family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Accepted,
    ValidationError,
    PreconditionConflict,
    IdempotencyConflict,
    PipelineFailure,
    InvariantFailure,
}

impl DispatchOutcome {
    pub fn status_code(&self) -> u16 {
        match self {
            DispatchOutcome::Accepted => 202,
            DispatchOutcome::ValidationError => 400,
            DispatchOutcome::PreconditionConflict
            | DispatchOutcome::IdempotencyConflict
            | DispatchOutcome::PipelineFailure => 409,
            DispatchOutcome::InvariantFailure => 500,
        }
    }

    /// Outcome for a failed dispatch, decided by the error category
    pub fn for_error(err: &ExError) -> Self {
        match err.category() {
            ErrorCategory::Validation => DispatchOutcome::ValidationError,
            ErrorCategory::Precondition => DispatchOutcome::PreconditionConflict,
            ErrorCategory::Idempotency => DispatchOutcome::IdempotencyConflict,
            ErrorCategory::Pipeline => DispatchOutcome::PipelineFailure,
            ErrorCategory::Invariant | ErrorCategory::Configuration => {
                DispatchOutcome::InvariantFailure
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResult {
    pub outcome: DispatchOutcome,
    pub body: Value,
}

impl DispatchResult {
    /// Shape a committed command into an accepted body
    ///
    /// The command-specific view fields are flattened next to the fixed keys.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the view cannot be rendered.
    pub fn accepted(outcome: &CommandOutcome) -> Result<Self, serde_json::Error> {
        let mut body = Map::new();
        body.insert("accepted".to_string(), Value::Bool(true));
        body.insert(
            "command_id".to_string(),
            Value::from(outcome.command_id.clone()),
        );
        body.insert("mutation_applied".to_string(), Value::Bool(true));
        body.insert("event_appended".to_string(), Value::Bool(true));

        if let Value::Object(view) = serde_json::to_value(&outcome.view)? {
            body.extend(view);
        }
        body.insert("events".to_string(), serde_json::to_value(&outcome.events)?);

        Ok(Self {
            outcome: DispatchOutcome::Accepted,
            body: Value::Object(body),
        })
    }

    /// Shape a failure that left the store untouched
    pub fn rejected(err: &ExError) -> Self {
        Self::error_body(err, false)
    }

    /// Shape a failure raised after the commit landed
    pub fn failed_after_commit(err: &ExError) -> Self {
        Self::error_body(err, true)
    }

    fn error_body(err: &ExError, committed: bool) -> Self {
        let mut body = Map::new();
        body.insert("error".to_string(), err.to_error_object());
        body.insert("mutation_applied".to_string(), Value::Bool(committed));
        body.insert("event_appended".to_string(), Value::Bool(committed));
        Self {
            outcome: DispatchOutcome::for_error(err),
            body: Value::Object(body),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.outcome.status_code()
    }

    pub fn is_accepted(&self) -> bool {
        self.outcome == DispatchOutcome::Accepted
    }

    /// `error.code` of a failure body
    pub fn error_code(&self) -> Option<&str> {
        self.body.get("error")?.get("code")?.as_str()
    }

    pub fn mutation_applied(&self) -> bool {
        self.body
            .get("mutation_applied")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabulara_core::errors::{ExErrorKind, TabularaError};

    #[test]
    fn test_status_codes() {
        assert_eq!(DispatchOutcome::Accepted.status_code(), 202);
        assert_eq!(DispatchOutcome::ValidationError.status_code(), 400);
        assert_eq!(DispatchOutcome::IdempotencyConflict.status_code(), 409);
        assert_eq!(DispatchOutcome::PipelineFailure.status_code(), 409);
        assert_eq!(DispatchOutcome::InvariantFailure.status_code(), 500);
    }

    #[test]
    fn test_rolled_back_transaction_is_pipeline_failure() {
        let err: ExError = TabularaError::TransactionRolledBack {
            command_id: "cmd-1".to_string(),
            scope: "run_extraction".to_string(),
            stage: "persistence-before-commit".to_string(),
        }
        .into();
        let result = DispatchResult::rejected(&err);
        assert_eq!(result.outcome, DispatchOutcome::PipelineFailure);
        assert_eq!(result.error_code(), Some("PRECONDITION_FAILED"));
        assert!(!result.mutation_applied());
    }

    #[test]
    fn test_rejected_body_shape() {
        let err = ExError::new(ExErrorKind::PreconditionFailed)
            .with_message("nope")
            .with_detail("session_id", "session_not_found");
        let result = DispatchResult::rejected(&err);
        assert_eq!(result.body["error"]["category"], "precondition");
        assert_eq!(result.body["event_appended"], false);
        assert_eq!(result.body["error"]["details"][0]["reason"], "session_not_found");
    }

    #[test]
    fn test_failed_after_commit_reports_mutation() {
        let err = ExError::new(ExErrorKind::Serialization);
        let result = DispatchResult::failed_after_commit(&err);
        assert!(result.mutation_applied());
        assert_eq!(result.status_code(), 500);
    }
}
