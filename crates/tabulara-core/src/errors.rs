use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::envelope::ALLOWED_COMMAND_TYPES;

/// Result type alias using TabularaError
pub type Result<T> = std::result::Result<T, TabularaError>;

// ========== Error Facility ==========

/// Coarse failure class reported to callers next to the stable code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Precondition,
    Idempotency,
    Pipeline,
    Invariant,
    /// Startup-time failures (config files); never produced by dispatch
    Configuration,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::Precondition => "precondition",
            ErrorCategory::Idempotency => "idempotency",
            ErrorCategory::Pipeline => "pipeline",
            ErrorCategory::Invariant => "invariant",
            ErrorCategory::Configuration => "configuration",
        }
    }
}

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code and a category. Several kinds may
/// share a code (a rolled-back transaction is reported as `PRECONDITION_FAILED`
/// so that callers treat it as a retryable conflict) but never a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExErrorKind {
    // Validation
    InvalidJson,
    EnvelopeValidation,
    UnsupportedCommandType,
    PayloadValidation,

    // Precondition
    PreconditionFailed,

    // Idempotency
    IdempotencyConflict,

    // Pipeline
    ExtractionFailed,
    TransactionRolledBack,

    // Invariant
    InvariantViolation,
    Serialization,
    Internal,

    // Configuration
    InvalidConfig,
    Io,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidJson => "CMD_INVALID_JSON",
            ExErrorKind::EnvelopeValidation => "CMD_ENVELOPE_VALIDATION_FAILED",
            ExErrorKind::UnsupportedCommandType => "CMD_TYPE_UNSUPPORTED",
            ExErrorKind::PayloadValidation => "CMD_PAYLOAD_VALIDATION_FAILED",
            ExErrorKind::PreconditionFailed => "PRECONDITION_FAILED",
            ExErrorKind::IdempotencyConflict => "IDEMPOTENCY_CONFLICT",
            ExErrorKind::ExtractionFailed => "EXTRACTION_FAILED",
            ExErrorKind::TransactionRolledBack => "PRECONDITION_FAILED",
            ExErrorKind::InvariantViolation => "INVARIANT_VIOLATION",
            ExErrorKind::Serialization => "SERIALIZATION_FAILED",
            ExErrorKind::Internal => "INTERNAL_ERROR",
            ExErrorKind::InvalidConfig => "CONFIG_INVALID",
            ExErrorKind::Io => "IO_ERROR",
        }
    }

    /// Get the category this kind is reported under
    pub fn category(&self) -> ErrorCategory {
        match self {
            ExErrorKind::InvalidJson
            | ExErrorKind::EnvelopeValidation
            | ExErrorKind::UnsupportedCommandType
            | ExErrorKind::PayloadValidation => ErrorCategory::Validation,
            ExErrorKind::PreconditionFailed => ErrorCategory::Precondition,
            ExErrorKind::IdempotencyConflict => ErrorCategory::Idempotency,
            ExErrorKind::ExtractionFailed | ExErrorKind::TransactionRolledBack => {
                ErrorCategory::Pipeline
            }
            ExErrorKind::InvariantViolation
            | ExErrorKind::Serialization
            | ExErrorKind::Internal => ErrorCategory::Invariant,
            ExErrorKind::InvalidConfig | ExErrorKind::Io => ErrorCategory::Configuration,
        }
    }
}

/// A single `{field, reason}` pair reported to callers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub reason: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a missing required field
    pub fn required(field: impl Into<String>) -> Self {
        Self::new(field, "required")
    }

    fn to_json(&self) -> Value {
        json!({ "field": self.field, "reason": self.reason })
    }
}

impl std::fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

fn format_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(FieldIssue::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn issues_json(issues: &[FieldIssue]) -> Value {
    Value::Array(issues.iter().map(FieldIssue::to_json).collect())
}

/// Canonical structured error type
///
/// This is the shape every failure takes before it leaves the core. The
/// `extra` map carries code-specific fields (`allowed_types`,
/// `payload_stability`, ...) that are merged into the error object.
#[derive(Debug, Clone, PartialEq)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    command_id: Option<String>,
    entity_id: Option<String>,
    message: String,
    details: Vec<FieldIssue>,
    extra: Map<String, Value>,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            command_id: None,
            entity_id: None,
            message: String::new(),
            details: Vec::new(),
            extra: Map::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add command id context
    pub fn with_command_id(mut self, id: impl Into<String>) -> Self {
        self.command_id = Some(id.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Append one `{field, reason}` detail
    pub fn with_detail(mut self, field: impl Into<String>, reason: impl Into<String>) -> Self {
        self.details.push(FieldIssue::new(field, reason));
        self
    }

    /// Append several details
    pub fn with_details(mut self, issues: impl IntoIterator<Item = FieldIssue>) -> Self {
        self.details.extend(issues);
        self
    }

    /// Attach a code-specific field to the error object
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the command id context, if any
    pub fn command_id(&self) -> Option<&str> {
        self.command_id.as_deref()
    }

    /// Get the entity ID context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the `{field, reason}` details
    pub fn details(&self) -> &[FieldIssue] {
        &self.details
    }

    /// Get a code-specific extra field
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }

    /// Whether any detail carries the given reason
    pub fn has_reason(&self, reason: &str) -> bool {
        self.details.iter().any(|d| d.reason == reason)
    }

    /// Render the caller-facing error object
    ///
    /// Contains only values derived from the failing input: no timestamps and
    /// no generated ids, so identical inputs render identical objects.
    pub fn to_error_object(&self) -> Value {
        let mut object = Map::new();
        object.insert("code".to_string(), Value::from(self.code()));
        object.insert(
            "category".to_string(),
            Value::from(self.category().as_str()),
        );
        object.insert("message".to_string(), Value::from(self.message.clone()));
        object.insert("details".to_string(), issues_json(&self.details));
        for (key, value) in &self.extra {
            object.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Value::Object(object)
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.category().as_str())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(command_id) = &self.command_id {
            write!(f, " (command_id: {})", command_id)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if !self.details.is_empty() {
            write!(f, " [{}]", format_issues(&self.details))?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Typed failures raised while validating and applying commands
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TabularaError {
    // ===== Validation Errors =====
    /// Raw body could not be parsed as JSON
    #[error("Invalid JSON payload: {message}")]
    InvalidJson { message: String },

    /// Envelope is missing fields or carries malformed ones
    #[error("Command envelope failed validation: missing={missing_fields:?}, invalid=[{}]", format_issues(.invalid_fields))]
    EnvelopeInvalid {
        missing_fields: Vec<String>,
        invalid_fields: Vec<FieldIssue>,
    },

    /// Envelope `type` is not one of the supported command types
    #[error("Unsupported command type: {command_type}")]
    UnsupportedCommandType { command_type: String },

    /// Type-specific payload checks failed
    #[error("Invalid {command_type} payload: [{}]", format_issues(.issues))]
    PayloadInvalid {
        command_type: String,
        issues: Vec<FieldIssue>,
    },

    // ===== Idempotency Errors =====
    /// The command id has already been committed
    #[error("Command already processed: {command_id}")]
    DuplicateCommandId { command_id: String },

    // ===== Precondition Errors =====
    /// Referenced entities, lineage or lifecycle do not permit the command
    #[error("Precondition failed for {command_type}: [{}]", format_issues(.issues))]
    PreconditionFailed {
        command_type: String,
        issues: Vec<FieldIssue>,
    },

    // ===== Pipeline Errors =====
    /// The extraction stage failed before any mutation
    #[error("Extraction runtime failed for document {document_id} (profile {extraction_profile})")]
    ExtractionRuntime {
        session_id: String,
        document_id: String,
        extraction_profile: String,
    },

    /// A staged transaction was aborted before commit
    #[error("Transaction for {command_id} rolled back at stage {stage}")]
    TransactionRolledBack {
        command_id: String,
        /// Detail field naming the aborted operation (e.g. `run_extraction`)
        scope: String,
        stage: String,
    },

    // ===== Invariant Errors =====
    /// Staged state breaks a store invariant
    #[error("Store invariant violated: {message}")]
    InvariantViolation { message: String },

    /// Serialization error (JSON encoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl TabularaError {
    /// Precondition failure with a single issue
    pub fn precondition(
        command_type: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        TabularaError::PreconditionFailed {
            command_type: command_type.into(),
            issues: vec![FieldIssue::new(field, reason)],
        }
    }
}

/// Conversion from TabularaError to the canonical ExError
impl From<TabularaError> for ExError {
    fn from(err: TabularaError) -> Self {
        match err {
            TabularaError::InvalidJson { message } => ExError::new(ExErrorKind::InvalidJson)
                .with_op("parse_body")
                .with_message(message)
                .with_detail("body", "invalid_json"),

            TabularaError::EnvelopeInvalid {
                missing_fields,
                invalid_fields,
            } => {
                let missing: Vec<FieldIssue> =
                    missing_fields.iter().map(FieldIssue::required).collect();
                ExError::new(ExErrorKind::EnvelopeValidation)
                    .with_op("validate_envelope")
                    .with_message("Command envelope failed validation")
                    .with_details(missing)
                    .with_details(invalid_fields.iter().cloned())
                    .with_extra(
                        "missing_fields",
                        Value::Array(missing_fields.into_iter().map(Value::from).collect()),
                    )
                    .with_extra("invalid_fields", issues_json(&invalid_fields))
            }

            TabularaError::UnsupportedCommandType { command_type } => {
                ExError::new(ExErrorKind::UnsupportedCommandType)
                    .with_op("resolve_command_type")
                    .with_message(format!("Unsupported command type: {}", command_type))
                    .with_detail("type", "unsupported_command_type")
                    .with_extra("received_type", command_type)
                    .with_extra(
                        "allowed_types",
                        Value::Array(
                            ALLOWED_COMMAND_TYPES
                                .iter()
                                .map(|t| Value::from(*t))
                                .collect(),
                        ),
                    )
            }

            TabularaError::PayloadInvalid {
                command_type,
                issues,
            } => {
                let (missing, invalid): (Vec<FieldIssue>, Vec<FieldIssue>) =
                    issues.iter().cloned().partition(|i| i.reason == "required");
                ExError::new(ExErrorKind::PayloadValidation)
                    .with_op("validate_payload")
                    .with_message(format!("{} payload failed validation", command_type))
                    .with_details(issues)
                    .with_extra("command_type", command_type)
                    .with_extra(
                        "missing_fields",
                        Value::Array(missing.into_iter().map(|i| Value::from(i.field)).collect()),
                    )
                    .with_extra("invalid_fields", issues_json(&invalid))
            }

            TabularaError::DuplicateCommandId { command_id } => {
                ExError::new(ExErrorKind::IdempotencyConflict)
                    .with_op("check_idempotency")
                    .with_command_id(command_id.clone())
                    .with_message("Command id has already been processed")
                    .with_detail("command_id", "duplicate_command_id")
                    .with_extra("command_id", command_id)
            }

            TabularaError::PreconditionFailed {
                command_type,
                issues,
            } => ExError::new(ExErrorKind::PreconditionFailed)
                .with_op("check_preconditions")
                .with_message(format!("{} preconditions not met", command_type))
                .with_details(issues)
                .with_extra("command_type", command_type),

            TabularaError::ExtractionRuntime {
                session_id,
                document_id,
                extraction_profile,
            } => ExError::new(ExErrorKind::ExtractionFailed)
                .with_op("run_extraction")
                .with_entity_id(document_id.clone())
                .with_message("Extraction pipeline failed at extractor runtime")
                .with_detail("pipeline", "extractor_runtime_error")
                .with_extra("payload_stability", "deterministic")
                .with_extra("stage", "extractor-runtime")
                .with_extra("session_id", session_id)
                .with_extra("document_id", document_id)
                .with_extra("extraction_profile", extraction_profile),

            TabularaError::TransactionRolledBack {
                command_id,
                scope,
                stage,
            } => ExError::new(ExErrorKind::TransactionRolledBack)
                .with_op("commit")
                .with_command_id(command_id)
                .with_message("Transaction rolled back before commit")
                .with_detail(scope, "transaction_rolled_back")
                .with_extra("stage", stage),

            TabularaError::InvariantViolation { message } => {
                ExError::new(ExErrorKind::InvariantViolation)
                    .with_op("assert_invariants")
                    .with_message(message)
                    .with_detail("store", "invariant_violation")
            }

            TabularaError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            TabularaError::Internal { message } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to TabularaError
impl From<serde_json::Error> for TabularaError {
    fn from(err: serde_json::Error) -> Self {
        TabularaError::Serialization {
            message: err.to_string(),
        }
    }
}
