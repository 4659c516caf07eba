//! Envelope and payload validation
//!
//! Validation is read-only: it never touches the store. Envelope checks run
//! first, then the type-support check, then the validator owned by the
//! resolved command type. Each stage reports every problem it finds at once.

use chrono::DateTime;
use serde_json::{Map, Value};

use tabulara_core_types::CommandId;

use crate::commands::{Command, FailureStage};
use crate::envelope::{
    Actor, ActorRole, CommandEnvelope, CommandType, REQUIRED_ENVELOPE_FIELDS,
};
use crate::errors::{FieldIssue, Result, TabularaError};
use crate::model::{DocumentMetadata, DuplicateDetector};

/// Switches that change what payload validation accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Whether `force_fail_stage` may be supplied at all
    pub failure_injection: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            failure_injection: true,
        }
    }
}

fn is_absent(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.trim().is_empty())
}

fn parse_actor(value: &Value) -> Option<Actor> {
    let object = value.as_object()?;
    let id = object.get("id").and_then(non_empty_str)?;
    let role = object
        .get("role")
        .and_then(Value::as_str)
        .and_then(ActorRole::parse)?;
    Some(Actor {
        id: id.to_string(),
        role,
    })
}

/// Validate the envelope shape of a parsed body
///
/// A body that is not a JSON object reports all envelope fields as missing.
///
/// # Errors
///
/// Returns `EnvelopeInvalid` listing missing fields and malformed fields.
pub fn validate_envelope(body: &Value) -> Result<CommandEnvelope> {
    let Some(object) = body.as_object() else {
        return Err(TabularaError::EnvelopeInvalid {
            missing_fields: REQUIRED_ENVELOPE_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
            invalid_fields: Vec::new(),
        });
    };

    let mut missing_fields = Vec::new();
    let mut invalid_fields = Vec::new();

    for field in REQUIRED_ENVELOPE_FIELDS {
        if is_absent(object.get(field)) {
            missing_fields.push(field.to_string());
        }
    }

    let command_id = object.get("command_id").filter(|v| !v.is_null());
    if let Some(value) = command_id {
        if non_empty_str(value).is_none() {
            invalid_fields.push(FieldIssue::new("command_id", "must_be_non_empty_string"));
        }
    }

    let command_type = object.get("type").filter(|v| !v.is_null());
    if let Some(value) = command_type {
        if non_empty_str(value).is_none() {
            invalid_fields.push(FieldIssue::new("type", "must_be_non_empty_string"));
        }
    }

    let actor = object
        .get("actor")
        .filter(|v| !v.is_null())
        .map(parse_actor);
    if let Some(None) = actor {
        invalid_fields.push(FieldIssue::new("actor", "invalid_actor"));
    }

    let timestamp = object.get("timestamp").filter(|v| !v.is_null()).map(|v| {
        v.as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    });
    if let Some(None) = timestamp {
        invalid_fields.push(FieldIssue::new("timestamp", "invalid_timestamp"));
    }

    let payload = object.get("payload").filter(|v| !v.is_null());
    if let Some(value) = payload {
        if !value.is_object() {
            invalid_fields.push(FieldIssue::new("payload", "must_be_object"));
        }
    }

    if !missing_fields.is_empty() || !invalid_fields.is_empty() {
        return Err(TabularaError::EnvelopeInvalid {
            missing_fields,
            invalid_fields,
        });
    }

    // Every field is present and well-formed past this point
    match (
        command_id.and_then(Value::as_str),
        command_type.and_then(Value::as_str),
        actor.flatten(),
        timestamp.flatten(),
        payload.and_then(Value::as_object),
    ) {
        (Some(command_id), Some(command_type), Some(actor), Some(timestamp), Some(payload)) => {
            Ok(CommandEnvelope {
                command_id: CommandId::new(command_id),
                command_type: command_type.to_string(),
                actor,
                timestamp,
                payload: payload.clone(),
            })
        }
        _ => Err(TabularaError::Internal {
            message: "envelope accepted without all fields".to_string(),
        }),
    }
}

/// Resolve the envelope type against the supported set
///
/// # Errors
///
/// Returns `UnsupportedCommandType` for unknown type names.
pub fn resolve_command_type(envelope: &CommandEnvelope) -> Result<CommandType> {
    envelope
        .resolved_type()
        .ok_or_else(|| TabularaError::UnsupportedCommandType {
            command_type: envelope.command_type.clone(),
        })
}

/// Collects field issues while reading a payload object
struct PayloadReader {
    options: ValidationOptions,
    issues: Vec<FieldIssue>,
}

impl PayloadReader {
    fn new(options: ValidationOptions) -> Self {
        Self {
            options,
            issues: Vec::new(),
        }
    }

    fn issue(&mut self, path: &str, reason: &str) {
        self.issues.push(FieldIssue::new(path, reason));
    }

    fn string(&mut self, map: &Map<String, Value>, key: &str, path: &str) -> String {
        let value = map.get(key);
        if is_absent(value) {
            self.issue(path, "required");
            return String::new();
        }
        match value.and_then(non_empty_str) {
            Some(s) => s.to_string(),
            None => {
                self.issue(path, "must_be_non_empty_string");
                String::new()
            }
        }
    }

    fn optional_string(&mut self, map: &Map<String, Value>, key: &str, path: &str) -> Option<String> {
        let value = map.get(key);
        if is_absent(value) {
            return None;
        }
        match value.and_then(non_empty_str) {
            Some(s) => Some(s.to_string()),
            None => {
                self.issue(path, "must_be_non_empty_string");
                None
            }
        }
    }

    fn boolean(&mut self, map: &Map<String, Value>, key: &str) -> bool {
        let value = map.get(key);
        if is_absent(value) {
            self.issue(key, "required");
            return false;
        }
        match value.and_then(Value::as_bool) {
            Some(b) => b,
            None => {
                self.issue(key, "must_be_boolean");
                false
            }
        }
    }

    fn string_array(&mut self, map: &Map<String, Value>, key: &str) -> Vec<String> {
        let value = map.get(key);
        if is_absent(value) {
            self.issue(key, "required");
            return Vec::new();
        }
        let items = match value.and_then(Value::as_array) {
            Some(items) if !items.is_empty() => items,
            _ => {
                self.issue(key, "must_be_non_empty_array");
                return Vec::new();
            }
        };
        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match non_empty_str(item) {
                Some(s) => out.push(s.to_string()),
                None => self.issue(&format!("{}[{}]", key, index), "must_be_non_empty_string"),
            }
        }
        out
    }

    fn object<'m>(&mut self, map: &'m Map<String, Value>, key: &str) -> Option<&'m Map<String, Value>> {
        let value = map.get(key);
        if is_absent(value) {
            self.issue(key, "required");
            return None;
        }
        let object = value.and_then(Value::as_object);
        if object.is_none() {
            self.issue(key, "must_be_object");
        }
        object
    }

    fn failure_stage(
        &mut self,
        map: &Map<String, Value>,
        command_type: CommandType,
    ) -> Option<FailureStage> {
        let raw = self.optional_string(map, "force_fail_stage", "force_fail_stage")?;
        if !self.options.failure_injection {
            self.issue("force_fail_stage", "failure_injection_disabled");
            return None;
        }
        match FailureStage::parse(&raw) {
            Some(stage) if FailureStage::accepted_by(command_type).contains(&stage) => Some(stage),
            _ => {
                self.issue("force_fail_stage", "must_be_one_of");
                None
            }
        }
    }

    fn finish(self, command_type: CommandType, command: Command) -> Result<Command> {
        if self.issues.is_empty() {
            Ok(command)
        } else {
            Err(TabularaError::PayloadInvalid {
                command_type: command_type.as_str().to_string(),
                issues: self.issues,
            })
        }
    }
}

/// Validate a payload for the given command type
///
/// # Errors
///
/// Returns `PayloadInvalid` carrying every violated field.
pub fn validate_payload(
    command_type: CommandType,
    payload: &Map<String, Value>,
    options: ValidationOptions,
) -> Result<Command> {
    let mut r = PayloadReader::new(options);

    let command = match command_type {
        CommandType::CreateSession => Command::CreateSession {
            project_id: r.string(payload, "project_id", "project_id"),
            schema_id: r.string(payload, "schema_id", "schema_id"),
        },

        CommandType::PinSession => Command::PinSession {
            session_id: r.string(payload, "session_id", "session_id"),
            pinned: r.boolean(payload, "pinned"),
        },

        CommandType::ImportDocument => {
            let session_id = r.string(payload, "session_id", "session_id");
            let blob_ids = r.string_array(payload, "blob_ids");
            let metadata = match r.object(payload, "metadata") {
                Some(m) => DocumentMetadata {
                    source: r.string(m, "source", "metadata.source"),
                    file_name: r.string(m, "file_name", "metadata.file_name"),
                    mime_type: r.string(m, "mime_type", "metadata.mime_type"),
                    file_hash: r.optional_string(m, "file_hash", "metadata.file_hash"),
                },
                None => DocumentMetadata {
                    source: String::new(),
                    file_name: String::new(),
                    mime_type: String::new(),
                    file_hash: None,
                },
            };
            Command::ImportDocument {
                session_id,
                blob_ids,
                metadata,
            }
        }

        CommandType::ConfirmDuplicate => {
            let session_id = r.string(payload, "session_id", "session_id");
            let document_id = r.string(payload, "document_id", "document_id");
            let duplicate_of_document_id =
                r.string(payload, "duplicate_of_document_id", "duplicate_of_document_id");
            if !document_id.is_empty() && document_id == duplicate_of_document_id {
                r.issue("duplicate_of_document_id", "must_differ_from_document_id");
            }
            let (source_import_command_id, detector) = match r.object(payload, "correlation") {
                Some(c) => {
                    let source = r.string(
                        c,
                        "source_import_command_id",
                        "correlation.source_import_command_id",
                    );
                    let detector = match r.optional_string(c, "detector", "correlation.detector")
                    {
                        Some(raw) => DuplicateDetector::parse(&raw).unwrap_or_else(|| {
                            r.issue("correlation.detector", "must_be_one_of");
                            DuplicateDetector::default()
                        }),
                        None => DuplicateDetector::default(),
                    };
                    (source, detector)
                }
                None => (String::new(), DuplicateDetector::default()),
            };
            Command::ConfirmDuplicate {
                session_id,
                document_id,
                duplicate_of_document_id,
                source_import_command_id,
                detector,
            }
        }

        CommandType::ApplyPreprocessing => Command::ApplyPreprocessing {
            session_id: r.string(payload, "session_id", "session_id"),
            document_id: r.string(payload, "document_id", "document_id"),
            page_ids: r.string_array(payload, "page_ids"),
            preprocessing_profile: r.string(payload, "preprocessing_profile", "preprocessing_profile"),
            force_fail_stage: r.failure_stage(payload, command_type),
        },

        CommandType::ReprocessDocument => Command::ReprocessDocument {
            session_id: r.string(payload, "session_id", "session_id"),
            document_id: r.string(payload, "document_id", "document_id"),
            target_state: r.string(payload, "target_state", "target_state"),
            reason: r.string(payload, "reason", "reason"),
        },

        CommandType::RunExtraction => Command::RunExtraction {
            session_id: r.string(payload, "session_id", "session_id"),
            document_id: r.string(payload, "document_id", "document_id"),
            extraction_profile: r.string(payload, "extraction_profile", "extraction_profile"),
            source_state: r.string(payload, "source_state", "source_state"),
            force_fail_stage: r.failure_stage(payload, command_type),
        },
    };

    r.finish(command_type, command)
}

/// Run every validation stage without consulting any state
///
/// # Errors
///
/// Returns the first failing stage's error.
pub fn validate_command(
    body: &Value,
    options: ValidationOptions,
) -> Result<(CommandEnvelope, Command)> {
    let envelope = validate_envelope(body)?;
    let command_type = resolve_command_type(&envelope)?;
    let command = validate_payload(command_type, &envelope.payload, options)?;
    Ok((envelope, command))
}
