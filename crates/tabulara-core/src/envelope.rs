//! Command envelope types
//!
//! The envelope is the caller-supplied wrapper around every command: who sent
//! it, when, under which idempotency key, and the type-specific payload.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use tabulara_core_types::CommandId;

/// Envelope fields in canonical order
pub const REQUIRED_ENVELOPE_FIELDS: [&str; 5] =
    ["command_id", "type", "actor", "timestamp", "payload"];

/// Supported command type names in canonical order
pub const ALLOWED_COMMAND_TYPES: [&str; 7] = [
    "CreateSession",
    "PinSession",
    "ImportDocument",
    "ConfirmDuplicate",
    "ApplyPreprocessing",
    "ReprocessDocument",
    "RunExtraction",
];

/// The closed set of command types the core can apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandType {
    CreateSession,
    PinSession,
    ImportDocument,
    ConfirmDuplicate,
    ApplyPreprocessing,
    ReprocessDocument,
    RunExtraction,
}

impl CommandType {
    pub const ALL: [CommandType; 7] = [
        CommandType::CreateSession,
        CommandType::PinSession,
        CommandType::ImportDocument,
        CommandType::ConfirmDuplicate,
        CommandType::ApplyPreprocessing,
        CommandType::ReprocessDocument,
        CommandType::RunExtraction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::CreateSession => "CreateSession",
            CommandType::PinSession => "PinSession",
            CommandType::ImportDocument => "ImportDocument",
            CommandType::ConfirmDuplicate => "ConfirmDuplicate",
            CommandType::ApplyPreprocessing => "ApplyPreprocessing",
            CommandType::ReprocessDocument => "ReprocessDocument",
            CommandType::RunExtraction => "RunExtraction",
        }
    }

    /// Resolve a type name, `None` when unsupported
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }

    /// Snake-case operation name used in logs and rollback details
    pub fn op_name(&self) -> &'static str {
        match self {
            CommandType::CreateSession => "create_session",
            CommandType::PinSession => "pin_session",
            CommandType::ImportDocument => "import_document",
            CommandType::ConfirmDuplicate => "confirm_duplicate",
            CommandType::ApplyPreprocessing => "apply_preprocessing",
            CommandType::ReprocessDocument => "reprocess_document",
            CommandType::RunExtraction => "run_extraction",
        }
    }
}

impl std::fmt::Display for CommandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role tag carried by the actor; no authorization is derived from it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActorRole {
    OpsUser,
    Service,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::OpsUser => "ops-user",
            ActorRole::Service => "service",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ops-user" => Some(ActorRole::OpsUser),
            "service" => Some(ActorRole::Service),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: ActorRole,
}

/// A validated command envelope
///
/// The payload is still untyped here; payload validation turns it into a
/// [`crate::commands::Command`]. The timestamp is checked for shape only and
/// never used as a mutation time.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandEnvelope {
    pub command_id: CommandId,
    /// Raw type string, resolved after envelope validation
    pub command_type: String,
    pub actor: Actor,
    pub timestamp: DateTime<FixedOffset>,
    pub payload: Map<String, Value>,
}

impl CommandEnvelope {
    /// Resolve the type string against the supported set
    pub fn resolved_type(&self) -> Option<CommandType> {
        CommandType::parse(&self.command_type)
    }
}
