//! Correlation types for dispatch tracking
//!
//! A `CommandId` is supplied by the caller and is the idempotency key of a
//! command. A `RequestId` is minted by the core for every dispatch attempt,
//! so retries of the same command stay distinguishable in the logs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller-supplied identifier of a command envelope
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(String);

impl CommandId {
    /// Wrap an already validated command id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner string
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for CommandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CommandId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Unique identifier for a single dispatch attempt
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new time-ordered RequestId using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string (transport-provided request ids)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Context carried through a dispatch for log correlation
///
/// `command_id` is only known once the envelope has been validated.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub command_id: Option<CommandId>,
}

impl RequestContext {
    /// Create a new context with a fresh RequestId
    pub fn new() -> Self {
        Self {
            request_id: RequestId::new(),
            command_id: None,
        }
    }

    /// Create a context with an existing RequestId
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            command_id: None,
        }
    }

    /// Attach the command id once it is known
    pub fn with_command_id(mut self, command_id: CommandId) -> Self {
        self.command_id = Some(command_id);
        self
    }

    /// Command id as a log-friendly string (empty when unknown)
    pub fn command_id_str(&self) -> &str {
        self.command_id.as_ref().map(CommandId::as_str).unwrap_or("")
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
