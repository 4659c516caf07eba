use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Review status of a session
///
/// Only `Created` is produced by the current command set; the later states
/// belong to the review workflow that sits on top of this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Created,
    Processing,
    Review,
    Validated,
    Exported,
    Locked,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Created => "created",
            SessionStatus::Processing => "processing",
            SessionStatus::Review => "review",
            SessionStatus::Validated => "validated",
            SessionStatus::Exported => "exported",
            SessionStatus::Locked => "locked",
        }
    }
}

/// Session - a unit of intake work grouping imported documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier (UUID v7 when created by CreateSession)
    pub id: String,

    pub project_id: String,

    pub schema_id: String,

    pub status: SessionStatus,

    /// Whether an operator pinned this session in the console
    pub pinned: bool,

    pub created_at: DateTime<Utc>,

    /// Touched by every command that references the session
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new unpinned session in `created` status
    pub fn new(
        id: impl Into<String>,
        project_id: impl Into<String>,
        schema_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            schema_id: schema_id.into(),
            status: SessionStatus::Created,
            pinned: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the touch timestamp, never moving it backwards
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}
