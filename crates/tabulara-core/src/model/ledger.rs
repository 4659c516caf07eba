use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::envelope::CommandType;

/// LedgerEntry - summary of a committed command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub command_id: String,
    #[serde(rename = "type")]
    pub command_type: CommandType,
    pub session_id: String,
    /// Documents created or targeted by the command
    pub document_ids: Vec<String>,
    pub event_ids: Vec<String>,
    pub committed_at: DateTime<Utc>,
}
