use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const EVENT_SESSION_CREATED: &str = "SessionCreated";
pub const EVENT_SESSION_PINNED: &str = "SessionPinned";
pub const EVENT_SESSION_UNPINNED: &str = "SessionUnpinned";
pub const EVENT_DOCUMENT_IMPORTED: &str = "DocumentImported";
pub const EVENT_DUPLICATE_MARKED: &str = "DuplicateMarked";
pub const EVENT_PREPROCESSING_APPLIED: &str = "PreprocessingApplied";
pub const EVENT_DOCUMENT_REPROCESSED: &str = "DocumentReprocessed";
pub const EVENT_EXTRACTION_COMPLETED: &str = "ExtractionCompleted";
pub const EVENT_DERIVED_DATA_UPDATED: &str = "DerivedDataUpdated";

/// AuditEvent - append-only record of a committed domain change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// UUID v7
    pub event_id: String,

    /// command_id of the command that produced this event
    pub caused_by: String,

    #[serde(rename = "type")]
    pub event_type: String,

    pub timestamp: DateTime<Utc>,

    /// Event payload, always carries `session_id`
    pub data: Value,
}

impl AuditEvent {
    /// Session the event belongs to, if recorded
    pub fn session_id(&self) -> Option<&str> {
        self.data.get("session_id").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_serializes_as_type() {
        let event = AuditEvent {
            event_id: "e1".to_string(),
            caused_by: "cmd-1".to_string(),
            event_type: EVENT_SESSION_CREATED.to_string(),
            timestamp: Utc::now(),
            data: serde_json::json!({ "session_id": "s1" }),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "SessionCreated");
        assert_eq!(event.session_id(), Some("s1"));
    }
}
