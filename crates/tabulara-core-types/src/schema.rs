//! Canonical schema constants for structured logging
//!
//! These constants keep log field names consistent between the core, the
//! dispatcher and test assertions.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";

// Command identifiers
pub const FIELD_COMMAND_ID: &str = "command_id";
pub const FIELD_COMMAND_TYPE: &str = "command_type";

// Entity identifiers
pub const FIELD_SESSION_ID: &str = "session_id";
pub const FIELD_DOCUMENT_ID: &str = "document_id";

// Outcome fields
pub const FIELD_EVENT_COUNT: &str = "event_count";
pub const FIELD_OUTCOME: &str = "outcome";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
