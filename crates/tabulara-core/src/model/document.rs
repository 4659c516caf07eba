use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Position of a document in the intake progression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Imported,
    Preprocessed,
    Reprocessed,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Imported => "imported",
            LifecycleState::Preprocessed => "preprocessed",
            LifecycleState::Reprocessed => "reprocessed",
        }
    }

    /// Parse a lifecycle state literal
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "imported" => Some(LifecycleState::Imported),
            "preprocessed" => Some(LifecycleState::Preprocessed),
            "reprocessed" => Some(LifecycleState::Reprocessed),
            _ => None,
        }
    }

    /// Whether extraction may run against a document in this state
    pub fn is_preprocess_ready(&self) -> bool {
        matches!(
            self,
            LifecycleState::Preprocessed | LifecycleState::Reprocessed
        )
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied description of an imported file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub source: String,
    pub file_name: String,
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_hash: Option<String>,
}

/// Document - one imported blob inside a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// `{session_id}:{blob_id}`, possibly with a `:reimport-{n}` suffix
    pub document_id: String,

    pub session_id: String,

    pub blob_id: String,

    pub lifecycle_state: LifecycleState,

    pub metadata: DocumentMetadata,

    pub imported_at: DateTime<Utc>,

    /// ImportDocument command that created this document
    pub import_command_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preprocessing_profile: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preprocessed_page_ids: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reprocessed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_extraction_command_id: Option<String>,
}

impl Document {
    /// Create a freshly imported document
    pub fn new(
        document_id: impl Into<String>,
        session_id: impl Into<String>,
        blob_id: impl Into<String>,
        metadata: DocumentMetadata,
        import_command_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            session_id: session_id.into(),
            blob_id: blob_id.into(),
            lifecycle_state: LifecycleState::Imported,
            metadata,
            imported_at: now,
            import_command_id: import_command_id.into(),
            preprocessing_profile: None,
            preprocessed_page_ids: None,
            reprocessed_at: None,
            last_extraction_command_id: None,
        }
    }
}

/// Base document id for a blob imported into a session
pub fn base_document_id(session_id: &str, blob_id: &str) -> String {
    format!("{}:{}", session_id, blob_id)
}

/// Document id for the n-th re-import of a blob
pub fn reimport_document_id(base: &str, n: u32) -> String {
    format!("{}:reimport-{}", base, n)
}
