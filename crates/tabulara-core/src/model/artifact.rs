use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// DerivedArtifact - one preprocessed page of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedArtifact {
    /// `{document_id}:artifact:{page_id}:{n}`
    pub artifact_id: String,
    pub session_id: String,
    pub source_document_id: String,
    pub source_page_id: String,
    pub preprocessing_profile: String,
    pub generated_by_command_id: String,
    pub created_at: DateTime<Utc>,
}

/// Artifact id for the n-th artifact generated from a document page
pub fn artifact_id(document_id: &str, page_id: &str, n: usize) -> String {
    format!("{}:artifact:{}:{}", document_id, page_id, n)
}
