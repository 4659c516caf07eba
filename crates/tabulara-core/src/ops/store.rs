use std::collections::BTreeMap;

use crate::model::{
    AuditEvent, DerivedArtifact, Document, DuplicateRecord, ExtractionOutputRecord, Session,
};

/// In-memory domain store
///
/// Owned by a single dispatcher; there is no ambient global instance. Handlers
/// never write to it directly: they stage changes on a `Transaction` working
/// copy that replaces the store in one assignment on commit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    /// Session ID -> Session
    pub(crate) sessions: BTreeMap<String, Session>,
    /// Document ID -> Document
    pub(crate) documents: BTreeMap<String, Document>,
    /// Deterministic key -> DuplicateRecord
    pub(crate) duplicates: BTreeMap<String, DuplicateRecord>,
    /// Artifacts in generation order
    pub(crate) artifacts: Vec<DerivedArtifact>,
    /// Document ID -> latest extraction output
    pub(crate) extraction_outputs: BTreeMap<String, ExtractionOutputRecord>,
    /// Append-only audit log
    pub(crate) audit_log: Vec<AuditEvent>,
}

impl Store {
    /// Create a new empty Store
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_session(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn get_document(&self, id: &str) -> Option<&Document> {
        self.documents.get(id)
    }

    /// Get a document only if it belongs to the given session
    pub fn get_document_in_session(&self, session_id: &str, id: &str) -> Option<&Document> {
        self.documents
            .get(id)
            .filter(|d| d.session_id == session_id)
    }

    pub fn get_duplicate(&self, deterministic_key: &str) -> Option<&DuplicateRecord> {
        self.duplicates.get(deterministic_key)
    }

    pub fn get_extraction_output(&self, document_id: &str) -> Option<&ExtractionOutputRecord> {
        self.extraction_outputs.get(document_id)
    }

    pub fn list_sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn list_documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    pub fn list_duplicates(&self) -> impl Iterator<Item = &DuplicateRecord> {
        self.duplicates.values()
    }

    pub fn documents_in_session(&self, session_id: &str) -> Vec<&Document> {
        self.documents
            .values()
            .filter(|d| d.session_id == session_id)
            .collect()
    }

    pub fn duplicates_in_session(&self, session_id: &str) -> Vec<&DuplicateRecord> {
        self.duplicates
            .values()
            .filter(|r| r.session_id == session_id)
            .collect()
    }

    /// Artifacts generated from a document, oldest first
    pub fn artifacts_for_document(&self, document_id: &str) -> Vec<&DerivedArtifact> {
        self.artifacts
            .iter()
            .filter(|a| a.source_document_id == document_id)
            .collect()
    }

    /// Full audit log in append order
    pub fn audit_log(&self) -> &[AuditEvent] {
        &self.audit_log
    }

    pub fn audit_log_for_session(&self, session_id: &str) -> Vec<&AuditEvent> {
        self.audit_log
            .iter()
            .filter(|e| e.session_id() == Some(session_id))
            .collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn artifact_count(&self) -> usize {
        self.artifacts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocumentMetadata;
    use chrono::Utc;

    fn metadata() -> DocumentMetadata {
        DocumentMetadata {
            source: "import".to_string(),
            file_name: "f.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            file_hash: None,
        }
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = Store::new();
        assert_eq!(store.session_count(), 0);
        assert_eq!(store.document_count(), 0);
        assert!(store.audit_log().is_empty());
    }

    #[test]
    fn test_document_in_session_filters_by_session() {
        let mut store = Store::new();
        let now = Utc::now();
        store.documents.insert(
            "s1:b1".to_string(),
            Document::new("s1:b1", "s1", "b1", metadata(), "cmd-1", now),
        );

        assert!(store.get_document_in_session("s1", "s1:b1").is_some());
        assert!(store.get_document_in_session("s2", "s1:b1").is_none());
        assert_eq!(store.documents_in_session("s1").len(), 1);
    }
}
