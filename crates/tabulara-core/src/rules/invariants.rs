//! Store-wide invariants checked against staged state before commit

use crate::errors::{Result, TabularaError};
use crate::ops::Store;

/// Audit events whose `caused_by` is not a known command
///
/// Returns list of (event_id, caused_by) tuples
pub fn find_unattributed_events<F>(store: &Store, is_known_command: F) -> Vec<(String, String)>
where
    F: Fn(&str) -> bool,
{
    store
        .audit_log()
        .iter()
        .filter(|e| !is_known_command(&e.caused_by))
        .map(|e| (e.event_id.clone(), e.caused_by.clone()))
        .collect()
}

/// Documents whose importing command is not a known command
pub fn find_unattributed_documents<F>(store: &Store, is_known_command: F) -> Vec<String>
where
    F: Fn(&str) -> bool,
{
    store
        .list_documents()
        .filter(|d| !is_known_command(&d.import_command_id))
        .map(|d| d.document_id.clone())
        .collect()
}

/// Documents pointing at a session that does not exist
pub fn find_orphan_documents(store: &Store) -> Vec<String> {
    store
        .list_documents()
        .filter(|d| store.get_session(&d.session_id).is_none())
        .map(|d| d.document_id.clone())
        .collect()
}

/// Duplicate records that pair a document with itself or with a missing document
pub fn find_broken_duplicates(store: &Store) -> Vec<String> {
    store
        .list_duplicates()
        .filter(|r| {
            r.document_id == r.duplicate_of_document_id
                || store.get_document(&r.document_id).is_none()
                || store.get_document(&r.duplicate_of_document_id).is_none()
        })
        .map(|r| r.deterministic_key().to_string())
        .collect()
}

/// Check every store invariant
///
/// `is_known_command` answers whether a command id is (or is about to be)
/// recorded in the idempotency ledger.
///
/// # Errors
///
/// Returns `InvariantViolation` describing the first broken invariant.
pub fn assert_invariants<F>(store: &Store, is_known_command: F) -> Result<()>
where
    F: Fn(&str) -> bool,
{
    let events = find_unattributed_events(store, &is_known_command);
    if let Some((event_id, caused_by)) = events.first() {
        return Err(TabularaError::InvariantViolation {
            message: format!(
                "audit event {} caused by unknown command {}",
                event_id, caused_by
            ),
        });
    }

    let documents = find_unattributed_documents(store, &is_known_command);
    if let Some(document_id) = documents.first() {
        return Err(TabularaError::InvariantViolation {
            message: format!("document {} imported by unknown command", document_id),
        });
    }

    if let Some(document_id) = find_orphan_documents(store).first() {
        return Err(TabularaError::InvariantViolation {
            message: format!("document {} references a missing session", document_id),
        });
    }

    if let Some(key) = find_broken_duplicates(store).first() {
        return Err(TabularaError::InvariantViolation {
            message: format!("duplicate record {} is inconsistent", key),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AuditEvent, Document, DocumentMetadata, DuplicateCorrelation, DuplicateDetector,
        DuplicateRecord, Session,
    };
    use chrono::Utc;
    use serde_json::json;

    fn metadata() -> DocumentMetadata {
        DocumentMetadata {
            source: "import".to_string(),
            file_name: "f.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            file_hash: None,
        }
    }

    fn consistent_store() -> Store {
        let now = Utc::now();
        let mut store = Store::new();
        store
            .sessions
            .insert("s1".to_string(), Session::new("s1", "p", "sc", now));
        store.documents.insert(
            "s1:b1".to_string(),
            Document::new("s1:b1", "s1", "b1", metadata(), "cmd-import", now),
        );
        store.audit_log.push(AuditEvent {
            event_id: "e1".to_string(),
            caused_by: "cmd-import".to_string(),
            event_type: "DocumentImported".to_string(),
            timestamp: now,
            data: json!({ "session_id": "s1" }),
        });
        store
    }

    #[test]
    fn test_consistent_store_passes() {
        let store = consistent_store();
        assert!(assert_invariants(&store, |id| id == "cmd-import").is_ok());
    }

    #[test]
    fn test_unknown_cause_is_reported() {
        let store = consistent_store();
        let events = find_unattributed_events(&store, |_| false);
        assert_eq!(events, vec![("e1".to_string(), "cmd-import".to_string())]);
        assert!(matches!(
            assert_invariants(&store, |_| false),
            Err(TabularaError::InvariantViolation { .. })
        ));
    }

    #[test]
    fn test_orphan_document_is_reported() {
        let mut store = consistent_store();
        store.sessions.clear();
        assert_eq!(find_orphan_documents(&store), vec!["s1:b1".to_string()]);
    }

    #[test]
    fn test_self_duplicate_is_reported() {
        let mut store = consistent_store();
        store.duplicates.insert(
            "s1:s1:b1:s1:b1".to_string(),
            DuplicateRecord {
                session_id: "s1".to_string(),
                document_id: "s1:b1".to_string(),
                duplicate_of_document_id: "s1:b1".to_string(),
                state: "duplicate".to_string(),
                linked_import_command_id: "cmd-import".to_string(),
                correlation: DuplicateCorrelation {
                    pair_key: "s1:b1::s1:b1".to_string(),
                    deterministic_key: "s1:s1:b1:s1:b1".to_string(),
                    source_import_command_id: "cmd-import".to_string(),
                    detector: DuplicateDetector::Hash,
                },
                confirmed_by_command_id: "cmd-dup".to_string(),
                created_at: Utc::now(),
            },
        );
        assert_eq!(find_broken_duplicates(&store).len(), 1);
    }
}
