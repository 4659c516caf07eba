use serde_json::json;

use super::ledger::IdempotencyLedger;
use super::transaction::Transaction;
use crate::apply::{CommandContext, HandlerOutput, OutcomeView};
use crate::envelope::CommandType;
use crate::errors::{FieldIssue, Result, TabularaError};
use crate::model::audit::{EVENT_DOCUMENT_IMPORTED, EVENT_DUPLICATE_MARKED};
use crate::model::document::{base_document_id, reimport_document_id};
use crate::model::duplicate::DUPLICATE_STATE;
use crate::model::{
    Document, DocumentMetadata, DuplicateCorrelation, DuplicateDetector, DuplicateRecord, Session,
};
use crate::rules::correlation::correlate;

/// Pick a free document id for a blob, keeping first-import ids stable
fn allocate_document_id(tx: &Transaction, session_id: &str, blob_id: &str) -> String {
    let base = base_document_id(session_id, blob_id);
    if tx.store().get_document(&base).is_none() {
        return base;
    }
    let mut n = 1;
    loop {
        let candidate = reimport_document_id(&base, n);
        if tx.store().get_document(&candidate).is_none() {
            return candidate;
        }
        n += 1;
    }
}

/// Import one document per blob id
///
/// A missing session is created with the configured placeholder project and
/// schema ids.
///
/// # Errors
///
/// Never fails today; the signature matches the other handlers.
pub fn import_document(
    tx: &mut Transaction,
    ctx: &CommandContext<'_>,
    session_id: String,
    blob_ids: Vec<String>,
    metadata: DocumentMetadata,
) -> Result<HandlerOutput> {
    let session_created = tx.store().get_session(&session_id).is_none();
    if session_created {
        let session = Session::new(
            session_id.clone(),
            ctx.placeholder_project_id,
            ctx.placeholder_schema_id,
            ctx.now,
        );
        tx.store_mut().sessions.insert(session_id.clone(), session);
    } else if let Some(session) = tx.store_mut().sessions.get_mut(&session_id) {
        session.touch(ctx.now);
    }

    let mut documents = Vec::with_capacity(blob_ids.len());
    for blob_id in &blob_ids {
        let document_id = allocate_document_id(tx, &session_id, blob_id);
        let document = Document::new(
            document_id.clone(),
            session_id.clone(),
            blob_id.clone(),
            metadata.clone(),
            ctx.command_id,
            ctx.now,
        );
        tx.store_mut()
            .documents
            .insert(document_id, document.clone());
        documents.push(document);
    }
    let document_ids: Vec<String> = documents.iter().map(|d| d.document_id.clone()).collect();

    tx.append_event(
        ctx.command_id,
        EVENT_DOCUMENT_IMPORTED,
        json!({
            "session_id": session_id,
            "document_ids": document_ids,
            "blob_ids": blob_ids,
            "source": metadata.source,
            "file_name": metadata.file_name,
            "mime_type": metadata.mime_type,
            "session_created": session_created,
        }),
        ctx.now,
    );

    let session = tx
        .store()
        .get_session(&session_id)
        .cloned()
        .ok_or_else(|| TabularaError::Internal {
            message: format!("session {} vanished during import", session_id),
        })?;

    Ok(HandlerOutput {
        session_id,
        document_ids,
        view: OutcomeView::Documents { session, documents },
    })
}

/// Arguments of a ConfirmDuplicate command
pub struct DuplicateRequest {
    pub session_id: String,
    pub document_id: String,
    pub duplicate_of_document_id: String,
    pub source_import_command_id: String,
    pub detector: DuplicateDetector,
}

fn check_duplicate_preconditions(
    tx: &Transaction,
    ledger: &IdempotencyLedger,
    req: &DuplicateRequest,
) -> Vec<FieldIssue> {
    let mut issues = Vec::new();

    let source_field = "correlation.source_import_command_id";
    let resolved = match ledger.get(&req.source_import_command_id) {
        Some(entry) if entry.command_type == CommandType::ImportDocument => {
            if entry.session_id == req.session_id {
                Some(entry)
            } else {
                issues.push(FieldIssue::new(source_field, "source_import_session_mismatch"));
                None
            }
        }
        _ => {
            issues.push(FieldIssue::new(source_field, "source_import_not_found"));
            None
        }
    };

    let store = tx.store();
    if store
        .get_document_in_session(&req.session_id, &req.document_id)
        .is_none()
    {
        issues.push(FieldIssue::new("document_id", "document_not_found"));
    }
    if store
        .get_document_in_session(&req.session_id, &req.duplicate_of_document_id)
        .is_none()
    {
        issues.push(FieldIssue::new("duplicate_of_document_id", "document_not_found"));
    }

    if let Some(entry) = resolved {
        let in_lineage = entry.document_ids.contains(&req.document_id)
            || entry.document_ids.contains(&req.duplicate_of_document_id);
        if !in_lineage {
            issues.push(FieldIssue::new(source_field, "lineage_mismatch"));
        }
    }

    issues
}

/// Record two documents as duplicates under an order-independent key
///
/// Confirming a pair that is already recorded, in either order, returns the
/// stored record unchanged.
///
/// # Errors
///
/// Returns `PreconditionFailed` listing every failed lineage or existence check.
pub fn confirm_duplicate(
    tx: &mut Transaction,
    ctx: &CommandContext<'_>,
    ledger: &IdempotencyLedger,
    req: DuplicateRequest,
) -> Result<HandlerOutput> {
    let issues = check_duplicate_preconditions(tx, ledger, &req);
    if !issues.is_empty() {
        return Err(TabularaError::PreconditionFailed {
            command_type: CommandType::ConfirmDuplicate.as_str().to_string(),
            issues,
        });
    }

    let keys = correlate(&req.session_id, &req.document_id, &req.duplicate_of_document_id);
    let existing = tx.store().get_duplicate(&keys.deterministic_key).cloned();
    let already_marked = existing.is_some();
    let record = match existing {
        Some(record) => record,
        None => {
            let record = DuplicateRecord {
                session_id: req.session_id.clone(),
                document_id: req.document_id.clone(),
                duplicate_of_document_id: req.duplicate_of_document_id.clone(),
                state: DUPLICATE_STATE.to_string(),
                linked_import_command_id: req.source_import_command_id.clone(),
                correlation: DuplicateCorrelation {
                    pair_key: keys.pair_key.clone(),
                    deterministic_key: keys.deterministic_key.clone(),
                    source_import_command_id: req.source_import_command_id.clone(),
                    detector: req.detector,
                },
                confirmed_by_command_id: ctx.command_id.to_string(),
                created_at: ctx.now,
            };
            tx.store_mut()
                .duplicates
                .insert(keys.deterministic_key.clone(), record.clone());
            record
        }
    };

    if let Some(session) = tx.store_mut().sessions.get_mut(&req.session_id) {
        session.touch(ctx.now);
    }

    tx.append_event(
        ctx.command_id,
        EVENT_DUPLICATE_MARKED,
        json!({
            "session_id": record.session_id,
            "document_id": record.document_id,
            "duplicate_of_document_id": record.duplicate_of_document_id,
            "pair_key": record.correlation.pair_key,
            "deterministic_key": record.correlation.deterministic_key,
            "detector": record.correlation.detector.as_str(),
            "already_marked": already_marked,
        }),
        ctx.now,
    );

    Ok(HandlerOutput {
        session_id: req.session_id,
        document_ids: vec![req.document_id, req.duplicate_of_document_id],
        view: OutcomeView::Duplicate {
            duplicate: record,
            already_marked,
        },
    })
}
