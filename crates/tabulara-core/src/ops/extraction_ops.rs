use serde_json::json;

use super::preprocessing_ops::update_document;
use super::transaction::Transaction;
use crate::apply::{CommandContext, HandlerOutput, OutcomeView};
use crate::commands::FailureStage;
use crate::envelope::CommandType;
use crate::errors::{FieldIssue, Result, TabularaError};
use crate::extraction;
use crate::model::audit::{EVENT_DERIVED_DATA_UPDATED, EVENT_EXTRACTION_COMPLETED};
use crate::model::ExtractionOutputRecord;

/// The only source state extraction accepts
pub const PREPROCESS_READY: &str = "preprocess-ready";

/// Arguments of a RunExtraction command
pub struct ExtractionRequest {
    pub session_id: String,
    pub document_id: String,
    pub extraction_profile: String,
    pub source_state: String,
    pub force_fail_stage: Option<FailureStage>,
}

fn check_extraction_preconditions(tx: &Transaction, req: &ExtractionRequest) -> Vec<FieldIssue> {
    let mut issues = Vec::new();
    let store = tx.store();

    if req.source_state != PREPROCESS_READY {
        issues.push(FieldIssue::new("source_state", "source_state_mismatch"));
    }
    if store.get_session(&req.session_id).is_none() {
        issues.push(FieldIssue::new("session_id", "session_not_found"));
    }
    match store.get_document_in_session(&req.session_id, &req.document_id) {
        None => issues.push(FieldIssue::new("document_id", "document_not_found")),
        Some(doc) if !doc.lifecycle_state.is_preprocess_ready() => {
            issues.push(FieldIssue::new(
                "lifecycle_state",
                "document_not_preprocess_ready",
            ));
        }
        Some(_) => {}
    }

    issues
}

/// Run the simulated extractor and persist its outputs
///
/// Emits `ExtractionCompleted` then `DerivedDataUpdated`.
///
/// # Errors
///
/// - `ExtractionRuntime` for an injected extractor failure, before any check
/// - `PreconditionFailed` listing every failed precondition
/// - `TransactionRolledBack` for an injected pre-commit failure, after the
///   full mutation has been staged
pub fn run_extraction(
    tx: &mut Transaction,
    ctx: &CommandContext<'_>,
    req: ExtractionRequest,
) -> Result<HandlerOutput> {
    if req.force_fail_stage == Some(FailureStage::ExtractorRuntime) {
        return Err(TabularaError::ExtractionRuntime {
            session_id: req.session_id,
            document_id: req.document_id,
            extraction_profile: req.extraction_profile,
        });
    }

    let issues = check_extraction_preconditions(tx, &req);
    if !issues.is_empty() {
        return Err(TabularaError::PreconditionFailed {
            command_type: CommandType::RunExtraction.as_str().to_string(),
            issues,
        });
    }

    tracing::debug!(
        document_id = %req.document_id,
        fingerprint = %extraction::extraction_fingerprint(&req.document_id, &req.extraction_profile),
        "running extraction"
    );
    let outputs = extraction::simulate(&req.document_id, &req.extraction_profile);
    let record = ExtractionOutputRecord {
        document_id: req.document_id.clone(),
        session_id: req.session_id.clone(),
        extraction_profile: req.extraction_profile.clone(),
        source_state: req.source_state.clone(),
        generated_by_command_id: ctx.command_id.to_string(),
        outputs,
        generated_at: ctx.now,
    };
    tx.store_mut()
        .extraction_outputs
        .insert(req.document_id.clone(), record.clone());

    let document = update_document(tx, &req.document_id, |doc| {
        doc.last_extraction_command_id = Some(ctx.command_id.to_string());
    })?;
    if let Some(session) = tx.store_mut().sessions.get_mut(&req.session_id) {
        session.touch(ctx.now);
    }

    tx.append_event(
        ctx.command_id,
        EVENT_EXTRACTION_COMPLETED,
        json!({
            "session_id": req.session_id,
            "document_id": req.document_id,
            "extraction_profile": req.extraction_profile,
            "token_count": record.outputs.tokens.len(),
            "line_count": record.outputs.lines.len(),
            "table_candidate_count": record.outputs.table_candidates.len(),
        }),
        ctx.now,
    );
    let derived_fields: Vec<&str> = record
        .outputs
        .derived_values
        .iter()
        .map(|v| v.field.as_str())
        .collect();
    tx.append_event(
        ctx.command_id,
        EVENT_DERIVED_DATA_UPDATED,
        json!({
            "session_id": req.session_id,
            "document_id": req.document_id,
            "derived_fields": derived_fields,
        }),
        ctx.now,
    );

    if req.force_fail_stage == Some(FailureStage::PersistenceBeforeCommit) {
        return Err(TabularaError::TransactionRolledBack {
            command_id: ctx.command_id.to_string(),
            scope: CommandType::RunExtraction.op_name().to_string(),
            stage: FailureStage::PersistenceBeforeCommit.as_str().to_string(),
        });
    }

    Ok(HandlerOutput {
        session_id: req.session_id,
        document_ids: vec![req.document_id],
        view: OutcomeView::Extraction {
            document,
            extraction_outputs: record,
        },
    })
}
