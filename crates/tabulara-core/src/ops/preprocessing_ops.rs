use serde_json::json;

use super::transaction::Transaction;
use crate::apply::{CommandContext, HandlerOutput, OutcomeView};
use crate::commands::FailureStage;
use crate::envelope::CommandType;
use crate::errors::{Result, TabularaError};
use crate::model::artifact::artifact_id;
use crate::model::audit::{EVENT_DOCUMENT_REPROCESSED, EVENT_PREPROCESSING_APPLIED};
use crate::model::{DerivedArtifact, Document};
use crate::rules::lifecycle;

fn document_not_found(command_type: CommandType) -> TabularaError {
    TabularaError::precondition(command_type.as_str(), "document_id", "document_not_found")
}

fn profile_not_found() -> TabularaError {
    TabularaError::precondition(
        CommandType::ApplyPreprocessing.as_str(),
        "preprocessing_profile",
        "profile_not_found",
    )
}

fn touch_session(tx: &mut Transaction, ctx: &CommandContext<'_>, session_id: &str) {
    if let Some(session) = tx.store_mut().sessions.get_mut(session_id) {
        session.touch(ctx.now);
    }
}

/// Arguments of an ApplyPreprocessing command
pub struct PreprocessingRequest {
    pub session_id: String,
    pub document_id: String,
    pub page_ids: Vec<String>,
    pub preprocessing_profile: String,
    pub force_fail_stage: Option<FailureStage>,
}

/// Generate one artifact per page and mark the document preprocessed
///
/// # Errors
///
/// Returns `PreconditionFailed` when the document is not in the session or
/// the profile cannot be resolved. An injected artifact-generation failure
/// is reported the same way as an unresolvable profile.
pub fn apply_preprocessing(
    tx: &mut Transaction,
    ctx: &CommandContext<'_>,
    req: PreprocessingRequest,
) -> Result<HandlerOutput> {
    if tx
        .store()
        .get_document_in_session(&req.session_id, &req.document_id)
        .is_none()
    {
        return Err(document_not_found(CommandType::ApplyPreprocessing));
    }
    if !ctx
        .profile_catalog
        .has_preprocessing_profile(&req.preprocessing_profile)
    {
        return Err(profile_not_found());
    }

    let mut artifacts = Vec::with_capacity(req.page_ids.len());
    for page_id in &req.page_ids {
        let previous = tx
            .store()
            .artifacts
            .iter()
            .filter(|a| a.source_document_id == req.document_id && &a.source_page_id == page_id)
            .count();
        let artifact = DerivedArtifact {
            artifact_id: artifact_id(&req.document_id, page_id, previous + 1),
            session_id: req.session_id.clone(),
            source_document_id: req.document_id.clone(),
            source_page_id: page_id.clone(),
            preprocessing_profile: req.preprocessing_profile.clone(),
            generated_by_command_id: ctx.command_id.to_string(),
            created_at: ctx.now,
        };
        tx.store_mut().artifacts.push(artifact.clone());
        artifacts.push(artifact);
    }

    // Fires with artifacts already staged so the abort path is exercised
    if req.force_fail_stage == Some(FailureStage::ArtifactGeneration) {
        return Err(profile_not_found());
    }

    let document = update_document(tx, &req.document_id, |doc| {
        doc.lifecycle_state = lifecycle::after_preprocessing(doc.lifecycle_state);
        doc.preprocessing_profile = Some(req.preprocessing_profile.clone());
        doc.preprocessed_page_ids = Some(req.page_ids.clone());
    })?;
    touch_session(tx, ctx, &req.session_id);

    let artifact_ids: Vec<&str> = artifacts.iter().map(|a| a.artifact_id.as_str()).collect();
    tx.append_event(
        ctx.command_id,
        EVENT_PREPROCESSING_APPLIED,
        json!({
            "session_id": req.session_id,
            "document_id": req.document_id,
            "preprocessing_profile": req.preprocessing_profile,
            "page_ids": req.page_ids,
            "artifact_ids": artifact_ids,
        }),
        ctx.now,
    );

    Ok(HandlerOutput {
        session_id: req.session_id,
        document_ids: vec![req.document_id],
        view: OutcomeView::Preprocessing {
            document,
            derived_artifacts: artifacts,
        },
    })
}

/// Move a document to a new lifecycle state
///
/// # Errors
///
/// Returns `PreconditionFailed` when the document is not in the session
/// (`document_not_found`) or the lifecycle policy rejects the target
/// (`transition_not_allowed`).
pub fn reprocess_document(
    tx: &mut Transaction,
    ctx: &CommandContext<'_>,
    session_id: String,
    document_id: String,
    target_state: String,
    reason: String,
) -> Result<HandlerOutput> {
    let previous_state = tx
        .store()
        .get_document_in_session(&session_id, &document_id)
        .map(|d| d.lifecycle_state)
        .ok_or_else(|| document_not_found(CommandType::ReprocessDocument))?;

    let next_state = ctx
        .lifecycle_policy
        .resolve_transition(previous_state, &target_state)
        .ok_or_else(|| {
            TabularaError::precondition(
                CommandType::ReprocessDocument.as_str(),
                "lifecycle_state",
                "transition_not_allowed",
            )
        })?;

    let document = update_document(tx, &document_id, |doc| {
        doc.lifecycle_state = next_state;
        doc.reprocessed_at = Some(ctx.now);
    })?;
    touch_session(tx, ctx, &session_id);

    tx.append_event(
        ctx.command_id,
        EVENT_DOCUMENT_REPROCESSED,
        json!({
            "session_id": session_id,
            "document_id": document_id,
            "previous_state": previous_state.as_str(),
            "target_state": next_state.as_str(),
            "reason": reason,
        }),
        ctx.now,
    );

    let audit_log = tx
        .store()
        .audit_log_for_session(&session_id)
        .into_iter()
        .cloned()
        .collect();

    Ok(HandlerOutput {
        session_id,
        document_ids: vec![document_id],
        view: OutcomeView::Reprocessing {
            document,
            audit_log,
        },
    })
}

/// Mutate a staged document and return its new state
pub(crate) fn update_document<F>(
    tx: &mut Transaction,
    document_id: &str,
    f: F,
) -> Result<Document>
where
    F: FnOnce(&mut Document),
{
    let document = tx
        .store_mut()
        .documents
        .get_mut(document_id)
        .ok_or_else(|| TabularaError::Internal {
            message: format!("document {} vanished during command", document_id),
        })?;
    f(document);
    Ok(document.clone())
}
