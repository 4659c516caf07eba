use serde_json::json;
use uuid::Uuid;

use super::transaction::Transaction;
use crate::apply::{CommandContext, HandlerOutput, OutcomeView};
use crate::envelope::CommandType;
use crate::errors::{Result, TabularaError};
use crate::model::audit::{EVENT_SESSION_CREATED, EVENT_SESSION_PINNED, EVENT_SESSION_UNPINNED};
use crate::model::Session;

/// Create a new session with a fresh UUIDv7 id
///
/// # Errors
///
/// Never fails today; the signature matches the other handlers.
pub fn create_session(
    tx: &mut Transaction,
    ctx: &CommandContext<'_>,
    project_id: String,
    schema_id: String,
) -> Result<HandlerOutput> {
    let session_id = Uuid::now_v7().to_string();
    let session = Session::new(session_id.clone(), project_id, schema_id, ctx.now);

    tx.store_mut()
        .sessions
        .insert(session_id.clone(), session.clone());
    tx.append_event(
        ctx.command_id,
        EVENT_SESSION_CREATED,
        json!({
            "session_id": session.id,
            "project_id": session.project_id,
            "schema_id": session.schema_id,
        }),
        ctx.now,
    );

    Ok(HandlerOutput {
        session_id,
        document_ids: Vec::new(),
        view: OutcomeView::Session { session },
    })
}

/// Pin or unpin an existing session
///
/// # Errors
///
/// Returns `PreconditionFailed` (`session_not_found`) for unknown sessions.
pub fn pin_session(
    tx: &mut Transaction,
    ctx: &CommandContext<'_>,
    session_id: String,
    pinned: bool,
) -> Result<HandlerOutput> {
    let session = tx
        .store_mut()
        .sessions
        .get_mut(&session_id)
        .ok_or_else(|| {
            TabularaError::precondition(
                CommandType::PinSession.as_str(),
                "session_id",
                "session_not_found",
            )
        })?;
    session.pinned = pinned;
    session.touch(ctx.now);
    let session = session.clone();

    let event_type = if pinned {
        EVENT_SESSION_PINNED
    } else {
        EVENT_SESSION_UNPINNED
    };
    tx.append_event(
        ctx.command_id,
        event_type,
        json!({ "session_id": session_id, "pinned": pinned }),
        ctx.now,
    );

    Ok(HandlerOutput {
        session_id,
        document_ids: Vec::new(),
        view: OutcomeView::Session { session },
    })
}
