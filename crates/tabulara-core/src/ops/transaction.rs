use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::store::Store;
use crate::model::AuditEvent;

/// Staged mutation against a working copy of the store
///
/// `begin` clones every collection; handlers mutate the clone and append
/// events to it. `commit` swaps the working copy into the target store in one
/// assignment. Dropping the transaction without committing discards all
/// staged writes.
#[derive(Debug)]
pub struct Transaction {
    working: Store,
    staged_events: Vec<AuditEvent>,
}

impl Transaction {
    pub fn begin(store: &Store) -> Self {
        Self {
            working: store.clone(),
            staged_events: Vec::new(),
        }
    }

    /// Read access to the working copy
    pub fn store(&self) -> &Store {
        &self.working
    }

    pub(crate) fn store_mut(&mut self) -> &mut Store {
        &mut self.working
    }

    /// Append an audit event to the working copy
    ///
    /// The timestamp is clamped to the last logged event so audit order and
    /// timestamp order never disagree.
    pub fn append_event(
        &mut self,
        caused_by: &str,
        event_type: &str,
        data: Value,
        now: DateTime<Utc>,
    ) -> &AuditEvent {
        let timestamp = match self.working.audit_log.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };
        let event = AuditEvent {
            event_id: Uuid::now_v7().to_string(),
            caused_by: caused_by.to_string(),
            event_type: event_type.to_string(),
            timestamp,
            data,
        };
        self.working.audit_log.push(event.clone());
        self.staged_events.push(event);
        &self.staged_events[self.staged_events.len() - 1]
    }

    /// Events appended in this transaction, in order
    pub fn staged_events(&self) -> &[AuditEvent] {
        &self.staged_events
    }

    /// Replace the target store with the working copy
    pub fn commit(self, target: &mut Store) -> Vec<AuditEvent> {
        *target = self.working;
        self.staged_events
    }

    /// Discard all staged writes
    pub fn abort(self) {
        tracing::debug!(
            staged_events = self.staged_events.len(),
            "transaction aborted"
        );
    }
}
