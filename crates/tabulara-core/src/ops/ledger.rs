use std::collections::BTreeMap;

use crate::errors::{Result, TabularaError};
use crate::model::LedgerEntry;

/// Idempotency ledger keyed by command id
///
/// Entries are only ever inserted, once per successful commit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdempotencyLedger {
    entries: BTreeMap<String, LedgerEntry>,
}

impl IdempotencyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, command_id: &str) -> bool {
        self.entries.contains_key(command_id)
    }

    pub fn get(&self, command_id: &str) -> Option<&LedgerEntry> {
        self.entries.get(command_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reject a command id that has already been committed
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCommandId` when the id is present.
    pub fn ensure_unused(&self, command_id: &str) -> Result<()> {
        if self.contains(command_id) {
            return Err(TabularaError::DuplicateCommandId {
                command_id: command_id.to_string(),
            });
        }
        Ok(())
    }

    /// Record a committed command
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCommandId` when the id is already present; the
    /// existing entry is kept.
    pub fn record(&mut self, entry: LedgerEntry) -> Result<()> {
        self.ensure_unused(&entry.command_id)?;
        self.entries.insert(entry.command_id.clone(), entry);
        Ok(())
    }
}
