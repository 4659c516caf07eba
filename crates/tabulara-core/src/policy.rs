//! Injectable policies consulted by command handlers
//!
//! Handlers never hard-code which lifecycle moves or preprocessing profiles
//! are acceptable; they ask a policy passed in through the `CommandContext`.

use std::collections::HashSet;

use crate::model::LifecycleState;
use crate::rules::lifecycle;

/// Profile literal that is never resolvable
pub const MISSING_PROFILE: &str = "missing-profile";

/// Policy deciding which ReprocessDocument targets are reachable
pub trait LifecyclePolicy: Send + Sync {
    /// Resolve a requested target state from the current one
    ///
    /// # Returns
    /// * `Some(state)` - the transition is allowed and lands on `state`
    /// * `None` - the transition is not allowed
    fn resolve_transition(&self, from: LifecycleState, target: &str) -> Option<LifecycleState>;
}

/// Only `reprocessed` is a valid target, from any state
///
/// # Example
/// ```
/// use tabulara_core::model::LifecycleState;
/// use tabulara_core::policy::{LifecyclePolicy, ReprocessOnlyPolicy};
///
/// let policy = ReprocessOnlyPolicy;
/// assert_eq!(
///     policy.resolve_transition(LifecycleState::Imported, "reprocessed"),
///     Some(LifecycleState::Reprocessed)
/// );
/// assert_eq!(policy.resolve_transition(LifecycleState::Imported, "archived"), None);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ReprocessOnlyPolicy;

impl LifecyclePolicy for ReprocessOnlyPolicy {
    fn resolve_transition(&self, from: LifecycleState, target: &str) -> Option<LifecycleState> {
        let to = LifecycleState::parse(target)?;
        lifecycle::is_transition_allowed(from, to).then_some(to)
    }
}

/// Catalog of preprocessing profiles known to the pipeline
pub trait ProfileCatalog: Send + Sync {
    fn has_preprocessing_profile(&self, profile: &str) -> bool;
}

/// Accepts every profile except [`MISSING_PROFILE`]
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenProfileCatalog;

impl ProfileCatalog for OpenProfileCatalog {
    fn has_preprocessing_profile(&self, profile: &str) -> bool {
        profile != MISSING_PROFILE
    }
}

/// Accepts only the declared profiles
#[derive(Debug, Clone, Default)]
pub struct SelectedProfileCatalog {
    profiles: HashSet<String>,
}

impl SelectedProfileCatalog {
    pub fn new(profiles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            profiles: profiles.into_iter().map(Into::into).collect(),
        }
    }
}

impl ProfileCatalog for SelectedProfileCatalog {
    fn has_preprocessing_profile(&self, profile: &str) -> bool {
        profile != MISSING_PROFILE && self.profiles.contains(profile)
    }
}
