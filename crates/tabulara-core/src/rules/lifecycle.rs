//! Document lifecycle transition table

use crate::model::LifecycleState;

/// Allowed `(from, to)` moves for ReprocessDocument
///
/// `reprocessed` is one-way and self-looping: nothing leaves it.
pub const ALLOWED_TRANSITIONS: [(LifecycleState, LifecycleState); 3] = [
    (LifecycleState::Imported, LifecycleState::Reprocessed),
    (LifecycleState::Preprocessed, LifecycleState::Reprocessed),
    (LifecycleState::Reprocessed, LifecycleState::Reprocessed),
];

pub fn is_transition_allowed(from: LifecycleState, to: LifecycleState) -> bool {
    ALLOWED_TRANSITIONS.contains(&(from, to))
}

/// State a document lands in after ApplyPreprocessing
///
/// A reprocessed document keeps its state; preprocessing never regresses it.
pub fn after_preprocessing(from: LifecycleState) -> LifecycleState {
    match from {
        LifecycleState::Reprocessed => LifecycleState::Reprocessed,
        LifecycleState::Imported | LifecycleState::Preprocessed => LifecycleState::Preprocessed,
    }
}
