pub mod correlation;
pub mod invariants;
pub mod lifecycle;
pub mod validation;
