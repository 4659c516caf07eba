pub mod artifact;
pub mod audit;
pub mod document;
pub mod duplicate;
pub mod extraction;
pub mod ledger;
pub mod session;

pub use artifact::DerivedArtifact;
pub use audit::AuditEvent;
pub use document::{Document, DocumentMetadata, LifecycleState};
pub use duplicate::{DuplicateCorrelation, DuplicateDetector, DuplicateRecord};
pub use extraction::{
    DerivedValue, ExtractionOutputRecord, ExtractionOutputs, Line, TableCandidate, Token,
};
pub use ledger::LedgerEntry;
pub use session::{Session, SessionStatus};
