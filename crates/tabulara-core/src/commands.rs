//! Typed commands produced by payload validation
//!
//! One variant per supported command type. Handlers match on this enum
//! exhaustively, so there is no string-keyed fallback branch.

use crate::envelope::CommandType;
use crate::model::{DocumentMetadata, DuplicateDetector};

/// Deterministic failure hooks used by tests and drills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureStage {
    /// ApplyPreprocessing: fail while generating artifacts
    ArtifactGeneration,
    /// RunExtraction: fail before any mutation
    ExtractorRuntime,
    /// RunExtraction: stage everything then abort before commit
    PersistenceBeforeCommit,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::ArtifactGeneration => "artifact-generation",
            FailureStage::ExtractorRuntime => "extractor-runtime",
            FailureStage::PersistenceBeforeCommit => "persistence-before-commit",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "artifact-generation" | "artifact_generation" => Some(FailureStage::ArtifactGeneration),
            "extractor-runtime" => Some(FailureStage::ExtractorRuntime),
            "persistence-before-commit" => Some(FailureStage::PersistenceBeforeCommit),
            _ => None,
        }
    }

    /// Stages a given command type accepts
    pub fn accepted_by(command_type: CommandType) -> &'static [FailureStage] {
        match command_type {
            CommandType::ApplyPreprocessing => &[FailureStage::ArtifactGeneration],
            CommandType::RunExtraction => &[
                FailureStage::ExtractorRuntime,
                FailureStage::PersistenceBeforeCommit,
            ],
            _ => &[],
        }
    }
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Command enum representing every supported intent
///
/// Commands are processed by the `apply()` function, which stages the change
/// in a transaction and commits it only when the whole command succeeds.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Open a new intake session
    CreateSession {
        project_id: String,
        schema_id: String,
    },

    /// Pin or unpin an existing session
    PinSession { session_id: String, pinned: bool },

    /// Import one document per blob, creating the session when missing
    ImportDocument {
        session_id: String,
        blob_ids: Vec<String>,
        metadata: DocumentMetadata,
    },

    /// Record that two documents in a session are duplicates
    ConfirmDuplicate {
        session_id: String,
        document_id: String,
        duplicate_of_document_id: String,
        source_import_command_id: String,
        detector: DuplicateDetector,
    },

    /// Generate page artifacts for a document
    ApplyPreprocessing {
        session_id: String,
        document_id: String,
        page_ids: Vec<String>,
        preprocessing_profile: String,
        force_fail_stage: Option<FailureStage>,
    },

    /// Move a document to a new lifecycle state
    ReprocessDocument {
        session_id: String,
        document_id: String,
        target_state: String,
        reason: String,
    },

    /// Run the extraction stage against a preprocessed document
    RunExtraction {
        session_id: String,
        document_id: String,
        extraction_profile: String,
        source_state: String,
        force_fail_stage: Option<FailureStage>,
    },
}

impl Command {
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::CreateSession { .. } => CommandType::CreateSession,
            Command::PinSession { .. } => CommandType::PinSession,
            Command::ImportDocument { .. } => CommandType::ImportDocument,
            Command::ConfirmDuplicate { .. } => CommandType::ConfirmDuplicate,
            Command::ApplyPreprocessing { .. } => CommandType::ApplyPreprocessing,
            Command::ReprocessDocument { .. } => CommandType::ReprocessDocument,
            Command::RunExtraction { .. } => CommandType::RunExtraction,
        }
    }

    /// Session referenced by the payload (CreateSession has none yet)
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Command::CreateSession { .. } => None,
            Command::PinSession { session_id, .. }
            | Command::ImportDocument { session_id, .. }
            | Command::ConfirmDuplicate { session_id, .. }
            | Command::ApplyPreprocessing { session_id, .. }
            | Command::ReprocessDocument { session_id, .. }
            | Command::RunExtraction { session_id, .. } => Some(session_id),
        }
    }
}
