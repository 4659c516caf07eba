#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use chrono::{DateTime, TimeZone, Utc};
use tabulara_core::model::{DocumentMetadata, DuplicateDetector};
use tabulara_core::{
    apply, Command, CommandContext, CommandOutcome, FailureStage, IdempotencyLedger, Result,
    Store,
};

/// Fixed instant used by every harness
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap()
}

pub fn metadata() -> DocumentMetadata {
    DocumentMetadata {
        source: "import".to_string(),
        file_name: "f.pdf".to_string(),
        mime_type: "application/pdf".to_string(),
        file_hash: None,
    }
}

pub fn import_cmd(session_id: &str, blob_ids: &[&str]) -> Command {
    Command::ImportDocument {
        session_id: session_id.to_string(),
        blob_ids: blob_ids.iter().map(|b| b.to_string()).collect(),
        metadata: metadata(),
    }
}

pub fn duplicate_cmd(session_id: &str, a: &str, b: &str, source_import: &str) -> Command {
    Command::ConfirmDuplicate {
        session_id: session_id.to_string(),
        document_id: a.to_string(),
        duplicate_of_document_id: b.to_string(),
        source_import_command_id: source_import.to_string(),
        detector: DuplicateDetector::Hash,
    }
}

pub fn preprocess_cmd(session_id: &str, document_id: &str, pages: &[&str]) -> Command {
    Command::ApplyPreprocessing {
        session_id: session_id.to_string(),
        document_id: document_id.to_string(),
        page_ids: pages.iter().map(|p| p.to_string()).collect(),
        preprocessing_profile: "deskew-v1".to_string(),
        force_fail_stage: None,
    }
}

pub fn reprocess_cmd(session_id: &str, document_id: &str, target: &str) -> Command {
    Command::ReprocessDocument {
        session_id: session_id.to_string(),
        document_id: document_id.to_string(),
        target_state: target.to_string(),
        reason: "operator request".to_string(),
    }
}

pub fn extraction_cmd(
    session_id: &str,
    document_id: &str,
    force_fail_stage: Option<FailureStage>,
) -> Command {
    Command::RunExtraction {
        session_id: session_id.to_string(),
        document_id: document_id.to_string(),
        extraction_profile: "default-v1".to_string(),
        source_state: "preprocess-ready".to_string(),
        force_fail_stage,
    }
}

/// Store and ledger pair driven through `apply()`
#[derive(Default)]
pub struct Harness {
    pub store: Store,
    pub ledger: IdempotencyLedger,
}

impl Harness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run(&mut self, command_id: &str, cmd: Command) -> Result<CommandOutcome> {
        let ctx = CommandContext::new(command_id, test_now());
        apply(&mut self.store, &mut self.ledger, &ctx, cmd)
    }

    /// Import blobs into a session and return the document ids
    pub fn import(&mut self, command_id: &str, session_id: &str, blob_ids: &[&str]) -> Vec<String> {
        self.run(command_id, import_cmd(session_id, blob_ids))
            .expect("import should succeed")
            .document_ids
    }

    /// Import a single blob and preprocess it
    pub fn preprocessed_document(&mut self, session_id: &str, blob_id: &str) -> String {
        let import_id = format!("cmd-import-{}", blob_id);
        let document_id = self.import(&import_id, session_id, &[blob_id]).remove(0);
        let preprocess_id = format!("cmd-preprocess-{}", blob_id);
        self.run(&preprocess_id, preprocess_cmd(session_id, &document_id, &["p1"]))
            .expect("preprocessing should succeed");
        document_id
    }
}
