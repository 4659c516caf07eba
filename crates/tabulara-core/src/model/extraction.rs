use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub token: String,
    pub confidence: f64,
    pub page: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub line_number: u32,
    pub text: String,
    pub token_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCandidate {
    pub table_id: String,
    pub row_count: u32,
    pub column_count: u32,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedValue {
    pub field: String,
    pub value: String,
    /// Line the value was read from, e.g. `line:2`
    pub source: String,
}

/// Content produced by one extraction run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOutputs {
    pub tokens: Vec<Token>,
    pub lines: Vec<Line>,
    pub table_candidates: Vec<TableCandidate>,
    pub derived_values: Vec<DerivedValue>,
}

/// ExtractionOutputRecord - latest extraction result for a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOutputRecord {
    pub document_id: String,
    pub session_id: String,
    pub extraction_profile: String,
    pub source_state: String,
    pub generated_by_command_id: String,
    pub outputs: ExtractionOutputs,
    pub generated_at: DateTime<Utc>,
}
