use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a duplicate pair was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateDetector {
    #[default]
    Hash,
    Operator,
}

impl DuplicateDetector {
    pub const ALL: [&'static str; 2] = ["hash", "operator"];

    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicateDetector::Hash => "hash",
            DuplicateDetector::Operator => "operator",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "hash" => Some(DuplicateDetector::Hash),
            "operator" => Some(DuplicateDetector::Operator),
            _ => None,
        }
    }
}

/// Order-independent correlation between two duplicate documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateCorrelation {
    /// `left::right` with the two ids sorted
    pub pair_key: String,
    /// `session_id:left:right`, the record key
    pub deterministic_key: String,
    pub source_import_command_id: String,
    pub detector: DuplicateDetector,
}

/// DuplicateRecord - immutable confirmation that two documents are the same
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateRecord {
    pub session_id: String,
    pub document_id: String,
    pub duplicate_of_document_id: String,
    /// Always `duplicate`
    pub state: String,
    pub linked_import_command_id: String,
    pub correlation: DuplicateCorrelation,
    pub confirmed_by_command_id: String,
    pub created_at: DateTime<Utc>,
}

pub const DUPLICATE_STATE: &str = "duplicate";

impl DuplicateRecord {
    pub fn deterministic_key(&self) -> &str {
        &self.correlation.deterministic_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detector_defaults_to_hash() {
        assert_eq!(DuplicateDetector::default(), DuplicateDetector::Hash);
    }

    #[test]
    fn test_detector_parse() {
        assert_eq!(
            DuplicateDetector::parse("operator"),
            Some(DuplicateDetector::Operator)
        );
        assert_eq!(DuplicateDetector::parse("HASH"), None);
    }
}
