//! Envelope input files
//!
//! Accepts either one JSON array of envelopes or JSON lines. Lines are kept
//! raw so a malformed line is reported on its own instead of failing the
//! whole file.

use std::path::Path;

use serde_json::Value;
use tabulara_core::errors::{ExError, TabularaError};

#[derive(Debug, Clone)]
pub enum InputItem {
    Parsed(Value),
    Line(String),
}

impl InputItem {
    /// Parsed body, or the `CMD_INVALID_JSON` error for a malformed line
    pub fn body(&self) -> Result<Value, ExError> {
        match self {
            InputItem::Parsed(value) => Ok(value.clone()),
            InputItem::Line(line) => serde_json::from_str(line).map_err(|e| {
                ExError::from(TabularaError::InvalidJson {
                    message: e.to_string(),
                })
            }),
        }
    }
}

/// Read the envelopes of an input file in file order
pub fn read_input(path: &Path) -> Result<Vec<InputItem>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    if content.trim_start().starts_with('[') {
        let items: Vec<Value> = serde_json::from_str(&content)
            .map_err(|e| format!("Invalid JSON array in {}: {}", path.display(), e))?;
        return Ok(items.into_iter().map(InputItem::Parsed).collect());
    }

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| InputItem::Line(line.to_string()))
        .collect())
}
