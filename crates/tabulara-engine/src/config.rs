//! Dispatcher configuration
//!
//! Loaded from YAML; missing keys take their defaults and unknown keys are
//! rejected.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tabulara_core::apply::{DEFAULT_PLACEHOLDER_PROJECT_ID, DEFAULT_PLACEHOLDER_SCHEMA_ID};
use tabulara_core::logging_facility::Profile;
use tabulara_core::rules::validation::ValidationOptions;

use crate::errors::{config_field, config_invalid, io_error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatcherConfig {
    /// Project id given to sessions created implicitly by ImportDocument
    pub placeholder_project_id: String,
    /// Schema id given to sessions created implicitly by ImportDocument
    pub placeholder_schema_id: String,
    /// Accept `force_fail_stage` in payloads
    pub failure_injection: bool,
    /// Check store invariants before every commit
    pub check_invariants: bool,
    pub log_profile: Profile,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            placeholder_project_id: DEFAULT_PLACEHOLDER_PROJECT_ID.to_string(),
            placeholder_schema_id: DEFAULT_PLACEHOLDER_SCHEMA_ID.to_string(),
            failure_injection: true,
            check_invariants: true,
            log_profile: Profile::default(),
        }
    }
}

impl DispatcherConfig {
    /// Parse a config from YAML text
    ///
    /// An empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for malformed YAML, unknown keys or empty
    /// placeholder ids.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_yaml::from_str(content).map_err(|e| config_invalid("yaml", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML config file
    ///
    /// # Errors
    ///
    /// Returns `Io` when the file cannot be read, otherwise as
    /// [`DispatcherConfig::from_yaml_str`].
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| io_error("read_config", e))?;
        Self::from_yaml_str(&content)
            .map_err(|e| e.with_entity_id(path.display().to_string()))
    }

    fn validate(&self) -> Result<()> {
        if self.placeholder_project_id.trim().is_empty() {
            return Err(config_field("placeholder_project_id", "must_be_non_empty_string"));
        }
        if self.placeholder_schema_id.trim().is_empty() {
            return Err(config_field("placeholder_schema_id", "must_be_non_empty_string"));
        }
        Ok(())
    }

    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            failure_injection: self.failure_injection,
        }
    }
}
