//! Validate command
//!
//! Usage: tabulara validate --input <FILE> [--config <YAML>]
//!
//! Runs envelope and payload validation only. Idempotency and preconditions
//! depend on store state and are not checked.

use std::path::PathBuf;

use clap::Args;
use serde_json::json;
use tabulara_core::errors::ExError;
use tabulara_core::rules::validation::validate_command;

use super::dispatch::load_config;
use super::input::read_input;

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// JSON array or JSON-lines file of command envelopes
    #[arg(long)]
    pub input: PathBuf,

    /// Dispatcher config YAML
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Execute validate
pub fn execute(args: ValidateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args.config.as_deref())?;
    let options = config.validation_options();

    for (index, item) in read_input(&args.input)?.iter().enumerate() {
        let verdict = match item
            .body()
            .and_then(|body| validate_command(&body, options).map_err(ExError::from))
        {
            Ok((envelope, command)) => json!({
                "index": index,
                "valid": true,
                "command_id": envelope.command_id.as_str(),
                "type": command.command_type().as_str(),
            }),
            Err(err) => json!({
                "index": index,
                "valid": false,
                "error": err.to_error_object(),
            }),
        };
        println!("{}", serde_json::to_string(&verdict)?);
    }

    Ok(())
}
