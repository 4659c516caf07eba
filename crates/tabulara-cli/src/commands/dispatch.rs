//! Dispatch command
//!
//! Usage: tabulara dispatch --input <FILE> [--config <YAML>] [--log-profile dev|prod]

use std::path::{Path, PathBuf};

use clap::Args;
use serde_json::json;
use tabulara_core::logging_facility::{self, Profile};
use tabulara_engine::{Dispatcher, DispatcherConfig};

use super::input::{read_input, InputItem};

#[derive(Debug, Args)]
pub struct DispatchArgs {
    /// JSON array or JSON-lines file of command envelopes
    #[arg(long)]
    pub input: PathBuf,

    /// Dispatcher config YAML
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Overrides the config's log profile
    #[arg(long, value_parser = parse_profile)]
    pub log_profile: Option<Profile>,
}

pub(crate) fn parse_profile(value: &str) -> Result<Profile, String> {
    Profile::parse(value).ok_or_else(|| format!("unknown log profile: {}", value))
}

pub(crate) fn load_config(
    path: Option<&Path>,
) -> Result<DispatcherConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(DispatcherConfig::from_file(path)?),
        None => Ok(DispatcherConfig::default()),
    }
}

/// Execute dispatch
pub fn execute(args: DispatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(profile) = args.log_profile {
        config.log_profile = profile;
    }
    logging_facility::init(config.log_profile);

    let items = read_input(&args.input)?;
    let mut dispatcher = Dispatcher::new(config);

    for item in &items {
        let result = match item {
            InputItem::Parsed(body) => dispatcher.dispatch(body),
            InputItem::Line(line) => dispatcher.dispatch_raw(line),
        };
        let line = json!({ "status": result.status_code(), "body": result.body });
        println!("{}", serde_json::to_string(&line)?);
    }

    Ok(())
}
