//! Tabulara CLI
//!
//! Replays command envelopes from a file against an in-memory dispatcher

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "tabulara")]
#[command(about = "Tabulara - document intake command core", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Dispatch every envelope in a file, in order
    Dispatch(commands::dispatch::DispatchArgs),
    /// Validate envelopes and payloads without dispatching
    Validate(commands::validate::ValidateArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Dispatch(args) => commands::dispatch::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
