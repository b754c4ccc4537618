//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// jsmn-forge - Aggregate workspace OpenAPI schemas into one document
#[derive(Parser, Debug)]
#[command(name = "jsmn-forge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Set log level (error, warn, info, debug, trace). RUST_LOG overrides it.
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Discover and bundle workspace OpenAPI specs into one document
    Parse(commands::parse::ParseArgs),

    /// List discovered modules and resources
    Ls(commands::ls::LsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        match self.command {
            Commands::Parse(args) => commands::parse::execute(args),
            Commands::Ls(args) => commands::ls::execute(args),
        }
    }
}

fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A second initialization (e.g. from tests) is harmless.
    let _ = env_logger::Builder::from_env(env)
        .format_target(false)
        .try_init();
}
