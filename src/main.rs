//! # jsmn-forge CLI
//!
//! This is the binary entry point for the `jsmn-forge` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Installing the logger.
//! - Executing the appropriate command and turning failures into a non-zero
//!   exit status.
//!
//! The core logic lives in the `jsmn_forge` library crate; the binary is a
//! thin wrapper around it.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
