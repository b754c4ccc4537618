//! # Parse Command Implementation
//!
//! This module implements the `parse` subcommand: scan the given workspace
//! directories for module manifests, bundle and inline every declared
//! OpenAPI resource, join them, and emit the result.
//!
//! Nothing is written when any manifest is rejected or when resources
//! conflict; the full list of problems is reported instead.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use console::style;
use std::path::PathBuf;

use jsmn_forge::document::{to_json, to_yaml};
use jsmn_forge::pipeline;
use jsmn_forge::registry::SchemaRegistry;

/// Output serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

/// Discover and bundle workspace OpenAPI specs
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Workspace directories to scan for `.jsmn-forge.yaml` manifests.
    #[arg(value_name = "DIR", required = true)]
    pub dirs: Vec<PathBuf>,

    /// Write output to this file instead of stdout.
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value = "yaml")]
    pub format: OutputFormat,
}

/// Execute the `parse` command.
pub fn execute(args: ParseArgs) -> Result<()> {
    let registry = SchemaRegistry::scan_directories(&args.dirs)?;
    let document = pipeline::aggregate(registry)?;

    let output = match args.format {
        OutputFormat::Yaml => to_yaml(&document)?,
        OutputFormat::Json => to_json(&document)? + "\n",
    };

    match &args.out {
        Some(path) => {
            std::fs::write(path, output)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("{} Wrote {}", style("✔").green(), path.display());
        }
        None => print!("{}", output),
    }
    Ok(())
}
