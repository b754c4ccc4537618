//! # Ls Command Implementation
//!
//! Lists every module found in the given directories with its resources:
//! version, number of OpenAPI and AsyncAPI files, and activation conditions.
//! Rejected manifests are listed afterwards and make the command fail.
//!
//! This command is read-only and never opens a schema file.

use anyhow::{bail, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;

use jsmn_forge::registry::{ModuleIndex, SchemaRegistry};

/// List discovered modules and resources
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Workspace directories to scan for `.jsmn-forge.yaml` manifests.
    #[arg(value_name = "DIR", required = true)]
    pub dirs: Vec<PathBuf>,

    /// Print file paths under each resource.
    #[arg(short, long)]
    pub long: bool,
}

/// Execute the `ls` command.
pub fn execute(args: LsArgs) -> Result<()> {
    let registry = SchemaRegistry::scan_directories(&args.dirs)?;

    if registry.modules().is_empty() && registry.errors().is_empty() {
        println!("No modules found.");
        return Ok(());
    }

    for module in registry.modules() {
        print_module(module, args.long);
    }

    let errors = registry.errors();
    if !errors.is_empty() {
        eprintln!();
        for error in errors {
            eprintln!("{} {}", style("✘").red(), error);
        }
        bail!("{} manifest error(s)", errors.len());
    }
    Ok(())
}

fn print_module(module: &ModuleIndex, long: bool) {
    println!(
        "{} {}",
        style(&module.name).bold(),
        style(module.manifest.display()).dim()
    );
    for resource in &module.declarations {
        let conditions = if resource.activation_conditions.is_empty() {
            String::new()
        } else {
            format!(" if [{}]", resource.activation_conditions.join(", "))
        };
        println!(
            "  {}:{} v{} http={} async={}{}",
            module.name,
            resource.name,
            resource.version,
            resource.http.len(),
            resource.async_files.len(),
            conditions
        );
        if long {
            let files = module
                .http
                .iter()
                .chain(module.asyncapi.iter())
                .filter(|r| r.name == resource.name)
                .flat_map(|r| r.paths.iter());
            for path in files {
                println!("    {}", path.display());
            }
        }
    }
}
