//! Orchestration of the complete aggregation
//!
//! 1. The registry has already been built by a workspace scan.
//! 2. Any manifest errors collected by the scan abort the run.
//! 3. Every OpenAPI resource is bundled (cross-module and file references
//!    spliced in) and inlined (same-document pointers resolved).
//! 4. The resolved documents are joined into one; a namespace conflict
//!    aborts the run.
//!
//! Resources are bundled one after another: each bundle may resolve
//! cross-module references, and the cache locks a key for the duration of
//! its resolution.

use log::info;
use serde_json::{json, Value as JsonValue};

use crate::bundle::Bundler;
use crate::error::{Error, Result};
use crate::inline::inline;
use crate::join::{join, Specification};
use crate::plugin::{FilePlugin, LoaderPlugin, RegistryPlugin};
use crate::registry::{SchemaEntry, SchemaRegistry};

/// Bundle and inline one resource into a self-contained document.
pub fn bundle_resource(registry: &SchemaRegistry, entry: &SchemaEntry<'_>) -> Result<JsonValue> {
    let reference = entry.reference();
    let registry_plugin = RegistryPlugin::new(registry);
    let file_plugin = FilePlugin::new(registry.source().clone());
    let plugins: Vec<&dyn LoaderPlugin> = vec![&registry_plugin, &file_plugin];

    let base = entry.paths.first().and_then(|p| p.parent());
    let bundled = Bundler::new(plugins).bundle(json!({ "$ref": reference.key() }), base)?;
    inline(&bundled)
}

/// Produce the single merged document for a scanned workspace.
///
/// Fails with [`Error::Workspace`] carrying every manifest error if the scan
/// rejected any manifest, before any schema is read.
pub fn aggregate(mut registry: SchemaRegistry) -> Result<JsonValue> {
    let errors = registry.take_errors();
    if !errors.is_empty() {
        return Err(Error::Workspace { errors });
    }
    join_resources(&registry)
}

/// Bundle, inline and join every OpenAPI resource in registry order.
pub fn join_resources(registry: &SchemaRegistry) -> Result<JsonValue> {
    let mut specs = Vec::new();
    for entry in registry.schemas() {
        info!("Bundling {}", entry.reference());
        let document = bundle_resource(registry, &entry)?;
        specs.push(Specification::new(entry.reference().key(), document));
    }

    join(&specs).into_result("workspace")
}
