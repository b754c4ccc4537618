//! Loader plugins: the `validate` / `exec` pair the bundler drives
//!
//! The bundler knows nothing about where referenced documents come from. For
//! every external `$ref` it asks each plugin in turn whether it can load the
//! URI (`validate`) and lets the first one that says yes produce the document
//! (`exec`). New reference schemes are new implementations of
//! [`LoaderPlugin`]; the walker never changes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::document::parse_document;
use crate::error::{Error, Result};
use crate::filesystem::SchemaSource;
use crate::path::resolve_against;
use crate::reference::{split_reference, ModuleRef};
use crate::registry::SchemaRegistry;

/// A document produced by a loader plugin.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub data: JsonValue,
    /// Serialized form of `data`.
    pub raw: String,
    /// Directory that relative references inside `data` resolve against.
    pub origin: Option<PathBuf>,
}

/// Capability probe plus loader for one reference scheme.
pub trait LoaderPlugin: Send + Sync {
    /// Short name used in log messages.
    fn name(&self) -> &str;

    /// Whether this plugin can load `uri`. `base` is the directory of the
    /// document containing the reference, when known.
    fn validate(&self, uri: &str, base: Option<&Path>) -> bool;

    /// Load `uri`. Only called after `validate` returned true for the same
    /// arguments, but implementations re-check rather than rely on it.
    fn exec(&self, uri: &str, base: Option<&Path>) -> Result<Loaded>;

    /// Key identifying the loaded document, so one document referenced via
    /// different spellings is loaded once. Defaults to the URI itself.
    fn canonical(&self, uri: &str, _base: Option<&Path>) -> String {
        uri.to_string()
    }
}

/// Resolves `module:resource` references through a [`SchemaRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct RegistryPlugin<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> RegistryPlugin<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }
}

impl LoaderPlugin for RegistryPlugin<'_> {
    fn name(&self) -> &str {
        "registry"
    }

    /// True iff `uri` is `module:resource` syntax and both exist in the
    /// registry's OpenAPI index.
    fn validate(&self, uri: &str, _base: Option<&Path>) -> bool {
        ModuleRef::parse(uri)
            .map(|reference| self.registry.contains(&reference))
            .unwrap_or(false)
    }

    fn exec(&self, uri: &str, base: Option<&Path>) -> Result<Loaded> {
        let reference = ModuleRef::parse(uri).ok_or_else(|| Error::InvalidReference {
            reference: uri.to_string(),
        })?;
        if !self.validate(uri, base) {
            return Err(Error::UnknownReference {
                reference: reference.key(),
            });
        }
        let resolved = self.registry.resolve(uri)?;
        let origin = self
            .registry
            .http_paths(&reference)
            .and_then(|paths| paths.first())
            .and_then(|first| first.parent())
            .map(Path::to_path_buf);
        Ok(Loaded {
            data: resolved.data.clone(),
            raw: resolved.raw.clone(),
            origin,
        })
    }
}

const DOCUMENT_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];
const REF_KEY: &str = "$ref";

/// Whether `uri` names a local schema file by extension.
fn is_file_reference(uri: &str) -> bool {
    if uri.is_empty() || uri.contains("://") {
        return false;
    }
    Path::new(uri)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| DOCUMENT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Rewrite relative file `$ref`s in `node` to absolute paths under `base_dir`.
///
/// Files merged into one resource lose their individual locations, so each
/// is rebased against its own directory before the merge. Fragments are
/// kept; every other reference is left alone.
pub fn rebase_file_references(node: &mut JsonValue, base_dir: &Path) {
    match node {
        JsonValue::Array(items) => {
            for item in items {
                rebase_file_references(item, base_dir);
            }
        }
        JsonValue::Object(map) => {
            let rebased = match map.get(REF_KEY) {
                Some(JsonValue::String(reference)) => rebase_reference(reference, base_dir),
                _ => None,
            };
            if let Some(reference) = rebased {
                map.insert(REF_KEY.to_string(), JsonValue::String(reference));
            }
            for (key, value) in map.iter_mut() {
                if key != REF_KEY {
                    rebase_file_references(value, base_dir);
                }
            }
        }
        _ => {}
    }
}

fn rebase_reference(reference: &str, base_dir: &Path) -> Option<String> {
    let (uri, fragment) = split_reference(reference);
    if !is_file_reference(uri) || Path::new(uri).is_absolute() {
        return None;
    }
    let path = resolve_against(base_dir, uri).display().to_string();
    Some(match fragment {
        Some(fragment) => format!("{}#{}", path, fragment),
        None => path,
    })
}

/// Loads relative or absolute schema file references.
#[derive(Debug, Clone)]
pub struct FilePlugin {
    source: Arc<dyn SchemaSource>,
}

impl FilePlugin {
    pub fn new(source: Arc<dyn SchemaSource>) -> Self {
        Self { source }
    }

    fn locate(&self, uri: &str, base: Option<&Path>) -> PathBuf {
        match base {
            Some(base) => resolve_against(base, uri),
            None => resolve_against(Path::new(""), uri),
        }
    }
}

impl LoaderPlugin for FilePlugin {
    fn name(&self) -> &str {
        "file"
    }

    fn validate(&self, uri: &str, _base: Option<&Path>) -> bool {
        is_file_reference(uri)
    }

    fn exec(&self, uri: &str, base: Option<&Path>) -> Result<Loaded> {
        if !self.validate(uri, base) {
            return Err(Error::Plugin {
                reference: uri.to_string(),
                message: "not a schema file reference".to_string(),
            });
        }
        let path = self.locate(uri, base);
        let raw = self
            .source
            .read_to_string(&path)
            .map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })?;
        let data = parse_document(&raw).map_err(|e| Error::SchemaParse {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(Loaded {
            data,
            raw,
            origin: path.parent().map(Path::to_path_buf),
        })
    }

    fn canonical(&self, uri: &str, base: Option<&Path>) -> String {
        self.locate(uri, base).display().to_string()
    }
}
