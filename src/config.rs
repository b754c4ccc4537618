//! # Module Manifest Schema and Parsing
//!
//! This module defines the data structures that represent a module's
//! `.jsmn-forge.yaml` manifest, and the logic for loading one.
//!
//! ## Key Components
//!
//! - **`ModuleManifest`**: The module name and its resource declarations.
//! - **`ResourceDeclaration`**: One named resource with its ordered OpenAPI
//!   (`http`) and AsyncAPI (`async`) files and activation conditions (`if`).
//! - **`LoadedManifest`**: An accepted manifest together with the location it
//!   was read from, used to resolve its relative file paths.
//!
//! ## Loading
//!
//! A manifest moves through three stages:
//!
//! 1.  **Decode** (`decode`): the text must be well-formed YAML. Failure is a
//!     `ConfigError::Decode`.
//! 2.  **Shape validation** (`validate_shape`): the decoded value must have
//!     the manifest shape. Every violation is collected into a single
//!     `ConfigError::Shape` instead of stopping at the first.
//! 3.  **Accept**: unconditional once both stages pass. Declared files are not
//!     checked for existence here; a missing file only surfaces when the
//!     resource is resolved.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::{ConfigError, ShapeViolation};
use crate::filesystem::SchemaSource;
use crate::path::resolve_against;

/// File names accepted as a module manifest: an optional leading dot, one of
/// the accepted stem casings, then `.yml` or `.yaml`.
pub const MANIFEST_PATTERN: &str = r"^\.?(jsmnForge|JsmnForge|jsmn-forge|JSMN-FORGE)\.ya?ml$";

static MANIFEST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(MANIFEST_PATTERN).expect("manifest pattern compiles"));

/// Whether `file_name` names a module manifest.
pub fn is_manifest_name(file_name: &str) -> bool {
    MANIFEST_RE.is_match(file_name)
}

/// A resource: a named logical schema unit assembled from declared files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDeclaration {
    /// Name used when other modules reference this resource.
    pub name: String,
    /// Version number of the resource.
    pub version: i64,
    /// OpenAPI files, relative to the manifest's directory, in merge order.
    #[serde(default)]
    pub http: Vec<String>,
    /// AsyncAPI files, relative to the manifest's directory, in merge order.
    #[serde(default, rename = "async")]
    pub async_files: Vec<String>,
    /// Conditions under which this resource becomes enabled.
    #[serde(default, rename = "if")]
    pub activation_conditions: Vec<String>,
}

/// The contents of one module manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleManifest {
    /// Module identifier, unique within a workspace.
    pub name: String,
    pub resources: Vec<ResourceDeclaration>,
}

/// An accepted manifest and the file it came from
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedManifest {
    /// Absolute location of the manifest file.
    pub path: PathBuf,
    pub manifest: ModuleManifest,
}

impl LoadedManifest {
    /// Directory that relative resource paths are resolved against.
    pub fn base_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Resolve a path declared in this manifest to an absolute path.
    pub fn resolve_path(&self, declared: &str) -> PathBuf {
        resolve_against(self.base_dir(), declared)
    }
}

/// Decode manifest text into a YAML value, applying merge keys.
pub fn decode(path: &Path, text: &str) -> Result<Value, ConfigError> {
    let mut value: Value = serde_yaml::from_str(text).map_err(|source| ConfigError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    value.apply_merge().map_err(|source| ConfigError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(value)
}

/// Check a decoded value against the manifest shape, collecting every
/// violation.
pub fn validate_shape(path: &Path, value: &Value) -> Result<ModuleManifest, ConfigError> {
    let violations = shape_violations(value);
    if !violations.is_empty() {
        return Err(ConfigError::Shape {
            path: path.to_path_buf(),
            violations,
        });
    }
    serde_yaml::from_value(value.clone()).map_err(|e| ConfigError::Shape {
        path: path.to_path_buf(),
        violations: vec![ShapeViolation::new("", e.to_string())],
    })
}

/// Decode and validate manifest text read from `path`.
pub fn parse(path: &Path, text: &str) -> Result<LoadedManifest, ConfigError> {
    let value = decode(path, text)?;
    let manifest = validate_shape(path, &value)?;
    Ok(LoadedManifest {
        path: path.to_path_buf(),
        manifest,
    })
}

/// Read and parse the manifest at `path`.
pub fn load(source: &dyn SchemaSource, path: &Path) -> Result<LoadedManifest, ConfigError> {
    let text = source
        .read_to_string(path)
        .map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    parse(path, &text)
}

fn shape_violations(value: &Value) -> Vec<ShapeViolation> {
    let mut violations = Vec::new();
    let Some(root) = value.as_mapping() else {
        violations.push(ShapeViolation::new("", "expected a mapping"));
        return violations;
    };

    require_string(root, "name", "name", &mut violations);

    match root.get("resources") {
        None => violations.push(ShapeViolation::new("resources", "required field is missing")),
        Some(Value::Sequence(resources)) => {
            let mut seen = HashSet::new();
            for (idx, resource) in resources.iter().enumerate() {
                let field = format!("resources[{}]", idx);
                let Some(map) = resource.as_mapping() else {
                    violations.push(ShapeViolation::new(field, "expected a mapping"));
                    continue;
                };
                let name_field = format!("{}.name", field);
                if let Some(name) = require_string(map, "name", &name_field, &mut violations) {
                    if !seen.insert(name.to_string()) {
                        violations.push(ShapeViolation::new(
                            name_field,
                            format!("duplicate resource name '{}'", name),
                        ));
                    }
                }
                match map.get("version") {
                    None => violations.push(ShapeViolation::new(
                        format!("{}.version", field),
                        "required field is missing",
                    )),
                    Some(v) if v.as_i64().is_none() => violations.push(ShapeViolation::new(
                        format!("{}.version", field),
                        "expected an integer",
                    )),
                    Some(_) => {}
                }
                for key in ["http", "async", "if"] {
                    optional_string_list(map, key, &format!("{}.{}", field, key), &mut violations);
                }
            }
        }
        Some(_) => violations.push(ShapeViolation::new("resources", "expected a sequence")),
    }

    violations
}

fn require_string<'a>(
    map: &'a Mapping,
    key: &str,
    field: &str,
    violations: &mut Vec<ShapeViolation>,
) -> Option<&'a str> {
    match map.get(key) {
        None => {
            violations.push(ShapeViolation::new(field, "required field is missing"));
            None
        }
        Some(Value::String(s)) => Some(s.as_str()),
        Some(_) => {
            violations.push(ShapeViolation::new(field, "expected a string"));
            None
        }
    }
}

fn optional_string_list(
    map: &Mapping,
    key: &str,
    field: &str,
    violations: &mut Vec<ShapeViolation>,
) {
    match map.get(key) {
        None => {}
        Some(Value::Sequence(items)) => {
            for (idx, item) in items.iter().enumerate() {
                if !item.is_string() {
                    violations.push(ShapeViolation::new(
                        format!("{}[{}]", field, idx),
                        "expected a string",
                    ));
                }
            }
        }
        Some(_) => violations.push(ShapeViolation::new(field, "expected a sequence of strings")),
    }
}
