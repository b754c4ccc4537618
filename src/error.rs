//! # Error Handling
//!
//! This module defines the centralized error handling for `jsmn-forge`. It
//! uses `thiserror` for two enums:
//!
//! - **`ConfigError`**: Failures while loading one module manifest. These are
//!   accumulated on the registry during a scan and never abort sibling
//!   directories.
//! - **`Error`**: Every other failure mode of the library: unknown or
//!   malformed cross-module references, merge conflicts, pointer cycles,
//!   I/O and schema decoding problems.
//!
//! **`Result<T>`** is an alias for `std::result::Result<T, Error>`.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::join::JoinConflict;

/// A single structural problem found while validating a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeViolation {
    /// Dotted location of the offending field, e.g. `resources[1].version`.
    /// Empty for the document root.
    pub field: String,
    pub message: String,
}

impl ShapeViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ShapeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "<root>: {}", self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

fn join_lines<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| format!("\n  - {}", item))
        .collect::<String>()
}

/// Errors produced while loading a module manifest.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The manifest file could not be read.
    #[error("Failed to read manifest {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not well-formed YAML.
    #[error("Manifest decode error in {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The manifest decoded but does not match the expected shape. Every
    /// violation found is listed.
    #[error("Manifest shape error in {}:{}", path.display(), join_lines(violations))]
    Shape {
        path: PathBuf,
        violations: Vec<ShapeViolation>,
    },
}

impl ConfigError {
    /// The manifest file this error originated from.
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Io { path, .. }
            | ConfigError::Decode { path, .. }
            | ConfigError::Shape { path, .. } => path,
        }
    }
}

/// Main error type for jsmn-forge operations
#[derive(Error, Debug)]
pub enum Error {
    /// A single manifest failed to load.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// One or more manifests failed to load during a workspace scan.
    #[error("{} manifest error(s) in workspace:{}", errors.len(), join_lines(errors))]
    Workspace { errors: Vec<ConfigError> },

    /// A well-formed `module:resource` reference names nothing in the registry.
    #[error("Unknown reference: {reference}")]
    UnknownReference { reference: String },

    /// A string that does not follow `module:resource` syntax was used as one.
    #[error("Invalid reference '{reference}': expected module:resource")]
    InvalidReference { reference: String },

    /// Two or more documents declare the same namespace key with differing
    /// content.
    #[error("Merge conflict while joining {context}:{}", join_lines(conflicts))]
    MergeConflict {
        context: String,
        conflicts: Vec<JoinConflict>,
    },

    /// A same-document pointer leads back to itself.
    #[error("Cycle detected in pointer chain: {cycle}")]
    CycleDetected { cycle: String },

    /// An I/O error on a specific path.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A schema file could not be decoded into a document tree.
    #[error("Failed to parse schema {}: {message}", path.display())]
    SchemaParse { path: PathBuf, message: String },

    /// A loader plugin accepted a reference but could not produce a document.
    #[error("Loader plugin failed for '{reference}': {message}")]
    Plugin { reference: String, message: String },

    /// A mutex guarding shared state was poisoned by a panicking thread.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// A YAML serialization error, wrapped from `serde_yaml::Error`.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON serialization error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_error_lists_every_violation() {
        let error = ConfigError::Shape {
            path: PathBuf::from("/ws/sdk/.jsmn-forge.yaml"),
            violations: vec![
                ShapeViolation::new("name", "required field is missing"),
                ShapeViolation::new("resources[0].version", "expected an integer"),
            ],
        };
        let display = format!("{}", error);
        assert!(display.contains("Manifest shape error"));
        assert!(display.contains("/ws/sdk/.jsmn-forge.yaml"));
        assert!(display.contains("name: required field is missing"));
        assert!(display.contains("resources[0].version: expected an integer"));
    }

    #[test]
    fn test_root_violation_display() {
        let violation = ShapeViolation::new("", "expected a mapping");
        assert_eq!(violation.to_string(), "<root>: expected a mapping");
    }

    #[test]
    fn test_config_error_path() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("a: [unclosed").unwrap_err();
        let error = ConfigError::Decode {
            path: PathBuf::from("/ws/net/jsmn-forge.yml"),
            source: yaml_error,
        };
        assert_eq!(error.path(), Path::new("/ws/net/jsmn-forge.yml"));
        assert!(error.to_string().contains("Manifest decode error"));
    }

    #[test]
    fn test_workspace_error_counts_entries() {
        let error = Error::Workspace {
            errors: vec![
                ConfigError::Shape {
                    path: PathBuf::from("a/.jsmn-forge.yaml"),
                    violations: vec![ShapeViolation::new("name", "expected a string")],
                },
                ConfigError::Shape {
                    path: PathBuf::from("b/.jsmn-forge.yaml"),
                    violations: vec![ShapeViolation::new("resources", "expected a sequence")],
                },
            ],
        };
        let display = error.to_string();
        assert!(display.starts_with("2 manifest error(s)"));
        assert!(display.contains("a/.jsmn-forge.yaml"));
        assert!(display.contains("b/.jsmn-forge.yaml"));
    }

    #[test]
    fn test_error_display_unknown_reference() {
        let error = Error::UnknownReference {
            reference: "sdk:missing".to_string(),
        };
        assert_eq!(error.to_string(), "Unknown reference: sdk:missing");
    }

    #[test]
    fn test_error_display_cycle_detected() {
        let error = Error::CycleDetected {
            cycle: "#/a -> #/b -> #/a".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Cycle detected"));
        assert!(display.contains("#/a -> #/b -> #/a"));
    }

    #[test]
    fn test_error_display_merge_conflict() {
        let error = Error::MergeConflict {
            context: "sdk:common".to_string(),
            conflicts: vec![JoinConflict {
                namespace: "paths".to_string(),
                key: "/ping".to_string(),
                sources: vec!["a.yaml".to_string(), "b.yaml".to_string()],
            }],
        };
        let display = error.to_string();
        assert!(display.contains("sdk:common"));
        assert!(display.contains("paths '/ping'"));
        assert!(display.contains("a.yaml"));
        assert!(display.contains("b.yaml"));
    }

    #[test]
    fn test_error_from_io_with_path() {
        let error = Error::Io {
            path: PathBuf::from("/missing.yaml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "File not found"),
        };
        let display = format!("{}", error);
        assert!(display.contains("I/O error"));
        assert!(display.contains("/missing.yaml"));
        assert!(display.contains("File not found"));
    }

    #[test]
    fn test_error_from_yaml_error() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: [unclosed").unwrap_err();
        let error: Error = yaml_error.into();
        assert!(error.to_string().contains("YAML error"));
    }
}
