//! Shared test utilities for integration and E2E tests.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = WorkspaceFixture::new().with_sensor_workspace();
//! let mut cmd = fixture.command();
//! cmd.arg("ls").args(fixture.module_dirs()).assert().success();
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::schemas;
    pub use super::WorkspaceFixture;
}

/// Schema documents shared by the fixtures.
#[allow(dead_code)]
pub mod schemas {
    /// `sdk:common`, the shared types.
    pub const SDK_COMMON: &str = r#"
openapi: 3.1.0
info: {title: sdk, version: 1.0.0}
tags:
  - name: sdk
components:
  schemas:
    Status:
      type: object
      properties:
        code: {type: integer}
        detail: {$ref: '#/components/schemas/Detail'}
    Detail:
      type: string
"#;

    /// `network:ethernet`, referencing `sdk:common`.
    pub const NETWORK_ETHERNET: &str = r#"
openapi: 3.1.0
info: {title: network, version: 1.0.0}
tags:
  - name: network
paths:
  /network/ethernet:
    get:
      operationId: getEthernet
      responses:
        '200':
          description: link status
          content:
            application/json:
              schema:
                $ref: 'sdk:common#/components/schemas/Status'
"#;

    /// `sensors:temperature`, referencing `sdk:common`.
    pub const SENSORS_TEMPERATURE: &str = r#"
openapi: 3.1.0
info: {title: sensors, version: 1.0.0}
paths:
  /sensors/temperature:
    get:
      operationId: getTemperature
      responses:
        '200':
          description: reading
          content:
            application/json:
              schema:
                type: object
                properties:
                  celsius: {type: number}
                  status:
                    $ref: 'sdk:common#/components/schemas/Status'
"#;
}

/// A temporary workspace holding one directory per module.
pub struct WorkspaceFixture {
    temp_dir: assert_fs::TempDir,
    module_dirs: Vec<PathBuf>,
}

#[allow(dead_code)]
impl WorkspaceFixture {
    /// Create a fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
            module_dirs: Vec::new(),
        }
    }

    /// Add a module directory whose manifest declares one resource backed by
    /// a single `openapi.yaml`.
    pub fn with_module(self, dir: &str, module: &str, resource: &str, schema: &str) -> Self {
        let manifest = format!(
            "name: {}\nresources:\n  - name: {}\n    version: 1\n    http: [openapi.yaml]\n",
            module, resource
        );
        self.with_manifest(dir, &manifest)
            .with_file(&format!("{}/openapi.yaml", dir), schema)
    }

    /// Add a module directory with the given manifest text.
    pub fn with_manifest(mut self, dir: &str, manifest: &str) -> Self {
        self.temp_dir
            .child(dir)
            .child(".jsmn-forge.yaml")
            .write_str(manifest)
            .expect("Failed to write manifest");
        self.module_dirs.push(self.temp_dir.path().join(dir));
        self
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// The `sdk`, `network` and `sensors` modules.
    pub fn with_sensor_workspace(self) -> Self {
        self.with_module("sdk", "sdk", "common", schemas::SDK_COMMON)
            .with_module("network", "network", "ethernet", schemas::NETWORK_ETHERNET)
            .with_module(
                "sensors",
                "sensors",
                "temperature",
                schemas::SENSORS_TEMPERATURE,
            )
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Module directories in the order they were added.
    pub fn module_dirs(&self) -> &[PathBuf] {
        &self.module_dirs
    }

    /// Create a command configured to run in this fixture's directory.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("jsmn-forge");
        cmd.current_dir(self.path());
        cmd
    }
}

impl Default for WorkspaceFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_with_module() {
        let fixture = WorkspaceFixture::new().with_module("a", "a", "one", "paths: {}\n");
        assert!(fixture.path().join("a/.jsmn-forge.yaml").exists());
        assert!(fixture.path().join("a/openapi.yaml").exists());
        assert_eq!(fixture.module_dirs().len(), 1);
    }

    #[test]
    fn test_schemas_are_valid_yaml() {
        for schema in [
            schemas::SDK_COMMON,
            schemas::NETWORK_ETHERNET,
            schemas::SENSORS_TEMPERATURE,
        ] {
            serde_yaml::from_str::<serde_yaml::Value>(schema).expect("Schema should be valid YAML");
        }
    }
}
