//! # jsmn-forge Library
//!
//! This library gathers OpenAPI schema fragments declared by the modules of a
//! workspace into one consolidated, fully dereferenced document. It backs the
//! `jsmn-forge` command-line tool but can be embedded on its own.
//!
//! ## Quick Example
//!
//! ```
//! use std::sync::Arc;
//! use jsmn_forge::filesystem::MemoryFS;
//! use jsmn_forge::registry::SchemaRegistry;
//!
//! let fs = MemoryFS::new();
//! fs.add_file_string(
//!     "/ws/sdk/.jsmn-forge.yaml",
//!     "name: sdk\nresources:\n  - name: common\n    version: 1\n    http: [common.yaml]\n",
//! );
//! fs.add_file_string("/ws/sdk/common.yaml", "paths:\n  /ping: {get: {operationId: ping}}\n");
//!
//! let registry = SchemaRegistry::scan_directories_with(Arc::new(fs), &["/ws/sdk"]).unwrap();
//! let resolved = registry.resolve("sdk:common").unwrap();
//! assert_eq!(resolved.data["paths"]["/ping"]["get"]["operationId"], "ping");
//! ```
//!
//! ## Core Concepts
//!
//! - **Manifests (`config`)**: each module declares its resources in a
//!   `.jsmn-forge.yaml` file; paths are relative to that file.
//! - **Registry (`registry`, `discovery`, `cache`)**: scanning directories
//!   builds an index of module → resource → files, and resolves
//!   `module:resource` references into merged documents, once per key.
//! - **Bundling (`plugin`, `bundle`)**: external references are spliced into
//!   a document by loader plugins; the registry is one such plugin.
//! - **Inlining (`inline`)**: same-document pointers are replaced by their
//!   targets and the bundler's bookkeeping is removed.
//! - **Joining (`join`)**: resolved documents are merged, reporting
//!   conflicting namespace entries.
//!
//! ## Execution Flow
//!
//! `pipeline::aggregate` runs the whole thing:
//!
//! 1.  **Scan**: build a `SchemaRegistry` from the input directories.
//! 2.  **Check**: stop on any manifest error.
//! 3.  **Bundle**: splice cross-module and file references per resource.
//! 4.  **Inline**: resolve remaining same-document pointers.
//! 5.  **Join**: merge all resources into the final document.

pub mod bundle;
pub mod cache;
pub mod config;
pub mod discovery;
pub mod document;
pub mod error;
pub mod filesystem;
pub mod inline;
pub mod join;
pub mod path;
pub mod pipeline;
pub mod plugin;
pub mod reference;
pub mod registry;

#[cfg(test)]
mod path_proptest;
