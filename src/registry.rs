//! # Schema Registry
//!
//! The registry indexes every scanned module: module name to resource name to
//! the ordered, absolute file paths declared for each protocol family
//! (`http` for OpenAPI, `async` for AsyncAPI). It also owns the resolution
//! cache for cross-module references.
//!
//! A registry is an ordinary value: each scan builds a fresh one, so
//! independent scans in one process never share state.
//!
//! ## Ordering
//!
//! Modules keep the order in which they were registered, which is the input
//! order of the scanned directories; resources keep their declaration order.
//! When two directories declare the same module name the later one replaces
//! the earlier one's contents but keeps its position, and the overwrite is
//! logged and recorded.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::cache::{ResolutionCache, ResolvedResource};
use crate::config::{LoadedManifest, ResourceDeclaration};
use crate::discovery::{self, ScanOutcome};
use crate::document::parse_document;
use crate::error::{ConfigError, Error, Result};
use crate::filesystem::{DiskFS, SchemaSource};
use crate::join::{join, Specification};
use crate::plugin::rebase_file_references;
use crate::reference::ModuleRef;

/// A resource's files within one protocol family
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceFiles {
    pub name: String,
    pub paths: Vec<PathBuf>,
}

/// Everything the registry knows about one module
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleIndex {
    pub name: String,
    /// Manifest the module was registered from.
    pub manifest: PathBuf,
    /// Resources declaring at least one OpenAPI file, in declaration order.
    pub http: Vec<ResourceFiles>,
    /// Resources declaring at least one AsyncAPI file, in declaration order.
    pub asyncapi: Vec<ResourceFiles>,
    /// The declarations as written, including resources without files.
    pub declarations: Vec<ResourceDeclaration>,
}

impl ModuleIndex {
    fn from_manifest(loaded: &LoadedManifest) -> Self {
        let mut http = Vec::new();
        let mut asyncapi = Vec::new();
        for resource in &loaded.manifest.resources {
            if !resource.http.is_empty() {
                http.push(ResourceFiles {
                    name: resource.name.clone(),
                    paths: resource.http.iter().map(|p| loaded.resolve_path(p)).collect(),
                });
            }
            if !resource.async_files.is_empty() {
                asyncapi.push(ResourceFiles {
                    name: resource.name.clone(),
                    paths: resource
                        .async_files
                        .iter()
                        .map(|p| loaded.resolve_path(p))
                        .collect(),
                });
            }
        }
        Self {
            name: loaded.manifest.name.clone(),
            manifest: loaded.path.clone(),
            http,
            asyncapi,
            declarations: loaded.manifest.resources.clone(),
        }
    }

    /// OpenAPI files of `resource`, if it declared any.
    pub fn http_paths(&self, resource: &str) -> Option<&[PathBuf]> {
        self.http
            .iter()
            .find(|r| r.name == resource)
            .map(|r| r.paths.as_slice())
    }
}

/// One `(module, resource, paths)` triple yielded by the registry iterators
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchemaEntry<'a> {
    pub module: &'a str,
    pub resource: &'a str,
    pub paths: &'a [PathBuf],
}

impl SchemaEntry<'_> {
    /// The `module:resource` reference naming this entry.
    pub fn reference(&self) -> ModuleRef {
        ModuleRef::new(self.module, self.resource)
    }
}

/// A collection of module resources plus the resolution cache
#[derive(Debug)]
pub struct SchemaRegistry {
    modules: Vec<ModuleIndex>,
    errors: Vec<ConfigError>,
    overwritten: Vec<String>,
    cache: ResolutionCache,
    source: Arc<dyn SchemaSource>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new(Arc::new(DiskFS))
    }
}

impl SchemaRegistry {
    /// Create an empty registry reading files through `source`.
    pub fn new(source: Arc<dyn SchemaSource>) -> Self {
        Self {
            modules: Vec::new(),
            errors: Vec::new(),
            overwritten: Vec::new(),
            cache: ResolutionCache::new(),
            source,
        }
    }

    /// Scan directories on disk for manifests and build a registry.
    pub fn scan_directories<P>(dirs: &[P]) -> Result<Self>
    where
        P: AsRef<Path> + Sync,
    {
        Self::scan_directories_with(Arc::new(DiskFS), dirs)
    }

    /// Scan directories through `source` and build a registry.
    ///
    /// Directories are read in parallel but folded in input order, so a
    /// module name declared twice resolves to the later directory. Manifest
    /// failures are collected in [`errors`](Self::errors); only a directory
    /// that cannot be listed fails the scan.
    pub fn scan_directories_with<P>(source: Arc<dyn SchemaSource>, dirs: &[P]) -> Result<Self>
    where
        P: AsRef<Path> + Sync,
    {
        let outcomes = discovery::scan_directories(source.as_ref(), dirs)?;
        let mut registry = Self::new(source);
        for outcome in outcomes {
            match outcome {
                ScanOutcome::Empty => {}
                ScanOutcome::Loaded(loaded) => registry.add_manifest(&loaded),
                ScanOutcome::Rejected(error) => registry.add_error(error),
            }
        }
        Ok(registry)
    }

    /// Register an accepted manifest.
    pub fn add_manifest(&mut self, loaded: &LoadedManifest) {
        let index = ModuleIndex::from_manifest(loaded);
        info!(
            "Registered module {} ({} resources) from {}",
            index.name,
            index.declarations.len(),
            index.manifest.display()
        );
        match self.modules.iter_mut().find(|m| m.name == index.name) {
            Some(existing) => {
                warn!(
                    "Module {} from {} overwrites the one from {}",
                    index.name,
                    index.manifest.display(),
                    existing.manifest.display()
                );
                self.overwritten.push(index.name.clone());
                *existing = index;
            }
            None => self.modules.push(index),
        }
    }

    /// Record a rejected manifest.
    pub fn add_error(&mut self, error: ConfigError) {
        self.errors.push(error);
    }

    /// Manifest errors collected during the scan, in input order.
    pub fn errors(&self) -> &[ConfigError] {
        &self.errors
    }

    /// Take ownership of the collected manifest errors.
    pub fn take_errors(&mut self) -> Vec<ConfigError> {
        std::mem::take(&mut self.errors)
    }

    /// Names of modules that replaced an earlier module of the same name.
    pub fn overwritten(&self) -> &[String] {
        &self.overwritten
    }

    /// Registered modules, in registration order.
    pub fn modules(&self) -> &[ModuleIndex] {
        &self.modules
    }

    pub fn module(&self, name: &str) -> Option<&ModuleIndex> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub fn source(&self) -> &Arc<dyn SchemaSource> {
        &self.source
    }

    /// Iterate all OpenAPI resources: module registration order, then
    /// resource declaration order.
    ///
    /// Each call starts a fresh traversal. The borrow on `self` keeps the
    /// registry from being mutated while an iteration is alive.
    pub fn schemas(&self) -> impl Iterator<Item = SchemaEntry<'_>> + '_ {
        self.modules.iter().flat_map(|module| {
            module.http.iter().map(move |r| SchemaEntry {
                module: &module.name,
                resource: &r.name,
                paths: &r.paths,
            })
        })
    }

    /// Iterate all AsyncAPI resources, in the same order as [`schemas`](Self::schemas).
    pub fn async_schemas(&self) -> impl Iterator<Item = SchemaEntry<'_>> + '_ {
        self.modules.iter().flat_map(|module| {
            module.asyncapi.iter().map(move |r| SchemaEntry {
                module: &module.name,
                resource: &r.name,
                paths: &r.paths,
            })
        })
    }

    /// OpenAPI files for `reference`, if both module and resource exist.
    pub fn http_paths(&self, reference: &ModuleRef) -> Option<&[PathBuf]> {
        self.module(&reference.module)?
            .http_paths(&reference.resource)
    }

    /// Whether `reference` names a module and OpenAPI resource in the registry.
    pub fn contains(&self, reference: &ModuleRef) -> bool {
        self.http_paths(reference).is_some()
    }

    /// Resolve a `module:resource` reference to its merged document.
    ///
    /// The first call for a key reads every declared file in parallel,
    /// merges them in declaration order and caches the result. Later calls
    /// return the same shared value without touching the filesystem.
    /// Concurrent first calls for one key share a single computation. A
    /// failed resolution caches nothing.
    pub fn resolve(&self, value: &str) -> Result<Arc<ResolvedResource>> {
        let reference = ModuleRef::parse(value).ok_or_else(|| Error::InvalidReference {
            reference: value.to_string(),
        })?;
        let paths = self
            .http_paths(&reference)
            .ok_or_else(|| Error::UnknownReference {
                reference: reference.key(),
            })?;
        let key = reference.key();
        self.cache
            .get_or_resolve(&key, || self.load_and_join(&key, paths))
    }

    fn load_and_join(&self, key: &str, paths: &[PathBuf]) -> Result<ResolvedResource> {
        debug!("Resolving {} from {} file(s)", key, paths.len());
        let specs = paths
            .par_iter()
            .map(|path| {
                let text = self
                    .source
                    .read_to_string(path)
                    .map_err(|source| Error::Io {
                        path: path.clone(),
                        source,
                    })?;
                let mut document = parse_document(&text).map_err(|e| Error::SchemaParse {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
                if let Some(dir) = path.parent() {
                    rebase_file_references(&mut document, dir);
                }
                Ok(Specification::new(path.display().to_string(), document))
            })
            .collect::<Result<Vec<_>>>()?;

        let document = join(&specs).into_result(key)?;
        ResolvedResource::new(document)
    }
}
