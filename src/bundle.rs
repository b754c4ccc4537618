//! Bundling external references into a single document
//!
//! The bundler walks a document and, for every `$ref` pointing outside it,
//! asks the loader plugins for the target. Each distinct target is loaded
//! once and stored under the root's `x-ext` map; `x-ext-urls` records which
//! URI each entry came from. The `$ref` is rewritten to a same-document
//! pointer into `x-ext`, keeping any fragment:
//!
//! ```text
//! $ref: sdk:common#/components/schemas/Status
//! $ref: '#/x-ext/sdk:common/components/schemas/Status'
//! ```
//!
//! Loaded documents are walked as well. Their own same-document pointers are
//! rebased under their `x-ext` entry, and their relative file references
//! resolve against the directory they were loaded from. References no
//! plugin accepts are left as they are. Nothing is ever pruned.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use log::debug;
use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};
use crate::path::encode_ext_id;
use crate::plugin::LoaderPlugin;
use crate::reference::split_reference;

/// Root key holding externally loaded documents.
pub const EXT_KEY: &str = "x-ext";
/// Root key mapping each `x-ext` entry to the URI it was loaded from.
pub const EXT_URLS_KEY: &str = "x-ext-urls";

const REF_KEY: &str = "$ref";

#[derive(Default)]
struct BundleState {
    ext: Map<String, JsonValue>,
    urls: Map<String, JsonValue>,
    ids: HashMap<String, String>,
    pending: VecDeque<(String, Option<PathBuf>)>,
}

/// Splices external references into a document using an ordered plugin list.
pub struct Bundler<'p> {
    plugins: Vec<&'p dyn LoaderPlugin>,
}

impl<'p> Bundler<'p> {
    /// Plugins are consulted in order; the first whose `validate` accepts a
    /// reference loads it.
    pub fn new(plugins: Vec<&'p dyn LoaderPlugin>) -> Self {
        Self { plugins }
    }

    /// Bundle `root`, resolving relative references against `base`.
    ///
    /// `root` must be a mapping whenever anything external gets loaded, since
    /// the loaded documents are attached to it.
    pub fn bundle(&self, mut root: JsonValue, base: Option<&Path>) -> Result<JsonValue> {
        let mut state = BundleState::default();
        self.rewrite(&mut root, base, None, &mut state)?;

        while let Some((id, origin)) = state.pending.pop_front() {
            let Some(mut document) = state.ext.get_mut(&id).map(JsonValue::take) else {
                continue;
            };
            self.rewrite(&mut document, origin.as_deref(), Some(&id), &mut state)?;
            state.ext.insert(id, document);
        }

        if state.ext.is_empty() {
            return Ok(root);
        }
        match &mut root {
            JsonValue::Object(map) => {
                map.insert(EXT_KEY.to_string(), JsonValue::Object(state.ext));
                map.insert(EXT_URLS_KEY.to_string(), JsonValue::Object(state.urls));
                Ok(root)
            }
            _ => Err(Error::Plugin {
                reference: "<root>".to_string(),
                message: "cannot attach external documents to a non-mapping root".to_string(),
            }),
        }
    }

    fn rewrite(
        &self,
        node: &mut JsonValue,
        base: Option<&Path>,
        owner: Option<&str>,
        state: &mut BundleState,
    ) -> Result<()> {
        match node {
            JsonValue::Array(items) => {
                for item in items {
                    self.rewrite(item, base, owner, state)?;
                }
            }
            JsonValue::Object(map) => {
                let replacement = match map.get(REF_KEY) {
                    Some(JsonValue::String(reference)) => {
                        self.rewrite_reference(reference, base, owner, state)?
                    }
                    _ => None,
                };
                if let Some(new_ref) = replacement {
                    map.insert(REF_KEY.to_string(), JsonValue::String(new_ref));
                }
                for (key, value) in map.iter_mut() {
                    if key != REF_KEY {
                        self.rewrite(value, base, owner, state)?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// The rewritten form of `reference`, or `None` to leave it alone.
    fn rewrite_reference(
        &self,
        reference: &str,
        base: Option<&Path>,
        owner: Option<&str>,
        state: &mut BundleState,
    ) -> Result<Option<String>> {
        if let Some(fragment) = reference.strip_prefix('#') {
            if !fragment.is_empty() && !fragment.starts_with('/') {
                debug!("Leaving {}: fragment is not a JSON pointer", reference);
                return Ok(None);
            }
            return Ok(owner.map(|id| format!("#/{}/{}{}", EXT_KEY, id, fragment)));
        }

        let (uri, fragment) = split_reference(reference);
        let fragment = fragment.unwrap_or("");
        if !fragment.is_empty() && !fragment.starts_with('/') {
            debug!("Leaving {}: fragment is not a JSON pointer", reference);
            return Ok(None);
        }

        let Some(plugin) = self.plugins.iter().find(|p| p.validate(uri, base)) else {
            debug!("No loader accepts {}", reference);
            return Ok(None);
        };

        let canonical = plugin.canonical(uri, base);
        let id = match state.ids.get(&canonical) {
            Some(id) => id.clone(),
            None => {
                let loaded = plugin.exec(uri, base)?;
                let id = unique_id(&canonical, &state.urls);
                debug!(
                    "Bundling {} via {} loader as {}",
                    canonical,
                    plugin.name(),
                    id
                );
                state.ids.insert(canonical.clone(), id.clone());
                state.ext.insert(id.clone(), loaded.data);
                state
                    .urls
                    .insert(id.clone(), JsonValue::String(canonical.clone()));
                state.pending.push_back((id.clone(), loaded.origin));
                id
            }
        };
        Ok(Some(format!("#/{}/{}{}", EXT_KEY, id, fragment)))
    }
}

fn unique_id(canonical: &str, taken: &Map<String, JsonValue>) -> String {
    let id = encode_ext_id(canonical);
    if !taken.contains_key(&id) {
        return id;
    }
    (1..)
        .map(|n| format!("{}-{}", id, n))
        .find(|candidate| !taken.contains_key(candidate))
        .unwrap_or(id)
}
