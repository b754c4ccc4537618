//! Inlining same-document pointers
//!
//! After bundling, every remaining reference is a same-document pointer
//! (`#/seg/seg/...`). [`inline`] replaces each `{"$ref": "#/..."}` object
//! with a copy of its target, resolved depth-first and transitively from the
//! document root, and drops the bundler's `x-ext` / `x-ext-urls` bookkeeping
//! at every depth.
//!
//! A pointer whose target does not exist resolves to nothing: the member
//! holding it is omitted from its parent object (array slots become `null`).
//! A pointer that is reached again while it is still being expanded is a
//! cycle and fails with [`Error::CycleDetected`].

use serde_json::{Map, Value as JsonValue};

use crate::bundle::{EXT_KEY, EXT_URLS_KEY};
use crate::error::{Error, Result};
use crate::path::pointer_segments;

const REF_KEY: &str = "$ref";

/// Resolve every same-document pointer in `document`.
pub fn inline(document: &JsonValue) -> Result<JsonValue> {
    let mut inliner = Inliner {
        root: document,
        chain: Vec::new(),
    };
    Ok(inliner.node(document)?.unwrap_or(JsonValue::Null))
}

/// Walk `segments` from `root`. Array elements are addressed by index.
pub fn lookup<'a>(root: &'a JsonValue, segments: &[String]) -> Option<&'a JsonValue> {
    segments.iter().try_fold(root, |target, segment| match target {
        JsonValue::Object(map) => map.get(segment),
        JsonValue::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

struct Inliner<'a> {
    root: &'a JsonValue,
    /// Pointers currently being expanded, outermost first.
    chain: Vec<String>,
}

impl Inliner<'_> {
    /// `Ok(None)` means the node resolved to a missing target.
    fn node(&mut self, node: &JsonValue) -> Result<Option<JsonValue>> {
        match node {
            JsonValue::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.node(item)?.unwrap_or(JsonValue::Null));
                }
                Ok(Some(JsonValue::Array(out)))
            }
            JsonValue::Object(map) => {
                if let Some(JsonValue::String(pointer)) = map.get(REF_KEY) {
                    if let Some(segments) = pointer_segments(pointer) {
                        return self.pointer(pointer, &segments);
                    }
                }
                let mut out = Map::with_capacity(map.len());
                for (key, value) in map {
                    if key == EXT_KEY || key == EXT_URLS_KEY {
                        continue;
                    }
                    if let Some(resolved) = self.node(value)? {
                        out.insert(key.clone(), resolved);
                    }
                }
                Ok(Some(JsonValue::Object(out)))
            }
            scalar => Ok(Some(scalar.clone())),
        }
    }

    fn pointer(&mut self, pointer: &str, segments: &[String]) -> Result<Option<JsonValue>> {
        if self.chain.iter().any(|p| p == pointer) {
            let mut cycle = self.chain.clone();
            cycle.push(pointer.to_string());
            return Err(Error::CycleDetected {
                cycle: cycle.join(" -> "),
            });
        }
        let root = self.root;
        let Some(target) = lookup(root, segments) else {
            return Ok(None);
        };
        self.chain.push(pointer.to_string());
        let resolved = self.node(target);
        self.chain.pop();
        resolved
    }
}
