//! Joining several resolved documents into one
//!
//! ## Policy
//!
//! - The first document establishes the baseline. Keys outside the
//!   namespaced sections are deep-merged with the earliest value winning;
//!   later documents only fill in what is missing.
//! - `paths` and `webhooks` entries, and `components/<kind>` entries, are
//!   namespaced: a name declared by two documents with differing content is a
//!   conflict. Every source declaring a conflicting name is reported.
//! - A byte-identical duplicate declaration is not a conflict; it is kept
//!   once.
//! - `tags` and `servers` are unioned, dropping exact duplicates.

use std::collections::HashMap;
use std::fmt;

use log::{debug, warn};
use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};

/// One input to [`join`]: a document and a label naming where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Specification {
    pub source: String,
    pub document: JsonValue,
}

impl Specification {
    pub fn new(source: impl Into<String>, document: JsonValue) -> Self {
        Self {
            source: source.into(),
            document,
        }
    }
}

/// A namespaced name declared with differing content by several documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinConflict {
    /// The section the name lives in, e.g. `paths` or `components/schemas`.
    pub namespace: String,
    /// The colliding name, e.g. `/ping`.
    pub key: String,
    /// Every document declaring the name, in input order.
    pub sources: Vec<String>,
}

impl fmt::Display for JoinConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' declared by {}",
            self.namespace,
            self.key,
            self.sources.join(", ")
        )
    }
}

/// Outcome of [`join`].
#[derive(Debug, Clone, PartialEq)]
pub enum JoinResult {
    Joined(JsonValue),
    Conflicts(Vec<JoinConflict>),
}

impl JoinResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, JoinResult::Joined(_))
    }

    /// Convert into a `Result`, labelling a conflict with `context`.
    pub fn into_result(self, context: &str) -> Result<JsonValue> {
        match self {
            JoinResult::Joined(document) => Ok(document),
            JoinResult::Conflicts(conflicts) => Err(Error::MergeConflict {
                context: context.to_string(),
                conflicts,
            }),
        }
    }
}

const NAMESPACED: [&str; 2] = ["paths", "webhooks"];
const UNIONED: [&str; 2] = ["tags", "servers"];

#[derive(Default)]
struct Joiner {
    out: Map<String, JsonValue>,
    owners: HashMap<(String, String), String>,
    conflicts: Vec<JoinConflict>,
    conflict_index: HashMap<(String, String), usize>,
}

impl Joiner {
    fn add(&mut self, spec: &Specification) {
        let document = match &spec.document {
            JsonValue::Object(map) => map,
            JsonValue::Null => return,
            _ => {
                warn!("Skipping {}: top level is not a mapping", spec.source);
                return;
            }
        };

        for (section, value) in document {
            match (section.as_str(), value) {
                (name, JsonValue::Object(entries)) if NAMESPACED.contains(&name) => {
                    self.add_entries(section, section, entries, &spec.source);
                }
                ("components", JsonValue::Object(kinds)) => {
                    for (kind, entries) in kinds {
                        match entries {
                            JsonValue::Object(entries) => {
                                let namespace = format!("components/{}", kind);
                                self.add_component_entries(kind, &namespace, entries, &spec.source);
                            }
                            other => {
                                let components = self.section_mut("components");
                                fill_missing_key(components, kind, other);
                            }
                        }
                    }
                }
                (name, JsonValue::Array(items)) if UNIONED.contains(&name) => {
                    let target = self
                        .out
                        .entry(section.clone())
                        .or_insert_with(|| JsonValue::Array(Vec::new()));
                    if let JsonValue::Array(existing) = target {
                        for item in items {
                            if !existing.contains(item) {
                                existing.push(item.clone());
                            }
                        }
                    }
                }
                _ => fill_missing_key(&mut self.out, section, value),
            }
        }
    }

    fn section_mut(&mut self, section: &str) -> &mut Map<String, JsonValue> {
        let value = self
            .out
            .entry(section.to_string())
            .or_insert_with(|| JsonValue::Object(Map::new()));
        if !value.is_object() {
            *value = JsonValue::Object(Map::new());
        }
        match value {
            JsonValue::Object(map) => map,
            _ => unreachable!("section was just made an object"),
        }
    }

    fn add_entries(
        &mut self,
        section: &str,
        namespace: &str,
        entries: &Map<String, JsonValue>,
        source: &str,
    ) {
        for (name, item) in entries {
            let existing = self.section_mut(section).get(name).cloned();
            self.place(namespace, name, item, existing.as_ref(), source, |joiner| {
                joiner.section_mut(section).insert(name.clone(), item.clone());
            });
        }
    }

    fn add_component_entries(
        &mut self,
        kind: &str,
        namespace: &str,
        entries: &Map<String, JsonValue>,
        source: &str,
    ) {
        for (name, item) in entries {
            let existing = component_kind(self.section_mut("components"), kind)
                .get(name)
                .cloned();
            self.place(namespace, name, item, existing.as_ref(), source, |joiner| {
                component_kind(joiner.section_mut("components"), kind)
                    .insert(name.clone(), item.clone());
            });
        }
    }

    fn place<F>(
        &mut self,
        namespace: &str,
        name: &str,
        item: &JsonValue,
        existing: Option<&JsonValue>,
        source: &str,
        insert: F,
    ) where
        F: FnOnce(&mut Self),
    {
        let id = (namespace.to_string(), name.to_string());
        match existing {
            None => {
                insert(self);
                self.owners.insert(id, source.to_string());
            }
            Some(current) if current == item => {
                debug!("{} '{}' repeated verbatim by {}", namespace, name, source);
            }
            Some(_) => {
                if let Some(&idx) = self.conflict_index.get(&id) {
                    let sources = &mut self.conflicts[idx].sources;
                    if !sources.iter().any(|s| s == source) {
                        sources.push(source.to_string());
                    }
                } else {
                    let owner = self.owners.get(&id).cloned().unwrap_or_default();
                    let mut sources = vec![owner];
                    if sources[0] != source {
                        sources.push(source.to_string());
                    }
                    self.conflict_index.insert(id, self.conflicts.len());
                    self.conflicts.push(JoinConflict {
                        namespace: namespace.to_string(),
                        key: name.to_string(),
                        sources,
                    });
                }
            }
        }
    }
}

fn component_kind<'a>(
    components: &'a mut Map<String, JsonValue>,
    kind: &str,
) -> &'a mut Map<String, JsonValue> {
    let value = components
        .entry(kind.to_string())
        .or_insert_with(|| JsonValue::Object(Map::new()));
    if !value.is_object() {
        *value = JsonValue::Object(Map::new());
    }
    match value {
        JsonValue::Object(map) => map,
        _ => unreachable!("component kind was just made an object"),
    }
}

/// Insert `value` under `key` unless present; when both sides are objects,
/// recurse so the earlier document keeps every key it already set.
fn fill_missing_key(target: &mut Map<String, JsonValue>, key: &str, value: &JsonValue) {
    match target.get_mut(key) {
        None => {
            target.insert(key.to_string(), value.clone());
        }
        Some(JsonValue::Object(existing)) => {
            if let JsonValue::Object(incoming) = value {
                for (k, v) in incoming {
                    fill_missing_key(existing, k, v);
                }
            }
        }
        Some(_) => {}
    }
}

/// Merge documents in order, reporting every namespace conflict.
pub fn join(specs: &[Specification]) -> JoinResult {
    let mut joiner = Joiner::default();
    for spec in specs {
        joiner.add(spec);
    }
    if joiner.conflicts.is_empty() {
        JoinResult::Joined(JsonValue::Object(joiner.out))
    } else {
        JoinResult::Conflicts(joiner.conflicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_join_disjoint_paths() {
        let a = Specification::new(
            "a.yaml",
            json!({
                "openapi": "3.1.0",
                "info": {"title": "A", "version": "1"},
                "paths": {"/a": {"get": {"operationId": "a"}}}
            }),
        );
        let b = Specification::new(
            "b.yaml",
            json!({
                "openapi": "3.0.0",
                "info": {"title": "B", "description": "from b"},
                "paths": {"/b": {"get": {"operationId": "b"}}}
            }),
        );

        let JoinResult::Joined(doc) = join(&[a, b]) else {
            panic!("expected joined document");
        };
        assert_eq!(doc["openapi"], "3.1.0");
        assert_eq!(doc["info"]["title"], "A");
        assert_eq!(doc["info"]["description"], "from b");
        let paths: Vec<&String> = doc["paths"].as_object().unwrap().keys().collect();
        assert_eq!(paths, vec!["/a", "/b"]);
    }

    #[test]
    fn test_conflicting_path_names_both_sources() {
        let a = Specification::new("a.yaml", json!({"paths": {"/ping": {"get": {"summary": "a"}}}}));
        let b = Specification::new("b.yaml", json!({"paths": {"/ping": {"get": {"summary": "b"}}}}));

        let JoinResult::Conflicts(conflicts) = join(&[a, b]) else {
            panic!("expected conflicts");
        };
        assert_eq!(
            conflicts,
            vec![JoinConflict {
                namespace: "paths".to_string(),
                key: "/ping".to_string(),
                sources: vec!["a.yaml".to_string(), "b.yaml".to_string()],
            }]
        );
        assert_eq!(
            conflicts[0].to_string(),
            "paths '/ping' declared by a.yaml, b.yaml"
        );
    }

    #[test]
    fn test_identical_duplicates_are_tolerated() {
        let ping = json!({"paths": {"/ping": {"get": {"summary": "same"}}}});
        let a = Specification::new("a.yaml", ping.clone());
        let b = Specification::new("b.yaml", ping.clone());

        let result = join(&[a, b]);
        assert_eq!(result, JoinResult::Joined(ping));
    }

    #[test]
    fn test_third_source_joins_existing_conflict() {
        let specs: Vec<Specification> = ["a", "b", "c"]
            .iter()
            .map(|name| {
                Specification::new(
                    format!("{}.yaml", name),
                    json!({"components": {"schemas": {"Status": {"title": name}}}}),
                )
            })
            .collect();

        let JoinResult::Conflicts(conflicts) = join(&specs) else {
            panic!("expected conflicts");
        };
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].namespace, "components/schemas");
        assert_eq!(conflicts[0].key, "Status");
        assert_eq!(conflicts[0].sources, vec!["a.yaml", "b.yaml", "c.yaml"]);
    }

    #[test]
    fn test_components_merge_by_kind() {
        let a = Specification::new(
            "a",
            json!({"components": {"schemas": {"A": {"type": "string"}}}}),
        );
        let b = Specification::new(
            "b",
            json!({"components": {
                "schemas": {"B": {"type": "integer"}},
                "parameters": {"Id": {"name": "id", "in": "path"}}
            }}),
        );

        let doc = join(&[a, b]).into_result("test").unwrap();
        assert_eq!(doc["components"]["schemas"]["A"]["type"], "string");
        assert_eq!(doc["components"]["schemas"]["B"]["type"], "integer");
        assert_eq!(doc["components"]["parameters"]["Id"]["name"], "id");
    }

    #[test]
    fn test_tags_and_servers_union() {
        let a = Specification::new(
            "a",
            json!({"tags": [{"name": "net"}], "servers": [{"url": "http://a"}]}),
        );
        let b = Specification::new(
            "b",
            json!({"tags": [{"name": "net"}, {"name": "sensors"}], "servers": [{"url": "http://a"}]}),
        );

        let doc = join(&[a, b]).into_result("test").unwrap();
        assert_eq!(doc["tags"], json!([{"name": "net"}, {"name": "sensors"}]));
        assert_eq!(doc["servers"], json!([{"url": "http://a"}]));
    }

    #[test]
    fn test_into_result_conflict_error() {
        let a = Specification::new("a", json!({"webhooks": {"tick": {"post": {}}}}));
        let b = Specification::new("b", json!({"webhooks": {"tick": {"put": {}}}}));

        let err = join(&[a, b]).into_result("sdk:common").unwrap_err();
        match err {
            Error::MergeConflict { context, conflicts } => {
                assert_eq!(context, "sdk:common");
                assert_eq!(conflicts[0].namespace, "webhooks");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(join(&[]), JoinResult::Joined(json!({})));
    }
}
