//! Schema document decoding and serialization
//!
//! Schema files are YAML (which also covers JSON input). They are decoded
//! into `serde_json::Value` trees, the in-memory representation used by the
//! bundler, inliner and joiner. Key order is preserved end to end.

use serde_json::{Map, Value as JsonValue};
use serde_yaml::Value as YamlValue;

use crate::error::Result;

/// Decode a YAML or JSON schema document.
///
/// YAML merge keys (`<<`) are applied. Non-string mapping keys such as the
/// unquoted response code `200` become strings.
pub fn parse_document(text: &str) -> std::result::Result<JsonValue, serde_yaml::Error> {
    let mut yaml: YamlValue = serde_yaml::from_str(text)?;
    yaml.apply_merge()?;
    Ok(yaml_to_json(yaml))
}

/// Convert a YAML tree into a JSON tree.
pub fn yaml_to_json(value: YamlValue) -> JsonValue {
    match value {
        YamlValue::Null => JsonValue::Null,
        YamlValue::Bool(b) => JsonValue::Bool(b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                JsonValue::from(i)
            } else if let Some(u) = n.as_u64() {
                JsonValue::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(JsonValue::Number)
                    .unwrap_or(JsonValue::Null)
            }
        }
        YamlValue::String(s) => JsonValue::String(s),
        YamlValue::Sequence(seq) => JsonValue::Array(seq.into_iter().map(yaml_to_json).collect()),
        YamlValue::Mapping(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                out.insert(key_to_string(key), yaml_to_json(value));
            }
            JsonValue::Object(out)
        }
        YamlValue::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn key_to_string(key: YamlValue) -> String {
    match key {
        YamlValue::String(s) => s,
        YamlValue::Null => "null".to_string(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Number(n) => n.to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Serialize a document as YAML.
pub fn to_yaml(document: &JsonValue) -> Result<String> {
    Ok(serde_yaml::to_string(document)?)
}

/// Serialize a document as pretty-printed JSON.
pub fn to_json(document: &JsonValue) -> Result<String> {
    Ok(serde_json::to_string_pretty(document)?)
}
