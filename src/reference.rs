//! Cross-module `module:resource` references

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static MODULE_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<module>[a-zA-Z0-9_]+):(?P<resource>[a-zA-Z0-9_]+)$")
        .expect("module reference pattern compiles")
});

/// A parsed `module:resource` reference.
///
/// Any in-document pointer suffix (`#/...`) is not part of the reference;
/// the bundler strips it before a loader ever sees the string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleRef {
    pub module: String,
    pub resource: String,
}

impl ModuleRef {
    pub fn new(module: &str, resource: &str) -> Self {
        Self {
            module: module.to_string(),
            resource: resource.to_string(),
        }
    }

    /// Parse `module:resource`; identifiers are letters, digits and `_`.
    pub fn parse(value: &str) -> Option<Self> {
        let captures = MODULE_REF_RE.captures(value)?;
        Some(Self::new(&captures["module"], &captures["resource"]))
    }

    /// The cache key for this reference.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.resource)
    }
}

/// Split a `$ref` value into its URI and optional fragment pointer.
///
/// `"sdk:common#/components/schemas/Status"` becomes
/// `("sdk:common", Some("/components/schemas/Status"))`.
pub fn split_reference(value: &str) -> (&str, Option<&str>) {
    match value.split_once('#') {
        Some((uri, fragment)) => (uri, Some(fragment)),
        None => (value, None),
    }
}
