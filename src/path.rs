//! Path and JSON pointer utilities

use std::path::{Component, Path, PathBuf};

/// Unescape one JSON pointer reference token.
///
/// `~1` must be replaced before `~0`: the token `~01` denotes the literal
/// text `~1`, and replacing `~0` first would turn it into `/`.
pub fn unescape_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

/// Escape a string for use as a single JSON pointer reference token.
pub fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Split the body of a `#/a/b~1c` pointer into unescaped segments.
///
/// Returns `None` when `pointer` is not a same-document pointer. The
/// pointer `#/` addresses the empty-named member of the root.
pub fn pointer_segments(pointer: &str) -> Option<Vec<String>> {
    let body = pointer.strip_prefix("#/")?;
    Some(body.split('/').map(unescape_token).collect())
}

/// Lexically normalize a path, folding `.` and `..` components.
///
/// The target does not need to exist. Leading `..` components of a relative
/// path are kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve `relative` against `base_dir`, producing a normalized path.
///
/// Absolute inputs are only normalized.
pub fn resolve_against(base_dir: &Path, relative: &str) -> PathBuf {
    let candidate = Path::new(relative);
    if candidate.is_absolute() {
        normalize(candidate)
    } else {
        normalize(&base_dir.join(candidate))
    }
}

/// Derive a stable `x-ext` key from a loaded reference URI.
///
/// Keeps alphanumerics, `.`, `-`, `_` and `:`; everything else becomes `_`.
/// The result never needs pointer escaping.
pub fn encode_ext_id(uri: &str) -> String {
    uri.chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':') => c,
            _ => '_',
        })
        .collect()
}
