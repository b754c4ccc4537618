//! Property-based tests for pointer and path helpers.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::path::{encode_ext_id, escape_token, normalize, unescape_token};
    use proptest::prelude::*;
    use std::path::{Component, Path};

    proptest! {
        /// Property: unescape undoes escape for any token, including ones
        /// containing literal `~0` / `~1` sequences
        #[test]
        fn unescape_inverts_escape(token in ".*") {
            prop_assert_eq!(unescape_token(&escape_token(&token)), token);
        }

        /// Property: an escaped token never contains a raw `/`
        #[test]
        fn escaped_token_has_no_separator(token in ".*") {
            prop_assert!(!escape_token(&token).contains('/'));
        }

        /// Property: ext ids survive pointer escaping unchanged
        #[test]
        fn ext_id_needs_no_escaping(uri in ".*") {
            let id = encode_ext_id(&uri);
            prop_assert_eq!(escape_token(&id), id);
        }

        /// Property: normalized absolute paths have no `.` or `..` components
        #[test]
        fn normalize_removes_dots(parts in prop::collection::vec("[a-z]{1,4}|\\.|\\.\\.", 0..8)) {
            let joined = format!("/{}", parts.join("/"));
            let normalized = normalize(Path::new(&joined));
            for component in normalized.components() {
                prop_assert!(!matches!(component, Component::CurDir | Component::ParentDir));
            }
        }
    }
}
