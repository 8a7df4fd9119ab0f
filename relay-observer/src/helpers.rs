// Copyright (c) The relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared helpers.

/// Maximum display-name length shipped to the reporting service.
pub(crate) const MAX_NAME_LEN: usize = 256;

/// Length a too-long name is cut to before the ellipsis is appended.
pub(crate) const TRUNCATED_NAME_LEN: usize = 200;

const ELLIPSIS: &str = "...";

/// Enforces the display-name length limit.
///
/// Names of up to [`MAX_NAME_LEN`] characters pass through unchanged; longer
/// names become the first [`TRUNCATED_NAME_LEN`] characters followed by a
/// three-character ellipsis (203 characters total). Counts characters, not
/// bytes, so multi-byte names are never split mid-character.
pub(crate) fn truncate_name(name: String) -> String {
    if name.chars().count() <= MAX_NAME_LEN {
        return name;
    }
    let mut truncated: String = name.chars().take(TRUNCATED_NAME_LEN).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn short_names_pass_through() {
        let at_limit = "x".repeat(256);
        let under_limit = "x".repeat(255);
        let tests = ["", "m1", under_limit.as_str(), at_limit.as_str()];
        for input in tests {
            assert_eq!(truncate_name(input.to_owned()), input);
        }
    }

    #[test]
    fn long_names_are_cut_to_203() {
        let long = "y".repeat(257);
        let truncated = truncate_name(long);
        assert_eq!(truncated.chars().count(), 203);
        assert_eq!(truncated, format!("{}...", "y".repeat(200)));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let long = "é".repeat(300);
        let truncated = truncate_name(long);
        assert_eq!(truncated.chars().count(), 203);
        assert!(truncated.starts_with(&"é".repeat(200)));
        assert!(truncated.ends_with("..."));
    }

    proptest! {
        #[test]
        fn truncated_names_never_exceed_the_limit(name: String) {
            let char_count = name.chars().count();
            let truncated = truncate_name(name.clone());
            if char_count <= MAX_NAME_LEN {
                prop_assert_eq!(truncated, name);
            } else {
                prop_assert_eq!(truncated.chars().count(), TRUNCATED_NAME_LEN + 3);
                let prefix: String = name.chars().take(TRUNCATED_NAME_LEN).collect();
                prop_assert!(truncated.starts_with(&prefix));
                prop_assert!(truncated.ends_with("..."));
            }
        }
    }
}
