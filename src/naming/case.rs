//! Identifier case conversion.
//!
//! Turns logical ids such as `MyQueueTwo` into `my_queue_two`. The scan looks for an
//! ASCII word character immediately followed by an uppercase ASCII letter and inserts
//! the separator at that boundary. When both characters are uppercase the separator is
//! placed after the pair instead, so acronyms are not split down the middle. Matches do
//! not overlap and are taken left to right.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::constants::ENV_KEY_SEPARATOR;

static BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    // ASCII classes only, independent of locale and Unicode tables.
    Regex::new(r"[A-Za-z0-9_][A-Z]").expect("boundary pattern is valid")
});

/// Convert `text` to lowercase snake case using `separator` at word boundaries.
///
/// # Examples
///
/// ```rust
/// use resnames_cli::naming::convert_case;
///
/// assert_eq!(convert_case("MyQueueTwo", "_"), "my_queue_two");
/// assert_eq!(convert_case("myQueueTwo", "-"), "my-queue-two");
/// ```
#[must_use]
pub fn convert_case(text: &str, separator: &str) -> String {
    BOUNDARY
        .replace_all(text, |caps: &Captures<'_>| {
            let pair = &caps[0];
            // Both characters matched ASCII classes, so byte slicing is safe.
            let (first, second) = pair.split_at(1);
            if first.bytes().all(|b| b.is_ascii_uppercase()) {
                format!("{first}{second}{separator}")
            } else {
                format!("{first}{separator}{second}")
            }
        })
        .to_lowercase()
}

/// Derive the upper-snake-case environment key for a logical id.
///
/// ```rust
/// use resnames_cli::naming::env_key;
///
/// assert_eq!(env_key("UserTable"), "USER_TABLE");
/// ```
#[must_use]
pub fn env_key(logical_id: &str) -> String {
    convert_case(logical_id, ENV_KEY_SEPARATOR).to_uppercase()
}
