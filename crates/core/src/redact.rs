//! Private-content redaction.

use std::sync::LazyLock;

use regex::Regex;

/// Matches `<private>...</private>` regions, case-insensitively and across
/// line breaks.
static PRIVATE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("(?is)<private>.*?</private>").expect("static pattern compiles"));

/// Replaces every `<private>...</private>` region with `[REDACTED]` and
/// trims surrounding whitespace.
///
/// Applied unconditionally to every title and content value before it
/// reaches storage, including imports and passive capture. Text without
/// the tag passes through (modulo trimming).
pub fn strip_private_tags(text: &str) -> String {
    PRIVATE_TAG.replace_all(text, "[REDACTED]").trim().to_owned()
}
