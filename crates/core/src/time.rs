//! Timestamp and text-length helpers.

use chrono::Utc;

/// Current UTC time in the persisted `YYYY-MM-DD HH:MM:SS` format.
///
/// Matches SQLite's `datetime('now')` so timestamps stamped in Rust and in
/// SQL compare and sort identically.
pub fn now() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Truncates `text` to at most `max` bytes, backing off to the nearest
/// character boundary, and appends the literal truncation marker when
/// anything was cut.
pub fn truncate_with_marker(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_owned();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated]", &text[..end])
}

/// Truncates for display previews, appending `...` when anything was cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_owned();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
