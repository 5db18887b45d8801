//! Canonical forms for scope, topic keys, search queries, and dedup hashes.
//!
//! These are pure functions: the write engine calls them on every incoming
//! observation so that equality checks in SQL (topic upserts, window
//! deduplication, scope filters) compare canonical values only.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::redact::strip_private_tags;

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-z0-9]+").expect("static pattern compiles"));

/// Normalizes a scope value: exactly `personal` (after trim + lowercase)
/// stays personal, everything else collapses to `project`.
pub fn normalize_scope(scope: &str) -> &'static str {
    if scope.trim().eq_ignore_ascii_case("personal") {
        "personal"
    } else {
        "project"
    }
}

/// Normalizes a topic key: lowercased, trimmed, whitespace runs collapsed
/// to single `-`, capped at 120 bytes. Empty input stays empty (stored as
/// NULL by the write engine).
pub fn normalize_topic_key(topic: &str) -> String {
    let lowered = topic.trim().to_lowercase();
    if lowered.is_empty() {
        return String::new();
    }
    let mut joined = lowered.split_whitespace().collect::<Vec<_>>().join("-");
    truncate_to_boundary(&mut joined, 120);
    joined
}

/// Normalizes a topic segment: lowercased, runs of anything outside
/// `[a-z0-9]` become separators, joined with `-`, capped at 100 bytes.
pub fn normalize_topic_segment(segment: &str) -> String {
    let lowered = segment.trim().to_lowercase();
    if lowered.is_empty() {
        return String::new();
    }
    let spaced = NON_ALNUM.replace_all(&lowered, " ");
    let mut joined = spaced.split_whitespace().collect::<Vec<_>>().join("-");
    truncate_to_boundary(&mut joined, 100);
    joined
}

/// Suggests a stable `family/segment` topic key from type, title, and
/// content, for cross-session upserts.
///
/// The family comes from the type when it maps to a canonical family, from
/// indicative substrings of title+content otherwise, then from the raw
/// type, then `topic`. The segment comes from the title, falling back to
/// the first eight words of content, falling back to `general`.
pub fn suggest_topic_key(kind: &str, title: &str, content: &str) -> String {
    let family = infer_topic_family(kind, title, content);

    let clean_title = strip_private_tags(title);
    let mut segment = normalize_topic_segment(&clean_title);

    if segment.is_empty() {
        let clean_content = strip_private_tags(content);
        let lead: Vec<&str> = clean_content.split_whitespace().take(8).collect();
        segment = normalize_topic_segment(&lead.join(" "));
    }

    if segment.is_empty() {
        segment = "general".to_owned();
    }

    let family_prefix = format!("{family}-");
    if let Some(stripped) = segment.strip_prefix(&family_prefix) {
        segment = stripped.to_owned();
    }
    if segment.is_empty() || segment == family {
        segment = "general".to_owned();
    }

    format!("{family}/{segment}")
}

fn infer_topic_family(kind: &str, title: &str, content: &str) -> String {
    let typed = kind.trim().to_lowercase();
    match typed.as_str() {
        "architecture" | "design" | "adr" | "refactor" => return "architecture".to_owned(),
        "bug" | "bugfix" | "fix" | "incident" | "hotfix" => return "bug".to_owned(),
        "decision" => return "decision".to_owned(),
        "pattern" | "convention" | "guideline" => return "pattern".to_owned(),
        "config" | "setup" | "infra" | "infrastructure" | "ci" => return "config".to_owned(),
        "discovery" | "investigation" | "root_cause" | "root-cause" => {
            return "discovery".to_owned()
        },
        "learning" | "learn" => return "learning".to_owned(),
        "session_summary" => return "session".to_owned(),
        _ => {},
    }

    let text = format!("{} {}", title.to_lowercase(), content.to_lowercase());
    if has_any(&text, &["bug", "fix", "panic", "error", "crash", "regression", "incident", "hotfix"])
    {
        return "bug".to_owned();
    }
    if has_any(&text, &["architecture", "design", "adr", "boundary", "hexagonal", "refactor"]) {
        return "architecture".to_owned();
    }
    if has_any(&text, &["decision", "tradeoff", "chose", "choose", "decide"]) {
        return "decision".to_owned();
    }
    if has_any(&text, &["pattern", "convention", "naming", "guideline"]) {
        return "pattern".to_owned();
    }
    if has_any(&text, &["config", "setup", "environment", "env", "docker", "pipeline"]) {
        return "config".to_owned();
    }
    if has_any(&text, &["discovery", "investigate", "investigation", "found", "root cause"]) {
        return "discovery".to_owned();
    }
    if has_any(&text, &["learned", "learning"]) {
        return "learning".to_owned();
    }

    if !typed.is_empty() && typed != "manual" {
        return normalize_topic_segment(&typed);
    }

    "topic".to_owned()
}

fn has_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| text.contains(needle))
}

/// Hex SHA-256 of content with whitespace runs collapsed to single spaces
/// and lowercased. Used as the whitespace-insensitive dedup key.
pub fn content_hash(content: &str) -> String {
    let normalized = content.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    let digest = Sha256::digest(normalized.as_bytes());
    format!("{digest:x}")
}

/// Rewrites a free-form query into a safe FTS5 MATCH expression.
///
/// Every whitespace-separated token is stripped of double quotes and then
/// re-quoted as a phrase, so operator characters (`*`, `:`, `(`, `AND`)
/// never reach the FTS5 parser. Tokens that are nothing but quotes vanish;
/// an all-empty result is returned as an empty string, which callers treat
/// as "match nothing" rather than passing to MATCH.
pub fn sanitize_fts_query(query: &str) -> String {
    query
        .split_whitespace()
        .filter_map(|token| {
            let bare = token.replace('"', "");
            if bare.is_empty() {
                None
            } else {
                Some(format!("\"{bare}\""))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Maps a capture tool name to its conventional observation type.
pub fn classify_tool(tool_name: &str) -> &'static str {
    match tool_name {
        "write" | "edit" | "patch" => "file_change",
        "bash" => "command",
        "read" | "view" => "file_read",
        "grep" | "glob" | "ls" => "search",
        _ => "tool_use",
    }
}

fn truncate_to_boundary(text: &mut String, max: usize) {
    if text.len() > max {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
}
