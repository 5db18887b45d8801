//! Learnings extraction for passive capture.
//!
//! Agents emit free text ending in a "Key Learnings" section; each bulleted
//! or numbered item under that heading becomes its own observation. The
//! scanner here only finds the items — length filtering and persistence
//! happen in the write engine.

/// Extracts list items from the learnings section(s) of `content`.
///
/// A section starts at a heading line containing "learnings" (or the
/// Spanish "aprendizajes") and ends at the next heading. Items are lines
/// starting with `-`, `*`, or a number followed by `.` or `)`.
pub fn extract_learnings(content: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut in_section = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if is_learnings_heading(trimmed) {
            in_section = true;
            continue;
        }
        if !in_section {
            continue;
        }
        if trimmed.starts_with('#') {
            in_section = false;
            continue;
        }
        if let Some(item) = strip_list_marker(trimmed) {
            if !item.is_empty() {
                items.push(item.to_owned());
            }
        }
    }

    items
}

fn is_learnings_heading(line: &str) -> bool {
    if !line.starts_with('#') {
        return false;
    }
    let lowered = line.to_lowercase();
    lowered.contains("learnings") || lowered.contains("aprendizajes")
}

fn strip_list_marker(line: &str) -> Option<&str> {
    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        return Some(rest.trim());
    }

    // Numbered items: "1. text" or "12) text".
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let rest = &line[digits..];
    let rest = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')'))?;
    Some(rest.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_numbered_items() {
        let text = "## Key Learnings:\n\n1. bcrypt cost=12 is the right balance\n2. JWT refresh tokens need atomic rotation\n";
        let items = extract_learnings(text);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], "bcrypt cost=12 is the right balance");
        assert_eq!(items[1], "JWT refresh tokens need atomic rotation");
    }

    #[test]
    fn extracts_bulleted_items() {
        let text = "## Key Learnings\n- first learning here\n* second learning here\n";
        let items = extract_learnings(text);
        assert_eq!(items, vec!["first learning here", "second learning here"]);
    }

    #[test]
    fn ignores_text_without_section() {
        assert!(extract_learnings("just some text without any learning section").is_empty());
        assert!(extract_learnings("- a bullet outside any section").is_empty());
    }

    #[test]
    fn section_ends_at_next_heading() {
        let text = "## Key Learnings\n- inside item\n## Next Steps\n- outside item\n";
        assert_eq!(extract_learnings(text), vec!["inside item"]);
    }

    #[test]
    fn accepts_spanish_heading() {
        let text = "## Aprendizajes Clave:\n1. los tokens expiran a los quince minutos\n";
        assert_eq!(extract_learnings(text), vec!["los tokens expiran a los quince minutos"]);
    }

    #[test]
    fn skips_plain_lines_inside_section() {
        let text = "## Key Learnings\nsome prose explaining context\n- the actual item\n";
        assert_eq!(extract_learnings(text), vec!["the actual item"]);
    }

    #[test]
    fn parenthesis_numbering_works() {
        let text = "## Key Learnings\n1) first\n2) second\n";
        assert_eq!(extract_learnings(text), vec!["first", "second"]);
    }
}
