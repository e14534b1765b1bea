use regex::Regex;
use std::sync::LazyLock;

/// Openers the agent uses when narrating its own process rather than
/// reporting findings. Compared lowercase against the start of the text.
const TRANSITION_PREFIXES: &[&str] = &[
    "i'll search",
    "i'll look",
    "i'll find",
    "i'll check",
    "i'll research",
    "i'll gather",
    "i'll start",
    "i'll now",
    "i will search",
    "i will look",
    "let me search",
    "let me check",
    "let me look",
    "let me find",
    "let me gather",
    "let me get",
    "let me try",
    "let me research",
    "let me verify",
    "let me compile",
    "searching for",
    "looking for",
    "looking up",
    "checking ",
    "now let me",
    "now i'll",
    "now i will",
    "next, let me",
    "next, i'll",
    "first, let me",
    "first, i'll",
    "okay, let me",
    "ok, let me",
    "alright, let me",
    "great! i'll",
    "great! let me",
    "great, let me",
    "perfect! let me",
    "perfect! i'll",
    "excellent! let me",
    "i need to search",
    "i need to find",
];

#[allow(clippy::expect_used)]
static MARKDOWN_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:#{1,3}\s|\*\*|- )").expect("markdown start pattern"));

#[allow(clippy::expect_used)]
static MARKDOWN_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:^[ \t]*#{1,3}\s|\*\*|^[ \t]*- )").expect("markdown marker pattern")
});

/// True for empty text or text that only narrates what the agent is about to
/// do ("Let me search for that.").
pub fn is_transition_only_text(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return true;
    }
    let lower = trimmed.to_lowercase();
    TRANSITION_PREFIXES.iter().any(|p| lower.starts_with(p))
}

/// True if the trimmed text opens with a heading (`#`..`###` + space), bold
/// (`**`) or list (`- `) marker.
pub fn is_markdown_start(text: &str) -> bool {
    MARKDOWN_START.is_match(text.trim_start())
}

/// Byte offset of the first Markdown marker anywhere in `text`: a heading or
/// list marker at the start of a line, or `**` at any position. The offset
/// points at the start of the line for line-anchored markers.
pub fn find_markdown_marker(text: &str) -> Option<usize> {
    MARKDOWN_MARKER.find(text).map(|m| m.start())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_transition() {
        assert!(is_transition_only_text(""));
        assert!(is_transition_only_text("   \n\t"));
    }

    #[test]
    fn test_transition_phrases() {
        assert!(is_transition_only_text("Let me search for that."));
        assert!(is_transition_only_text("I'll search LinkedIn next."));
        assert!(is_transition_only_text("  Now let me check the news."));
        assert!(is_transition_only_text("Great! I'll dig deeper."));
        assert!(is_transition_only_text("SEARCHING FOR more sources"));
    }

    #[test]
    fn test_content_is_not_transition() {
        assert!(!is_transition_only_text("John Smith was born in 1990."));
        assert!(!is_transition_only_text("She later searched for gold in Alaska."));
        assert!(!is_transition_only_text("Let it be noted that he resigned."));
    }

    #[test]
    fn test_markdown_start() {
        assert!(is_markdown_start("# Overview"));
        assert!(is_markdown_start("### Career"));
        assert!(is_markdown_start("  **Name:** Jane"));
        assert!(is_markdown_start("- Born 1990"));
        assert!(!is_markdown_start("#### Too deep"));
        assert!(!is_markdown_start("#hashtag"));
        assert!(!is_markdown_start("Plain prose."));
        assert!(!is_markdown_start("-5 degrees"));
    }

    #[test]
    fn test_find_marker_mid_buffer() {
        let text = "Here is what I found.\n## Summary\n";
        let idx = find_markdown_marker(text).unwrap_or(usize::MAX);
        assert_eq!(&text[idx..], "## Summary\n");

        let bold = "She is **the** founder.";
        assert_eq!(find_markdown_marker(bold), Some(7));

        assert_eq!(find_markdown_marker("A well-known author. No markers here."), None);
        assert_eq!(find_markdown_marker("Ranked #1 in 2020."), None);
    }

    #[test]
    fn test_find_list_marker_on_new_line() {
        let text = "Key facts:\n- Born in Ohio";
        let idx = find_markdown_marker(text).unwrap_or(usize::MAX);
        assert_eq!(&text[idx..], "- Born in Ohio");
    }
}
