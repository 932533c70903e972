//! Text normalization for extracted PDF pages
//!
//! PDF text extraction leaves control characters, hard line breaks and
//! words hyphenated across lines. This module flattens all of that into a
//! single line of text that the sentence splitter can work with.

use regex::Regex;
use std::sync::LazyLock;

static CONTROL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x1F\x7F]").expect("valid control char pattern"));
static LINE_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\n\r\t]+").expect("valid line break pattern"));
static BROKEN_HYPHEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\s+").expect("valid hyphen pattern"));
static MULTI_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid whitespace pattern"));

/// Clean raw page text.
///
/// Steps, in order:
/// 1. ASCII control characters become spaces
/// 2. runs of newline / carriage return / tab become one space
/// 3. a hyphen followed by whitespace is removed, joining `exam- ple` into `example`
/// 4. two or more whitespace characters collapse into one space
/// 5. non-breaking spaces become regular spaces
/// 6. leading and trailing whitespace is trimmed
///
/// Step 3 cannot tell a line-break hyphen from a real compound, so
/// `well- known` also becomes `wellknown`.
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text = CONTROL_CHARS.replace_all(text, " ");
    let text = LINE_BREAKS.replace_all(&text, " ");
    let text = BROKEN_HYPHEN.replace_all(&text, "");
    let text = MULTI_SPACE.replace_all(&text, " ");
    let text = text.replace('\u{a0}', " ");

    text.trim().to_string()
}

/// Clean text that may be missing entirely (e.g. a page with no text layer).
pub fn clean_optional(text: Option<&str>) -> String {
    text.map(clean_text).unwrap_or_default()
}

/// Clean every page and join the non-empty ones into the document text.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    pages
        .iter()
        .map(|page| clean_text(page.as_ref()))
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_optional(None), "");
    }

    #[test]
    fn test_control_chars_become_spaces() {
        assert_eq!(clean_text("alpha\x07beta\x7Fgamma"), "alpha beta gamma");
    }

    #[test]
    fn test_newlines_and_tabs_collapse() {
        assert_eq!(clean_text("first line\n\n\tsecond\r\nthird"), "first line second third");
    }

    #[test]
    fn test_hyphenated_line_break_joined() {
        assert_eq!(clean_text("an exam-\nple of text"), "an example of text");
    }

    #[test]
    fn test_hyphen_without_whitespace_kept() {
        assert_eq!(clean_text("a well-known fact"), "a well-known fact");
    }

    #[test]
    fn test_semantic_hyphen_before_space_is_joined() {
        // Known limitation: indistinguishable from a line-break hyphen
        assert_eq!(clean_text("pre- and post-war"), "preand post-war");
    }

    #[test]
    fn test_multiple_spaces_collapse() {
        assert_eq!(clean_text("too     many   spaces"), "too many spaces");
    }

    #[test]
    fn test_non_breaking_space_replaced() {
        assert_eq!(clean_text("price:\u{a0}10"), "price: 10");
    }

    #[test]
    fn test_trimmed() {
        assert_eq!(clean_text("   padded text \n"), "padded text");
    }

    #[test]
    fn test_join_pages_skips_empty() {
        let pages = vec!["First page.", "   \n", "Second\npage."];
        assert_eq!(join_pages(&pages), "First page. Second page.");
    }

    #[test]
    fn test_join_pages_keeps_sentence_break_between_pages() {
        let pages = vec!["ends here.", "Starts here."];
        assert_eq!(join_pages(&pages), "ends here. Starts here.");
    }
}
