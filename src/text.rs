use std::sync::LazyLock;

use regex::Regex;

static MARKUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z][A-Za-z0-9-]*(\s[^<>]*)?/?>|<!").unwrap());

/// Collapse every whitespace run to a single space and trim both ends.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// True when extracted text still carries literal tags, e.g. escaped HTML
/// that was rendered as text.
pub fn contains_markup(text: &str) -> bool {
    MARKUP_RE.is_match(text)
}
