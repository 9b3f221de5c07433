//! Whitespace normalization for multi-line strings

use once_cell::sync::Lazy;
use regex::Regex;

static LINE_BREAK_INDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r?\n[ \t]*").expect("valid line break regex"));
static INLINE_SPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]{2,}|\t").expect("valid inline space regex"));

/// Strip surrounding whitespace, then drop every line break together with the
/// indentation that follows it.
///
/// `trim("a\n  \nb") == "ab"`
pub fn trim(text: &str) -> String {
    LINE_BREAK_INDENT_RE.replace_all(text.trim(), "").into_owned()
}

/// Like [`trim`], and additionally collapse runs of spaces/tabs to one space.
pub fn trim_all(text: &str) -> String {
    let joined = trim(text);
    INLINE_SPACE_RE.replace_all(&joined, " ").into_owned()
}
