use regex::Regex;
use std::sync::LazyLock;

static PLACEHOLDER_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[MOCK.*?\]").expect("Invalid placeholder regex"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Prepare reply text for synthesis: drop `[MOCK ...]` placeholder markers
/// and collapse whitespace.
pub fn normalize_for_speech(text: &str) -> String {
    let stripped = PLACEHOLDER_MARKER.replace_all(text, "");
    WHITESPACE_RUN.replace_all(&stripped, " ").trim().to_string()
}
