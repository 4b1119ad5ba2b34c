use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static CODE_SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s,，]+").unwrap());

/// Strips all whitespace so header cells compare reliably; the venues pad
/// header names with ideographic spaces and stray line breaks.
pub fn normalize_header(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, "").into_owned()
}

/// Collapses every run of whitespace (including NBSP and U+3000) to a single
/// space and trims the ends.
pub fn clean_text(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

/// Cell-level cleanup: drops the Excel text guard (`="0050"`) the tabular
/// exports wrap codes in, then normalizes whitespace.
pub fn clean_cell(value: &str) -> String {
    let trimmed = value.trim();
    let unguarded = trimmed
        .strip_prefix("=\"")
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed);
    clean_text(unguarded)
}

/// Tokenizes a user-entered list of security codes separated by whitespace
/// or commas (full-width commas included).
pub fn split_codes(raw: &str) -> Vec<String> {
    CODE_SEPARATOR_RE
        .split(raw.trim())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
