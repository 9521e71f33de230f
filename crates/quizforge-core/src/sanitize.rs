//! Free-text cleanup for question stems, options and explanations.
//!
//! Scraped records carry stray HTML: `&nbsp;`, full-width spaces, `<br>`
//! line breaks and inline markup. [`clean_html`] turns that into plain,
//! trimmed text; [`is_effectively_empty`] is the weaker whitespace-only test
//! used for option presence.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static NBSP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)&nbsp;").expect("valid regex"));
static BR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

const FULL_WIDTH_SPACE: char = '\u{3000}';

/// Replace `&nbsp;` entities and full-width spaces with a plain space.
fn normalize_spaces(text: &str) -> String {
    NBSP_RE
        .replace_all(text, " ")
        .replace(FULL_WIDTH_SPACE, " ")
}

/// Render a JSON field as text. Strings are taken as-is, `null` is empty and
/// anything else uses its JSON rendering.
pub fn value_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// True when the text is missing or holds only whitespace once `&nbsp;` and
/// full-width spaces are normalized. Tags are not stripped here.
pub fn is_effectively_empty(text: Option<&str>) -> bool {
    match text {
        None => true,
        Some(s) => normalize_spaces(s).trim().is_empty(),
    }
}

/// Strip HTML from free text, keeping `<br>` as line breaks.
///
/// Malformed markup is handled best-effort: anything that looks like a tag
/// is dropped, everything else is kept.
pub fn clean_html(text: Option<&str>) -> String {
    let Some(raw) = text else {
        return String::new();
    };
    if raw.is_empty() {
        return String::new();
    }
    let spaced = normalize_spaces(raw);
    let with_breaks = BR_RE.replace_all(&spaced, "\n");
    let untagged = TAG_RE.replace_all(&with_breaks, "");
    html_escape::decode_html_entities(&untagged)
        .trim()
        .to_string()
}

/// [`clean_html`] over a JSON field.
pub fn clean_value(value: Option<&Value>) -> String {
    clean_html(value_text(value).as_deref())
}
