//! Text-similarity fallback for answers that fail to decode.
//!
//! Counts how often each option's text appears in the record's keyword and
//! explanation fields and picks the most frequent one. This is a heuristic:
//! when one option's text is a substring of another's the shorter one can
//! win. Ties go to the earliest option.

use crate::options::{ExtractedOptions, Letter};
use crate::sanitize::clean_value;
use serde_json::{Map, Value};

/// Keyword field consulted before the explanations.
pub const KEYWORD_FIELD: &str = "assuredKeywords";
pub const CONCISE_EXPLAIN_FIELD: &str = "conciseExplain";
pub const EXPLAIN_FIELD: &str = "explain";

/// Auxiliary text the fallback searches, in priority order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuxiliaryText {
    pub keywords: String,
    pub concise_explain: String,
    pub explain: String,
}

impl AuxiliaryText {
    pub fn from_record(record: &Map<String, Value>) -> Self {
        Self {
            keywords: keyword_text(record.get(KEYWORD_FIELD)),
            concise_explain: clean_value(record.get(CONCISE_EXPLAIN_FIELD)),
            explain: clean_value(record.get(EXPLAIN_FIELD)),
        }
    }

    /// Non-empty sources joined by a single space.
    pub fn joined(&self) -> String {
        [
            self.keywords.as_str(),
            self.concise_explain.as_str(),
            self.explain.as_str(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// Concise explanation if present, else the long one.
    pub fn preferred_explain(&self) -> &str {
        if self.concise_explain.is_empty() {
            &self.explain
        } else {
            &self.concise_explain
        }
    }
}

/// Keywords arrive either as a string or as a list of strings.
fn keyword_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        Some(other) => other.to_string(),
    }
}

/// Pick the option whose text occurs most often in the auxiliary text.
///
/// Returns `None` when there is nothing to search, no option has text, or
/// no option text occurs at all.
pub fn resolve_by_text(options: &ExtractedOptions, aux: &AuxiliaryText) -> Option<Letter> {
    let haystack = aux.joined();
    if haystack.is_empty() {
        return None;
    }

    let mut best: Option<(Letter, usize)> = None;
    for entry in options.entries.iter().filter(|e| !e.text.is_empty()) {
        let count = haystack.matches(entry.text.as_str()).count();
        match best {
            Some((_, top)) if count <= top => {}
            _ => best = Some((entry.letter, count)),
        }
    }

    best.filter(|(_, count)| *count > 0).map(|(letter, _)| letter)
}
