//! Record identity for deduplicating scraped batches.
//!
//! The source API returns overlapping pages, so the same question shows up
//! many times. A record's key is `questionId` + `id` + `question`, each
//! rendered as text; the first record seen for a key is kept.

use crate::sanitize::value_text;
use serde_json::{Map, Value};
use std::collections::HashSet;

pub fn record_key(record: &Map<String, Value>) -> String {
    ["questionId", "id", "question"]
        .into_iter()
        .map(|field| value_text(record.get(field)).unwrap_or_default())
        .collect()
}

#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time a key is seen.
    pub fn insert(&mut self, record: &Map<String, Value>) -> bool {
        self.seen.insert(record_key(record))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
