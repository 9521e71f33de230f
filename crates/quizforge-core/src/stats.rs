//! Build statistics.

use crate::decoder::DecodeStrategy;
use crate::types::EvaluationItem;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BuildStats {
    #[serde(default)]
    pub lines_read: u64,
    #[serde(default)]
    pub blank_lines: u64,
    #[serde(default)]
    pub malformed_lines: u64,
    #[serde(default)]
    pub duplicates_dropped: u64,
    #[serde(default)]
    pub records_projected: u64,
    #[serde(default)]
    pub unresolved: u64,
    #[serde(default)]
    pub multi_answer: u64,
    #[serde(default)]
    pub by_strategy: BTreeMap<DecodeStrategy, u64>,
    /// Number of present options -> records.
    #[serde(default)]
    pub option_counts: BTreeMap<usize, u64>,
}

impl BuildStats {
    pub fn record(&mut self, strategy: DecodeStrategy, answer_len: usize, option_count: usize) {
        self.records_projected += 1;
        *self.by_strategy.entry(strategy).or_insert(0) += 1;
        *self.option_counts.entry(option_count).or_insert(0) += 1;
        match answer_len {
            0 => self.unresolved += 1,
            1 => {}
            _ => self.multi_answer += 1,
        }
    }

    /// Share of projected records with a non-empty answer.
    pub fn resolved_ratio(&self) -> f64 {
        if self.records_projected == 0 {
            return 0.0;
        }
        (self.records_projected - self.unresolved) as f64 / self.records_projected as f64
    }
}

/// Summary of an existing evaluation file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EvalSummary {
    pub items: u64,
    pub empty_gold: u64,
    pub multi_answer: u64,
    pub missing_id: u64,
    pub option_counts: BTreeMap<usize, u64>,
}

pub fn summarize_eval(items: &[EvaluationItem]) -> EvalSummary {
    let mut summary = EvalSummary::default();
    for item in items {
        summary.items += 1;
        if item.gold.is_empty() {
            summary.empty_gold += 1;
        }
        if item.gold.len() > 1 {
            summary.multi_answer += 1;
        }
        if item.id.is_empty() {
            summary.missing_id += 1;
        }
        *summary.option_counts.entry(item.options.len()).or_insert(0) += 1;
    }
    summary
}
