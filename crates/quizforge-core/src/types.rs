//! Output row types for the three generated datasets.

use crate::options::Letter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One line of the instruction-tuning file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstructionPair {
    pub input: String,
    pub output: InstructionCompletion,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstructionCompletion {
    pub answer_letters: Vec<Letter>,
    pub answer_text: Vec<String>,
    pub explain: String,
}

/// One line of the retrieval corpus. `id` is the upsert key downstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalDocument {
    pub id: String,
    pub text: String,
    pub metadata: RetrievalMetadata,
}

/// Source fields copied verbatim; missing fields become `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RetrievalMetadata {
    #[serde(rename = "chapterId", default)]
    pub chapter_id: Value,
    #[serde(default)]
    pub label: Value,
    #[serde(default)]
    pub difficulty: Value,
    #[serde(default)]
    pub keywords: Value,
}

/// One line of the evaluation set. An empty `gold` means the answer could
/// not be recovered, not that the item failed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationItem {
    pub id: String,
    pub question: String,
    pub options: BTreeMap<Letter, String>,
    pub gold: Vec<Letter>,
}

/// All three rows produced from a single record.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedRows {
    pub instruction: InstructionPair,
    pub retrieval: RetrievalDocument,
    pub evaluation: EvaluationItem,
}
