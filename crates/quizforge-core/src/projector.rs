//! Record projection: one raw record in, three dataset rows out.
//!
//! [`resolve_record`] runs option extraction, answer decoding and, when
//! decoding comes up empty, the text fallback. [`project`] turns the
//! resolved record into the instruction, retrieval and evaluation rows.
//! Both are pure; records never influence each other.

use crate::decoder::{decode_answer, DecodeStrategy, DecoderOptions, RawAnswer};
use crate::fallback::{resolve_by_text, AuxiliaryText};
use crate::options::{extract_options, ExtractedOptions, Letter};
use crate::sanitize::{clean_value, value_text};
use crate::types::{
    EvaluationItem, InstructionCompletion, InstructionPair, ProjectedRows, RetrievalDocument,
    RetrievalMetadata,
};
use serde_json::{Map, Value};

const PROMPT_HEADER: &str = "请从以下选项中选择正确答案，并给出简要理由。\n";
const QUESTION_PREFIX: &str = "题目：";
const EXPLAIN_PREFIX: &str = "解析：";

/// A record with its answer resolved, ready for projection.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRecord {
    pub id: String,
    /// Sanitized question, used in the prompt and the retrieval text.
    pub question: String,
    /// Source question, only trimmed. The evaluation item carries this form.
    pub raw_question: String,
    pub options: ExtractedOptions,
    pub answer: Vec<Letter>,
    pub strategy: DecodeStrategy,
    pub aux: AuxiliaryText,
    pub metadata: RetrievalMetadata,
}

impl ResolvedRecord {
    /// Option texts of the resolved letters, in option order.
    pub fn answer_text(&self) -> Vec<String> {
        self.options
            .entries
            .iter()
            .filter(|e| self.answer.contains(&e.letter))
            .map(|e| e.text.clone())
            .collect()
    }
}

/// JSON truthiness: `null`, `false`, `0`, `""`, `[]` and `{}` are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// `questionId`, else `id`, else the empty string.
pub fn record_id(record: &Map<String, Value>) -> String {
    ["questionId", "id"]
        .into_iter()
        .filter_map(|key| record.get(key))
        .find(|v| is_truthy(v))
        .and_then(|v| value_text(Some(v)))
        .unwrap_or_default()
}

fn metadata_of(record: &Map<String, Value>) -> RetrievalMetadata {
    let field = |key: &str| record.get(key).cloned().unwrap_or(Value::Null);
    RetrievalMetadata {
        chapter_id: field("chapterId"),
        label: field("label"),
        difficulty: field("difficulty"),
        keywords: field("keywords"),
    }
}

/// Extract options, decode the answer and apply the text fallback.
pub fn resolve_record(record: &Map<String, Value>, opts: &DecoderOptions) -> ResolvedRecord {
    let options = extract_options(record);
    let raw_answer = RawAnswer::from_value(record.get("answer"));
    let decoded = decode_answer(&raw_answer, &options.mask, opts);
    let aux = AuxiliaryText::from_record(record);

    let (answer, strategy) = if decoded.is_empty() && !options.is_empty() {
        match resolve_by_text(&options, &aux) {
            Some(letter) => (vec![letter], DecodeStrategy::Fallback),
            None => (Vec::new(), DecodeStrategy::Unresolved),
        }
    } else {
        (decoded.letters, decoded.strategy)
    };

    ResolvedRecord {
        id: record_id(record),
        question: clean_value(record.get("question")),
        raw_question: value_text(record.get("question"))
            .map(|q| q.trim().to_string())
            .unwrap_or_default(),
        options,
        answer,
        strategy,
        aux,
        metadata: metadata_of(record),
    }
}

fn instruction_prompt(resolved: &ResolvedRecord) -> String {
    let mut prompt = String::from(PROMPT_HEADER);
    prompt.push_str(QUESTION_PREFIX);
    prompt.push_str(&resolved.question);
    prompt.push('\n');
    for entry in &resolved.options.entries {
        prompt.push_str(&format!("{}. {}\n", entry.letter, entry.text));
    }
    prompt
}

fn retrieval_text(resolved: &ResolvedRecord) -> String {
    let options = resolved
        .options
        .entries
        .iter()
        .map(|e| format!("{}. {}", e.letter, e.text))
        .collect::<Vec<_>>()
        .join("\n");
    let mut text = format!("{}\n{}", resolved.question, options);
    let explain = resolved.aux.preferred_explain();
    if !explain.is_empty() {
        text.push('\n');
        text.push_str(EXPLAIN_PREFIX);
        text.push_str(explain);
    }
    text
}

/// Build the three dataset rows for a resolved record.
pub fn project(resolved: &ResolvedRecord) -> ProjectedRows {
    let instruction = InstructionPair {
        input: instruction_prompt(resolved),
        output: InstructionCompletion {
            answer_letters: resolved.answer.clone(),
            answer_text: resolved.answer_text(),
            explain: resolved.aux.preferred_explain().to_string(),
        },
    };

    let retrieval = RetrievalDocument {
        id: resolved.id.clone(),
        text: retrieval_text(resolved),
        metadata: resolved.metadata.clone(),
    };

    let evaluation = EvaluationItem {
        id: resolved.id.clone(),
        question: resolved.raw_question.clone(),
        options: resolved
            .options
            .entries
            .iter()
            .map(|e| (e.letter, e.text.clone()))
            .collect(),
        gold: resolved.answer.clone(),
    };

    ProjectedRows {
        instruction,
        retrieval,
        evaluation,
    }
}

/// [`resolve_record`] followed by [`project`].
pub fn project_record(record: &Map<String, Value>, opts: &DecoderOptions) -> ProjectedRows {
    project(&resolve_record(record, opts))
}
