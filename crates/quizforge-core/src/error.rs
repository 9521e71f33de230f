//! Unified error types for quizforge.

use crate::config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuizforgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// An input line is not valid UTF-8 or not a JSON object, and the build
    /// runs with the `fail` malformed-line policy.
    #[error("malformed record on line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, QuizforgeError>;
