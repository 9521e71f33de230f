//! Core library for quizforge.
//!
//! Turns scraped quiz records into three datasets: instruction-tuning
//! pairs, a retrieval corpus and an evaluation set.
//!
//! - [`sanitize`]: HTML and whitespace cleanup for free text
//! - [`options`]: Option slots A-H and the per-record present mask
//! - [`decoder`]: Answer decoding (letters, bitmasks, ordinals)
//! - [`fallback`]: Text-similarity fallback for undecodable answers
//! - [`projector`]: Record to dataset-row projection
//! - [`identity`]: Record identity keys and deduplication
//! - [`pipeline`]: Streaming JSONL build
//! - [`persistence`]: Dataset writers and the build manifest
//! - [`config`]: Configuration loading and validation
//! - [`events`]: Event bus for progress reporting
//! - [`error`]: Unified error types
//!
//! # Architecture
//!
//! Every record is handled on its own: options are extracted first, the
//! answer is decoded against the options that are present, the fallback
//! runs only when decoding yields nothing, and the projector emits all three
//! rows from the same resolved answer.

// Pure record processing (no I/O)
pub mod decoder;
pub mod fallback;
pub mod identity;
pub mod options;
pub mod projector;
pub mod sanitize;
pub mod types;

// Error types (depends on config)
pub mod config;
pub mod error;

// Build execution
pub mod events;
pub mod persistence;
pub mod pipeline;
pub mod stats;

pub use config::{BuildConfig, ConfigOverrides, MalformedPolicy, QuizforgeConfig};
pub use decoder::{decode_answer, DecodeStrategy, Decoded, DecoderOptions, RawAnswer};
pub use error::{QuizforgeError, Result};
pub use options::{Letter, PresentMask};
pub use pipeline::{BuildReport, Pipeline};
pub use projector::{project, project_record, resolve_record, ResolvedRecord};
