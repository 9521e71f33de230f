//! Streaming build: raw JSONL in, three dataset files out.

use crate::config::{BuildConfig, MalformedPolicy};
use crate::decoder::DecoderOptions;
use crate::error::{QuizforgeError, Result};
use crate::events::{BuildEvent, EventBus};
use crate::identity::Deduplicator;
use crate::persistence::{BuildManifest, DatasetWriter};
use crate::projector::{project, resolve_record};
use crate::stats::BuildStats;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Result of a finished build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub stats: BuildStats,
    pub manifest: Option<BuildManifest>,
}

/// Parse one input line; the error carries a readable reason.
fn parse_record(line: &str) -> std::result::Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!("expected a JSON object, got {}", json_kind(&other))),
        Err(e) => Err(e.to_string()),
    }
}

/// What a single raw input line turned out to be.
enum RawLine {
    Blank,
    Record(Map<String, Value>),
    Malformed(String),
}

/// Classify raw line bytes. Invalid UTF-8 is malformed, like bad JSON.
fn classify_line(bytes: Vec<u8>) -> RawLine {
    let line = match String::from_utf8(bytes) {
        Ok(line) => line,
        Err(e) => return RawLine::Malformed(format!("invalid UTF-8: {}", e.utf8_error())),
    };
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return RawLine::Blank;
    }
    match parse_record(trimmed) {
        Ok(record) => RawLine::Record(record),
        Err(reason) => RawLine::Malformed(reason),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// One dataset build over a single input file.
pub struct Pipeline {
    config: BuildConfig,
    events: EventBus,
}

impl Pipeline {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            events: EventBus::new(),
        }
    }

    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<BuildEvent> {
        self.events.subscribe()
    }

    /// Run the build. Consumes the pipeline so subscribers see their channel
    /// close once the build is done.
    pub fn run(self) -> Result<BuildReport> {
        let config = &self.config;
        let decoder = DecoderOptions {
            allow_shift: config.allow_shift,
        };
        let mut manifest = if config.manifest {
            Some(BuildManifest::new(config)?)
        } else {
            None
        };

        let reader = BufReader::new(File::open(&config.input)?);
        let mut writer = DatasetWriter::create(config)?;
        let mut dedup = config.dedup.then(Deduplicator::new);
        let mut stats = BuildStats::default();

        info!(input = %config.input.display(), "starting dataset build");
        self.events.emit(BuildEvent::Started {
            input: config.input.clone(),
        });

        for (idx, chunk) in reader.split(b'\n').enumerate() {
            if config.limit.is_some_and(|limit| stats.records_projected >= limit as u64) {
                debug!(limit = ?config.limit, "record limit reached");
                break;
            }
            let line_no = idx + 1;
            let chunk = chunk?;
            stats.lines_read += 1;

            let record = match classify_line(chunk) {
                RawLine::Record(record) => record,
                RawLine::Blank => {
                    stats.blank_lines += 1;
                    continue;
                }
                RawLine::Malformed(reason) => match config.malformed {
                    MalformedPolicy::Skip => {
                        warn!(line = line_no, %reason, "skipping malformed line");
                        stats.malformed_lines += 1;
                        self.events.emit(BuildEvent::LineSkipped {
                            line: line_no,
                            reason,
                        });
                        continue;
                    }
                    MalformedPolicy::Fail => {
                        return Err(QuizforgeError::MalformedLine {
                            line: line_no,
                            reason,
                        });
                    }
                },
            };

            if let Some(dedup) = dedup.as_mut() {
                if !dedup.insert(&record) {
                    stats.duplicates_dropped += 1;
                    self.events
                        .emit(BuildEvent::DuplicateDropped { line: line_no });
                    continue;
                }
            }

            let resolved = resolve_record(&record, &decoder);
            if resolved.answer.is_empty() {
                debug!(line = line_no, id = %resolved.id, "answer unresolved");
            }
            writer.append(&project(&resolved))?;
            stats.record(
                resolved.strategy,
                resolved.answer.len(),
                resolved.options.entries.len(),
            );
            self.events.emit(BuildEvent::RecordProjected {
                line: line_no,
                id: resolved.id,
                strategy: resolved.strategy,
                answers: resolved.answer.len(),
            });
        }

        writer.flush()?;

        if let Some(manifest) = manifest.as_mut() {
            manifest.complete(stats.clone());
            manifest.write(&config.manifest_path())?;
        }

        info!(
            records = stats.records_projected,
            unresolved = stats.unresolved,
            malformed = stats.malformed_lines,
            "dataset build finished"
        );
        self.events.emit(BuildEvent::Completed {
            stats: stats.clone(),
        });

        Ok(BuildReport { stats, manifest })
    }
}

/// Outcome of [`dedup_file`].
#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    pub records: Vec<Map<String, Value>>,
    pub duplicates: u64,
    pub malformed: u64,
}

/// Read a raw JSONL file and keep the first record per identity key.
///
/// Malformed lines follow `policy` the same way a build does.
pub fn dedup_file(input: &Path, policy: MalformedPolicy) -> Result<DedupOutcome> {
    let reader = BufReader::new(File::open(input)?);
    let mut dedup = Deduplicator::new();
    let mut outcome = DedupOutcome::default();
    for (idx, chunk) in reader.split(b'\n').enumerate() {
        match classify_line(chunk?) {
            RawLine::Blank => {}
            RawLine::Record(record) => {
                if dedup.insert(&record) {
                    outcome.records.push(record);
                } else {
                    outcome.duplicates += 1;
                }
            }
            RawLine::Malformed(reason) => match policy {
                MalformedPolicy::Skip => {
                    warn!(line = idx + 1, %reason, "skipping malformed line");
                    outcome.malformed += 1;
                }
                MalformedPolicy::Fail => {
                    return Err(QuizforgeError::MalformedLine {
                        line: idx + 1,
                        reason,
                    });
                }
            },
        }
    }
    Ok(outcome)
}
