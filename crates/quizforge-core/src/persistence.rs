//! JSONL writers for the generated datasets and the build manifest.

use crate::config::BuildConfig;
use crate::error::Result;
use crate::stats::BuildStats;
use crate::types::{EvaluationItem, ProjectedRows};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

fn create_file(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}

fn write_line<T: Serialize>(out: &mut BufWriter<File>, row: &T) -> Result<()> {
    let line = serde_json::to_string(row)?;
    writeln!(out, "{line}")?;
    Ok(())
}

/// The three dataset outputs of a build, truncated on creation.
#[derive(Debug)]
pub struct DatasetWriter {
    instruct: BufWriter<File>,
    rag: BufWriter<File>,
    eval: BufWriter<File>,
}

impl DatasetWriter {
    pub fn create(config: &BuildConfig) -> Result<Self> {
        Ok(Self {
            instruct: create_file(&config.instruct_output)?,
            rag: create_file(&config.rag_output)?,
            eval: create_file(&config.eval_output)?,
        })
    }

    pub fn append(&mut self, rows: &ProjectedRows) -> Result<()> {
        write_line(&mut self.instruct, &rows.instruction)?;
        write_line(&mut self.rag, &rows.retrieval)?;
        write_line(&mut self.eval, &rows.evaluation)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.instruct.flush()?;
        self.rag.flush()?;
        self.eval.flush()?;
        Ok(())
    }
}

/// Write raw records back out as JSONL.
pub fn write_records(path: &Path, records: &[Map<String, Value>]) -> Result<()> {
    let mut out = create_file(path)?;
    for record in records {
        write_line(&mut out, record)?;
    }
    out.flush()?;
    Ok(())
}

pub fn load_evaluation_items(path: &Path) -> Result<Vec<EvaluationItem>> {
    let reader = BufReader::new(File::open(path)?);
    let mut items = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        items.push(serde_json::from_str(&line)?);
    }
    Ok(items)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManifestOutputs {
    pub instruct: PathBuf,
    pub rag: PathBuf,
    pub eval: PathBuf,
}

/// Written next to the outputs after a build.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildManifest {
    pub input: PathBuf,
    pub outputs: ManifestOutputs,
    pub config_fingerprint: String,
    pub started_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub stats: BuildStats,
}

impl BuildManifest {
    pub fn new(config: &BuildConfig) -> Result<Self> {
        Ok(Self {
            input: config.input.clone(),
            outputs: ManifestOutputs {
                instruct: config.instruct_output.clone(),
                rag: config.rag_output.clone(),
                eval: config.eval_output.clone(),
            },
            config_fingerprint: compute_config_fingerprint(config)?,
            started_at: iso_timestamp_now(),
            completed_at: None,
            stats: BuildStats::default(),
        })
    }

    pub fn complete(&mut self, stats: BuildStats) {
        self.completed_at = Some(iso_timestamp_now());
        self.stats = stats;
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let mut out = create_file(path)?;
        let json = serde_json::to_string_pretty(self)?;
        out.write_all(json.as_bytes())?;
        out.flush()?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&data)?))
    }
}

pub fn iso_timestamp_now() -> String {
    Utc::now().to_rfc3339()
}

pub fn compute_config_fingerprint(config: &BuildConfig) -> Result<String> {
    let value = serde_json::to_value(config)?;
    let canonical = canonical_json_string(&value);
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

fn canonical_json_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => serde_json::to_string(s).unwrap_or_default(),
        Value::Array(arr) => {
            let inner: Vec<String> = arr.iter().map(canonical_json_string).collect();
            format!("[{}]", inner.join(","))
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let parts: Vec<String> = entries
                .iter()
                .map(|(k, v)| {
                    format!(
                        "{}:{}",
                        serde_json::to_string(k).unwrap_or_default(),
                        canonical_json_string(v)
                    )
                })
                .collect();
            format!("{{{}}}", parts.join(","))
        }
    }
}
