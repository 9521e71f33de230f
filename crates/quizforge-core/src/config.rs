//! Configuration loading and models for quizforge.
//!
//! Configuration is loaded via figment from multiple layers:
//! 1. YAML file (optional base configuration)
//! 2. Environment variables (QUIZFORGE_ prefix, __ as nested separator)
//! 3. CLI overrides (passed programmatically)

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Figment(#[from] figment::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// DEFAULTS (all in one place)
// ============================================================================

fn default_input() -> PathBuf {
    PathBuf::from("data/raw.jsonl")
}

fn default_instruct_output() -> PathBuf {
    PathBuf::from("data/train_instruct.jsonl")
}

fn default_rag_output() -> PathBuf {
    PathBuf::from("data/rag_corpus.jsonl")
}

fn default_eval_output() -> PathBuf {
    PathBuf::from("data/eval_set.jsonl")
}

fn default_allow_shift() -> bool {
    true
}

fn default_manifest() -> bool {
    true
}

// ============================================================================
// BUILD CONFIG
// ============================================================================

/// What to do with an input line that is not a JSON object.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Log, count and continue with the next line.
    #[default]
    Skip,
    /// Abort the build with an error.
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildConfig {
    #[serde(default = "default_input")]
    pub input: PathBuf,
    #[serde(default = "default_instruct_output")]
    pub instruct_output: PathBuf,
    #[serde(default = "default_rag_output")]
    pub rag_output: PathBuf,
    #[serde(default = "default_eval_output")]
    pub eval_output: PathBuf,
    #[serde(default = "default_allow_shift")]
    pub allow_shift: bool,
    #[serde(default)]
    pub malformed: MalformedPolicy,
    #[serde(default)]
    pub dedup: bool,
    #[serde(default = "default_manifest")]
    pub manifest: bool,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            instruct_output: default_instruct_output(),
            rag_output: default_rag_output(),
            eval_output: default_eval_output(),
            allow_shift: default_allow_shift(),
            malformed: MalformedPolicy::default(),
            dedup: false,
            manifest: default_manifest(),
            limit: None,
        }
    }
}

impl BuildConfig {
    /// Manifest lives next to the evaluation file.
    pub fn manifest_path(&self) -> PathBuf {
        self.eval_output
            .parent()
            .map(|p| p.join("manifest.json"))
            .unwrap_or_else(|| PathBuf::from("manifest.json"))
    }

    fn resolve_paths(&mut self, base: &Path) {
        for path in [
            &mut self.input,
            &mut self.instruct_output,
            &mut self.rag_output,
            &mut self.eval_output,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

// ============================================================================
// ROOT CONFIG
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QuizforgeConfig {
    #[serde(default)]
    pub build: BuildConfig,
}

// ============================================================================
// CLI OVERRIDES
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruct_output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rag_output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_shift: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub malformed: Option<MalformedPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedup: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl ConfigOverrides {
    fn is_empty(&self) -> bool {
        self.input.is_none()
            && self.instruct_output.is_none()
            && self.rag_output.is_none()
            && self.eval_output.is_none()
            && self.allow_shift.is_none()
            && self.malformed.is_none()
            && self.dedup.is_none()
            && self.manifest.is_none()
            && self.limit.is_none()
    }
}

// ============================================================================
// LOADING
// ============================================================================

impl QuizforgeConfig {
    /// Load configuration from an optional YAML file plus environment and
    /// overrides.
    ///
    /// With a config file present, relative paths from the file, the
    /// environment and the defaults resolve against the file's directory.
    /// Override paths are taken as given. When `required` is false a
    /// missing file falls back to defaults.
    pub fn load(
        path: impl AsRef<Path>,
        required: bool,
        overrides: ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut figment = Figment::from(Serialized::defaults(QuizforgeConfig::default()));

        let file_present = path.is_file();
        if file_present {
            let contents = std::fs::read_to_string(path)?;
            let interpolated = interpolate_env_vars(&contents);
            figment = figment.merge(Yaml::string(&interpolated));
        } else if required {
            return Err(ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("config file not found: {}", path.display()),
            )));
        }

        figment = figment.merge(Env::prefixed("QUIZFORGE_").split("__"));

        let mut cfg: QuizforgeConfig = figment.extract()?;

        if file_present {
            let base = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            cfg.build.resolve_paths(&base);
        }

        if !overrides.is_empty() {
            #[derive(Serialize)]
            struct BuildOverride {
                build: ConfigOverrides,
            }

            cfg = Figment::from(Serialized::defaults(cfg))
                .merge(Serialized::defaults(BuildOverride { build: overrides }))
                .extract()?;
        }

        validate_config(&cfg)?;
        Ok(cfg)
    }

    /// Defaults plus environment only, no file.
    pub fn from_overrides(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        Self::load(Path::new(""), false, overrides)
    }
}

fn interpolate_env_vars(input: &str) -> String {
    use once_cell::sync::Lazy;
    use regex::Regex;
    use std::env;

    static ENV_VAR_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("valid regex")
    });

    ENV_VAR_RE
        .replace_all(input, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default_val = caps.get(2).map(|m| m.as_str());
            match env::var(var_name) {
                Ok(val) => val,
                Err(_) => default_val.unwrap_or("").to_string(),
            }
        })
        .to_string()
}

fn validate_config(cfg: &QuizforgeConfig) -> Result<(), ConfigError> {
    let b = &cfg.build;
    let paths = [
        ("input", &b.input),
        ("instruct_output", &b.instruct_output),
        ("rag_output", &b.rag_output),
        ("eval_output", &b.eval_output),
    ];
    for (name, path) in &paths {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(format!("{name} path must not be empty")));
        }
    }
    for (i, (name_a, a)) in paths.iter().enumerate() {
        for (name_b, b) in &paths[i + 1..] {
            if a == b {
                return Err(ConfigError::Invalid(format!(
                    "{name_a} and {name_b} point at the same file: {}",
                    a.display()
                )));
            }
        }
    }
    Ok(())
}
