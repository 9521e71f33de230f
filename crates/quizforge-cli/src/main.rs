//! CLI for quizforge - builds training, retrieval and evaluation datasets
//! from scraped quiz records.

mod formatting;
mod progress;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use formatting::{print_build_summary, print_decoded, print_eval_summary};
use progress::ProgressDisplay;
use quizforge_core::decoder::{decode_answer, DecoderOptions, RawAnswer};
use quizforge_core::options::{Letter, PresentMask};
use quizforge_core::persistence::{load_evaluation_items, write_records};
use quizforge_core::pipeline::dedup_file;
use quizforge_core::stats::summarize_eval;
use quizforge_core::{ConfigOverrides, MalformedPolicy, Pipeline, QuizforgeConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "quizforge.yaml";

#[derive(Debug, Parser)]
#[command(
    name = "quizforge",
    about = "Normalize scraped quiz records into instruction, retrieval and evaluation datasets"
)]
struct Cli {
    /// Path to the configuration file. Optional unless given explicitly.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the three datasets from a raw JSONL file.
    Build {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        instruct_out: Option<PathBuf>,
        #[arg(long)]
        rag_out: Option<PathBuf>,
        #[arg(long)]
        eval_out: Option<PathBuf>,
        /// Disable the shift-by-four bitmask heuristic.
        #[arg(long)]
        no_shift: bool,
        /// Abort on the first malformed line instead of skipping it.
        #[arg(long)]
        fail_fast: bool,
        /// Drop duplicate records before projecting.
        #[arg(long)]
        dedup: bool,
        /// Stop after this many records.
        #[arg(long)]
        limit: Option<usize>,
        /// Do not write manifest.json.
        #[arg(long)]
        no_manifest: bool,
        /// Hide the progress spinner.
        #[arg(long)]
        quiet: bool,
    },

    /// Decode a single answer value, for checking encodings by hand.
    Decode {
        /// Answer as stored in the record: letters (e.g. AC) or an integer (e.g. 48, 0x30).
        answer: String,
        /// Letters of the options that are present.
        #[arg(long, default_value = "ABCD")]
        options: String,
        /// Treat the answer as text even if it looks numeric.
        #[arg(long)]
        text: bool,
        #[arg(long)]
        no_shift: bool,
    },

    /// Remove duplicate records from a raw JSONL file.
    Dedup {
        input: PathBuf,
        output: PathBuf,
        /// Abort on the first malformed line instead of skipping it.
        #[arg(long)]
        fail_fast: bool,
    },

    /// Summarize an evaluation file.
    Stats {
        eval_file: PathBuf,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Load and print the effective configuration.
    ShowConfig,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(cli_path: &Option<PathBuf>, overrides: ConfigOverrides) -> Result<QuizforgeConfig> {
    let (path, required) = match cli_path {
        Some(p) => (p.clone(), true),
        None => (PathBuf::from(DEFAULT_CONFIG), false),
    };
    QuizforgeConfig::load(&path, required, overrides)
        .with_context(|| format!("loading config {}", path.display()))
}

/// Parse the `--options` letter list into a present mask.
fn parse_mask(options: &str) -> Result<PresentMask> {
    let mut letters = Vec::new();
    for c in options.chars().filter(|c| !c.is_whitespace() && *c != ',') {
        let letter =
            Letter::from_char(c).ok_or_else(|| anyhow!("invalid option letter: {c:?}"))?;
        letters.push(letter);
    }
    Ok(PresentMask::from_letters(&letters))
}

/// Integers (decimal or `0x` hex) decode as integers, anything else as text.
fn parse_answer(raw: &str, force_text: bool) -> RawAnswer {
    let trimmed = raw.trim();
    if force_text {
        return RawAnswer::Text(raw.to_string());
    }
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => i128::from_str_radix(hex, 16).ok(),
        None => trimmed.parse::<i128>().ok(),
    };
    match parsed {
        Some(value) => RawAnswer::Integer(value),
        None => RawAnswer::Text(raw.to_string()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Build {
            input,
            instruct_out,
            rag_out,
            eval_out,
            no_shift,
            fail_fast,
            dedup,
            limit,
            no_manifest,
            quiet,
        } => {
            let overrides = ConfigOverrides {
                input,
                instruct_output: instruct_out,
                rag_output: rag_out,
                eval_output: eval_out,
                allow_shift: no_shift.then_some(false),
                malformed: fail_fast.then_some(MalformedPolicy::Fail),
                dedup: dedup.then_some(true),
                manifest: no_manifest.then_some(false),
                limit,
            };
            let config = load_config(&cli.config, overrides)?;
            info!(
                input = %config.build.input.display(),
                allow_shift = config.build.allow_shift,
                "configuration loaded"
            );

            let mut pipeline = Pipeline::new(config.build);
            let events = (!quiet).then(|| pipeline.subscribe());

            let rt = tokio::runtime::Runtime::new()?;
            let report = rt.block_on(async {
                let display_handle = events.map(|rx| tokio::spawn(ProgressDisplay::new().run(rx)));

                let result = tokio::task::spawn_blocking(move || pipeline.run()).await;

                if let Some(handle) = display_handle {
                    let _ = handle.await;
                }

                result
            })??;

            print_build_summary(&report);
        }
        Command::Decode {
            answer,
            options,
            text,
            no_shift,
        } => {
            let mask = parse_mask(&options)?;
            let raw = parse_answer(&answer, text);
            let decoded = decode_answer(
                &raw,
                &mask,
                &DecoderOptions {
                    allow_shift: !no_shift,
                },
            );
            print_decoded(&raw, &decoded);
        }
        Command::Dedup {
            input,
            output,
            fail_fast,
        } => {
            let policy = if fail_fast {
                MalformedPolicy::Fail
            } else {
                MalformedPolicy::Skip
            };
            let outcome = dedup_file(&input, policy)?;
            write_records(&output, &outcome.records)?;
            println!(
                "Kept {} record(s), dropped {} duplicate(s), skipped {} malformed line(s) -> {}",
                outcome.records.len(),
                outcome.duplicates,
                outcome.malformed,
                output.display()
            );
        }
        Command::Stats { eval_file, format } => {
            let items = load_evaluation_items(&eval_file)
                .with_context(|| format!("reading {}", eval_file.display()))?;
            let summary = summarize_eval(&items);
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
                OutputFormat::Text => print_eval_summary(&summary),
            }
        }
        Command::ShowConfig => {
            let config = load_config(&cli.config, ConfigOverrides::default())?;
            let yaml = serde_yaml::to_string(&config)?;
            println!("{yaml}");
        }
    }

    Ok(())
}
