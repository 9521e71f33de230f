//! Indicatif-based progress display for the CLI.
//!
//! Receives build events via a tokio channel and keeps a spinner with
//! running counts up to date.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use quizforge_core::decoder::DecodeStrategy;
use quizforge_core::events::BuildEvent;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

#[derive(Default)]
struct Counters {
    projected: u64,
    unresolved: u64,
    fallback: u64,
    skipped: u64,
    duplicates: u64,
}

/// Progress display using indicatif for rich terminal output.
pub struct ProgressDisplay {
    bar: ProgressBar,
    counters: Counters,
    start_time: Option<Instant>,
}

impl Default for ProgressDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressDisplay {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Self {
            bar,
            counters: Counters::default(),
            start_time: None,
        }
    }

    /// Process events until the channel closes.
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<BuildEvent>) {
        while let Some(event) = rx.recv().await {
            self.handle_event(event);
        }
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }

    fn handle_event(&mut self, event: BuildEvent) {
        match event {
            BuildEvent::Started { input } => {
                self.start_time = Some(Instant::now());
                self.bar.enable_steady_tick(Duration::from_millis(120));
                self.bar.println(format!(
                    "{} Building datasets from {}",
                    style("→").cyan().bold(),
                    style(input.display()).bold()
                ));
            }
            BuildEvent::RecordProjected {
                strategy, answers, ..
            } => {
                self.counters.projected += 1;
                if answers == 0 {
                    self.counters.unresolved += 1;
                }
                if strategy == DecodeStrategy::Fallback {
                    self.counters.fallback += 1;
                }
            }
            BuildEvent::LineSkipped { line, reason } => {
                self.counters.skipped += 1;
                self.bar.println(format!(
                    "{} line {line}: {reason}",
                    style("⚠").yellow()
                ));
            }
            BuildEvent::DuplicateDropped { .. } => {
                self.counters.duplicates += 1;
            }
            BuildEvent::Completed { .. } => {
                self.bar.finish_and_clear();
                return;
            }
        }
        self.update_message();
    }

    fn update_message(&self) {
        let c = &self.counters;
        let elapsed = self
            .start_time
            .map(|t| t.elapsed().as_secs())
            .unwrap_or(0);
        let msg = format!(
            "{} {} {} {} {} {} {} {} {}",
            style("✓").green(),
            style(c.projected).green().bold(),
            style("∅").red(),
            style(c.unresolved).red().bold(),
            style("≈").cyan(),
            style(c.fallback).cyan(),
            style("⚠").yellow(),
            style(c.skipped + c.duplicates).yellow(),
            style(format!("{elapsed}s")).dim(),
        );
        self.bar.set_message(msg);
    }
}
