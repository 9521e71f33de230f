//! Event bus for build progress.
//!
//! The pipeline publishes events as it streams records; subscribers such as
//! the CLI progress display consume them from unbounded channels. Sending
//! never blocks, so the pipeline stays synchronous.

use crate::decoder::DecodeStrategy;
use crate::stats::BuildStats;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Events emitted during a dataset build.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum BuildEvent {
    /// Input opened and outputs created.
    Started { input: PathBuf },

    /// A record was written to all three outputs.
    RecordProjected {
        line: usize,
        id: String,
        strategy: DecodeStrategy,
        answers: usize,
    },

    /// A malformed line was skipped.
    LineSkipped { line: usize, reason: String },

    /// A record was dropped as a duplicate.
    DuplicateDropped { line: usize },

    /// Build finished and outputs flushed.
    Completed { stats: BuildStats },
}

/// Broadcasts events to every subscriber.
#[derive(Debug, Default)]
pub struct EventBus {
    senders: Vec<mpsc::UnboundedSender<BuildEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events, returning a receiver.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<BuildEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.push(tx);
        rx
    }

    pub fn emit(&self, event: BuildEvent) {
        for sender in &self.senders {
            // Ignore send errors - subscriber may have dropped
            let _ = sender.send(event.clone());
        }
    }
}
