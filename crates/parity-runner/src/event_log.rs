//! Append-only JSONL log of spot-test runs at `.parity/runs/events.jsonl`.

use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

/// A run event. Serialized as tagged JSON (`"type": "run_start"`, etc.).
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    RunStart {
        seeds: Vec<u64>,
        command_count: usize,
        model_only: bool,
    },
    SeedStart {
        seed: u64,
        commands: usize,
    },
    SeedComplete {
        seed: u64,
        parity_score: Option<f64>,
        differences: usize,
        duration_ms: u64,
    },
    RunComplete {
        parity_score: f64,
        passed: bool,
        duration_ms: u64,
    },
    RunFailed {
        error: String,
    },
}

/// Adds sequence number and timestamp to each event.
#[derive(Debug, Serialize)]
pub struct FullEvent {
    pub seq: u32,
    pub ts: String,
    #[serde(flatten)]
    pub event: Event,
}

pub struct RunLog {
    path: PathBuf,
    seq: AtomicU32,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seq: AtomicU32::new(0),
        }
    }

    /// Log under the project's `.parity/` directory.
    pub fn for_project(root: &Path) -> Self {
        Self::new(parity_store::run_log_path(root))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Best-effort: a failed write is logged and otherwise ignored.
    pub fn record(&self, event: Event) {
        let full = FullEvent {
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
            ts: parity_core::now_rfc3339(),
            event,
        };
        let written = serde_json::to_string(&full)
            .map_err(std::io::Error::from)
            .and_then(|line| append_line(&self.path, &line));
        if let Err(e) = written {
            tracing::debug!(path = %self.path.display(), error = %e, "run log write failed");
        }
    }
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")
}
