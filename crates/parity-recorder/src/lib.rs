//! Recorders run a command sequence against one implementation and capture
//! its output as a [`Transcript`].
//!
//! Two backings exist: an in-process [`GameEngine`] ([`ModelRecorder`]) and a
//! line-oriented REPL subprocess ([`ProcessRecorder`]), which is how the
//! reference interpreter is driven.

pub mod engine;
pub mod model;
pub mod process;

pub use engine::{CommandOutput, EngineFactory, GameEngine, ScriptedEngine};
pub use model::ModelRecorder;
pub use process::{ProcessRecorder, RecorderConfig};

use parity_core::{ParityError, Source, Transcript};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-run recording options.
#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub seed: Option<u64>,
    /// Budget for observing one command's complete response.
    pub command_timeout: Duration,
}

impl Default for RecordOptions {
    fn default() -> Self {
        Self {
            seed: None,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

impl RecordOptions {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub(crate) fn timeout_ms(&self) -> u64 {
        u64::try_from(self.command_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Runs commands against one implementation.
///
/// `record` yields entry 0 for the initial output and one entry per command.
/// It fails with `RecorderUnavailable` when the implementation cannot be
/// reached and with `RecorderTimeout` when a response is not observed in
/// time or `cancel` fires.
#[async_trait::async_trait]
pub trait Recorder: Send + Sync {
    fn source(&self) -> Source;

    /// Cheap check that the backing implementation exists. Never starts it.
    fn is_available(&self) -> bool;

    async fn record(
        &self,
        commands: &[String],
        options: &RecordOptions,
        cancel: CancellationToken,
    ) -> Result<Transcript, ParityError>;
}
