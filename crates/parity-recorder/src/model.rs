use crate::engine::{CommandOutput, EngineFactory, GameEngine};
use crate::{RecordOptions, Recorder};
use parity_core::{
    now_rfc3339, transcript_id, ParityError, Source, Transcript, TranscriptEntry,
    TranscriptMetadata,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Records an in-process engine. Commands run one at a time on the blocking
/// pool, each under the per-command timeout.
pub struct ModelRecorder {
    factory: Arc<dyn EngineFactory>,
}

impl ModelRecorder {
    pub fn new(factory: Arc<dyn EngineFactory>) -> Self {
        Self { factory }
    }

    fn unavailable(&self, reason: impl Into<String>) -> ParityError {
        ParityError::RecorderUnavailable {
            recorder: Source::Model,
            reason: reason.into(),
        }
    }

    /// Run one engine call off the async runtime. The engine is handed back
    /// with the output; after a timeout it is abandoned with its thread.
    async fn step(
        &self,
        mut engine: Box<dyn GameEngine>,
        command: &str,
        options: &RecordOptions,
        cancel: &CancellationToken,
    ) -> Result<(Box<dyn GameEngine>, CommandOutput), ParityError> {
        let cmd = command.to_string();
        let task = tokio::task::spawn_blocking(move || {
            let out = if cmd.is_empty() {
                engine.initial_output()
            } else {
                engine.execute(&cmd)
            };
            (engine, out)
        });
        let timed_out = || ParityError::RecorderTimeout {
            recorder: Source::Model,
            command: command.to_string(),
            timeout_ms: options.timeout_ms(),
        };
        tokio::select! {
            joined = tokio::time::timeout(options.command_timeout, task) => match joined {
                Ok(Ok(pair)) => Ok(pair),
                Ok(Err(e)) => Err(self.unavailable(format!("engine task failed: {e}"))),
                Err(_) => Err(timed_out()),
            },
            _ = cancel.cancelled() => Err(timed_out()),
        }
    }
}

#[async_trait::async_trait]
impl Recorder for ModelRecorder {
    fn source(&self) -> Source {
        Source::Model
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn record(
        &self,
        commands: &[String],
        options: &RecordOptions,
        cancel: CancellationToken,
    ) -> Result<Transcript, ParityError> {
        let start_time = now_rfc3339();
        let label = self.factory.describe();
        let mut engine = self
            .factory
            .create(options.seed)
            .map_err(|e| self.unavailable(format!("{e:#}")))?;

        let mut entries = Vec::with_capacity(commands.len() + 1);
        let (e, intro) = self.step(engine, "", options, &cancel).await?;
        engine = e;
        entries.push(
            TranscriptEntry::new(0, "", intro.text, intro.turn).with_timestamp(now_rfc3339()),
        );

        for (i, command) in commands.iter().enumerate() {
            let (e, out) = self.step(engine, command, options, &cancel).await?;
            engine = e;
            entries.push(
                TranscriptEntry::new(i + 1, command.as_str(), out.text, out.turn)
                    .with_timestamp(now_rfc3339()),
            );
        }
        tracing::debug!(commands = commands.len(), label = %label, "model transcript recorded");

        Ok(Transcript {
            id: transcript_id(Source::Model, options.seed, &label),
            source: Source::Model,
            start_time,
            end_time: now_rfc3339(),
            entries,
            metadata: TranscriptMetadata {
                seed: options.seed,
                command_count: commands.len(),
                label: Some(label),
                terminated_early: false,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ScriptedEngine;
    use std::time::Duration;

    struct BrokenFactory;

    impl EngineFactory for BrokenFactory {
        fn create(&self, _seed: Option<u64>) -> anyhow::Result<Box<dyn GameEngine>> {
            anyhow::bail!("story file not loaded")
        }
    }

    fn cmds(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn records_initial_output_and_each_command() {
        let engine = ScriptedEngine::new("West of House").respond("take lamp", "Taken.");
        let rec = ModelRecorder::new(Arc::new(engine));
        let t = rec
            .record(
                &cmds(&["take lamp", "xyzzy"]),
                &RecordOptions::default().with_seed(7),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(t.source, Source::Model);
        assert_eq!(t.len(), 3);
        assert!(t.is_contiguous());
        assert!(t.is_complete());
        assert_eq!(t.entries[0].command, "");
        assert_eq!(t.entries[0].output, "West of House");
        assert_eq!(t.entries[1].output, "Taken.");
        assert_eq!(t.entries[2].turn_number, 2);
        assert_eq!(t.metadata.seed, Some(7));
    }

    #[tokio::test]
    async fn same_seed_same_id() {
        let rec = ModelRecorder::new(Arc::new(ScriptedEngine::new("hi")));
        let opts = RecordOptions::default().with_seed(3);
        let a = rec.record(&[], &opts, CancellationToken::new()).await.unwrap();
        let b = rec.record(&[], &opts, CancellationToken::new()).await.unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.len(), 1);
    }

    #[tokio::test]
    async fn factory_failure_is_unavailable() {
        let rec = ModelRecorder::new(Arc::new(BrokenFactory));
        let err = rec
            .record(&cmds(&["look"]), &RecordOptions::default(), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
        assert!(err.to_string().contains("story file not loaded"));
    }

    #[tokio::test]
    async fn slow_engine_times_out() {
        let engine = ScriptedEngine::new("hi").with_delay(Duration::from_millis(500));
        let rec = ModelRecorder::new(Arc::new(engine));
        let opts = RecordOptions::default().with_timeout(Duration::from_millis(50));
        let err = rec
            .record(&cmds(&["wait"]), &opts, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ParityError::RecorderTimeout { ref command, timeout_ms: 50, .. } if command == "wait"
        ));
    }

    #[tokio::test]
    async fn cancelled_recording_stops() {
        let engine = ScriptedEngine::new("hi").with_delay(Duration::from_millis(200));
        let rec = ModelRecorder::new(Arc::new(engine));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = rec
            .record(&cmds(&["wait"]), &RecordOptions::default(), cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ParityError::RecorderTimeout { .. }));
    }
}
