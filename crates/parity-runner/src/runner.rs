use crate::commands::CommandGenerator;
use crate::config::SpotTestConfig;
use crate::event_log::{Event, RunLog};
use anyhow::Context;
use parity_core::{DiffReport, IssueAnalysis, ParityError, Recommendation, Source, Transcript};
use parity_diff::{IssueAnalyzer, RecommendationEngine, TranscriptComparator};
use parity_recorder::{RecordOptions, Recorder};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Time cancelled recorders get to kill and reap their processes.
pub const CLEANUP_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Both implementations recorded and compared.
    Differential,
    /// Reference unavailable; the model was exercised but nothing compared.
    ModelOnly,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedOutcome {
    pub seed: u64,
    pub commands: usize,
    pub model_entries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_entries: Option<usize>,
    /// Either implementation stopped before the command list ended.
    pub terminated_early: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<DiffReport>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotTestResult {
    pub mode: RunMode,
    pub seeds: Vec<SeedOutcome>,
    /// All per-seed reports combined.
    pub report: DiffReport,
    pub analysis: IssueAnalysis,
    pub recommendations: Vec<Recommendation>,
    pub passed: bool,
    pub pass_threshold: f64,
    pub duration_ms: u64,
}

type RecordedPair = (
    Result<Transcript, ParityError>,
    Option<Result<Transcript, ParityError>>,
);

/// Records both implementations per seed, compares, and analyzes.
pub struct SpotTestRunner {
    model: Arc<dyn Recorder>,
    reference: Arc<dyn Recorder>,
    config: SpotTestConfig,
    comparator: TranscriptComparator,
    analyzer: IssueAnalyzer,
    recommender: RecommendationEngine,
    log: Option<RunLog>,
}

impl SpotTestRunner {
    pub fn new(
        model: Arc<dyn Recorder>,
        reference: Arc<dyn Recorder>,
        config: SpotTestConfig,
    ) -> Self {
        let comparator = TranscriptComparator::new(config.compare.clone());
        Self {
            model,
            reference,
            config,
            comparator,
            analyzer: IssueAnalyzer::new(),
            recommender: RecommendationEngine::new(),
            log: None,
        }
    }

    pub fn with_run_log(mut self, log: RunLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn config(&self) -> &SpotTestConfig {
        &self.config
    }

    pub async fn run(&self, cancel: CancellationToken) -> anyhow::Result<SpotTestResult> {
        let result = self.run_seeds(cancel).await;
        if let Err(e) = &result {
            self.log(Event::RunFailed {
                error: format!("{e:#}"),
            });
        }
        result
    }

    async fn run_seeds(&self, cancel: CancellationToken) -> anyhow::Result<SpotTestResult> {
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + self.config.timeout;
        let seeds = self.config.effective_seeds();
        let count = self.config.effective_command_count();

        let mut mode = if self.reference.is_available() {
            RunMode::Differential
        } else {
            self.degrade("reference implementation not found")?
        };
        self.log(Event::RunStart {
            seeds: seeds.clone(),
            command_count: count,
            model_only: mode == RunMode::ModelOnly,
        });
        tracing::info!(?seeds, commands = count, ?mode, "spot test started");

        let mut outcomes = Vec::with_capacity(seeds.len());
        let mut reports = Vec::new();
        for &seed in &seeds {
            let seed_started = Instant::now();
            let commands = CommandGenerator::new(seed)
                .with_types(&self.config.command_types)
                .with_focus_areas(&self.config.focus_areas)
                .generate(count);
            self.log(Event::SeedStart {
                seed,
                commands: commands.len(),
            });

            let opts = RecordOptions::default()
                .with_seed(seed)
                .with_timeout(self.config.command_timeout);
            let (model, reference) = self
                .record_pair(mode, &commands, &opts, deadline, &cancel)
                .await?;
            let model = model?;
            let reference = match reference {
                Some(Ok(t)) => Some(t),
                Some(Err(e)) if e.is_unavailable() => {
                    mode = self.degrade(&e.to_string())?;
                    None
                }
                Some(Err(e)) => return Err(e.into()),
                None => None,
            };

            self.save_transcripts(&model, reference.as_ref())?;
            let report = reference.as_ref().map(|r| self.comparator.compare(r, &model));
            let differences = report.as_ref().map_or(0, |r| r.differences.len());
            let duration_ms = seed_started.elapsed().as_millis() as u64;
            self.log(Event::SeedComplete {
                seed,
                parity_score: report.as_ref().map(|r| r.parity_score),
                differences,
                duration_ms,
            });
            tracing::info!(
                seed,
                parity = report.as_ref().map(|r| r.parity_score),
                differences,
                duration_ms,
                "seed complete"
            );

            if let Some(r) = &report {
                reports.push(r.clone());
            }
            outcomes.push(SeedOutcome {
                seed,
                commands: commands.len(),
                model_entries: model.len(),
                reference_entries: reference.as_ref().map(Transcript::len),
                terminated_early: model.metadata.terminated_early
                    || reference
                        .as_ref()
                        .is_some_and(|r| r.metadata.terminated_early),
                report,
            });
        }

        let report = if reports.is_empty() {
            DiffReport::empty("", "")
        } else {
            DiffReport::combine(&reports)
        };
        let analysis = self.analyzer.analyze_report(&report);
        let recommendations = self.recommender.recommend(&analysis);
        let passed = self.evaluate(&report, reports.is_empty());
        let duration_ms = started.elapsed().as_millis() as u64;

        self.log(Event::RunComplete {
            parity_score: report.parity_score,
            passed,
            duration_ms,
        });
        tracing::info!(
            parity = report.parity_score,
            differences = report.differences.len(),
            passed,
            duration_ms,
            "spot test finished"
        );

        Ok(SpotTestResult {
            mode,
            seeds: outcomes,
            report,
            analysis,
            recommendations,
            passed,
            pass_threshold: self.config.pass_threshold,
            duration_ms,
        })
    }

    /// Record model and (in differential mode) reference concurrently, racing
    /// the run deadline. On expiry both are cancelled and given
    /// [`CLEANUP_GRACE`] to reap their processes before the timeout is
    /// reported.
    async fn record_pair(
        &self,
        mode: RunMode,
        commands: &[String],
        opts: &RecordOptions,
        deadline: tokio::time::Instant,
        cancel: &CancellationToken,
    ) -> Result<RecordedPair, ParityError> {
        let token = cancel.child_token();
        let with_reference = mode == RunMode::Differential;
        let joined = async {
            let model = self.model.record(commands, opts, token.clone());
            let reference = async {
                if with_reference {
                    Some(self.reference.record(commands, opts, token.clone()).await)
                } else {
                    None
                }
            };
            tokio::join!(model, reference)
        };
        tokio::pin!(joined);

        tokio::select! {
            pair = &mut joined => Ok(pair),
            _ = tokio::time::sleep_until(deadline) => {
                token.cancel();
                if tokio::time::timeout(CLEANUP_GRACE, &mut joined).await.is_err() {
                    tracing::warn!("recorders still running after the cleanup grace period");
                }
                Err(ParityError::RecorderTimeout {
                    recorder: if with_reference { Source::Reference } else { Source::Model },
                    command: format!("run (seed {})", opts.seed.unwrap_or_default()),
                    timeout_ms: u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX),
                })
            }
        }
    }

    fn degrade(&self, reason: &str) -> Result<RunMode, ParityError> {
        if self.config.strict {
            return Err(ParityError::RecorderUnavailable {
                recorder: Source::Reference,
                reason: reason.to_string(),
            });
        }
        tracing::warn!(reason, "reference unavailable, continuing in model-only mode");
        Ok(RunMode::ModelOnly)
    }

    fn evaluate(&self, report: &DiffReport, nothing_compared: bool) -> bool {
        if nothing_compared {
            return true;
        }
        if self.config.strict && report.summary.critical > 0 {
            return false;
        }
        report.parity_score >= self.config.pass_threshold
    }

    fn save_transcripts(
        &self,
        model: &Transcript,
        reference: Option<&Transcript>,
    ) -> anyhow::Result<()> {
        let Some(dir) = &self.config.transcript_dir else {
            return Ok(());
        };
        for t in std::iter::once(model).chain(reference) {
            let path = parity_store::save_transcript(dir, t)
                .with_context(|| format!("saving {} transcript", t.source))?;
            tracing::debug!(path = %path.display(), "transcript saved");
        }
        Ok(())
    }

    fn log(&self, event: Event) {
        if let Some(log) = &self.log {
            log.record(event);
        }
    }
}
