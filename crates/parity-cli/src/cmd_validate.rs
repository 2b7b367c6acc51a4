use crate::config::Settings;
use crate::summary::{self, JsonOutput};
use anyhow::Result;
use parity_core::{ExitStatus, ParityError};
use parity_gate::{Baseline, RegressionGate, RegressionResult};
use parity_recorder::{ProcessRecorder, RecorderConfig};
use parity_runner::{RunLog, RunMode, SpotTestResult, SpotTestRunner};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub fn execute(settings: &Settings) -> Result<ExitStatus> {
    let model = ProcessRecorder::model(RecorderConfig::new(&settings.model_cmd));
    let mut reference_cfg = RecorderConfig::new(settings.interpreter.clone().unwrap_or_default())
        .with_args(settings.interpreter_args.clone());
    if let Some(game) = &settings.game_file {
        reference_cfg = reference_cfg.with_game_file(game);
    }
    let reference = ProcessRecorder::reference(reference_cfg);

    let runner = SpotTestRunner::new(Arc::new(model), Arc::new(reference), settings.spot.clone())
        .with_run_log(RunLog::for_project(&settings.root));

    let cancel = CancellationToken::new();
    ctrlc_cancel(cancel.clone());

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(runner.run(cancel))?;

    if result.mode == RunMode::ModelOnly {
        tracing::warn!("reference unavailable; regression gate skipped");
        emit(settings, &result, None, None, ExitStatus::Success)?;
        return Ok(ExitStatus::Success);
    }

    let gate = RegressionGate::new(&settings.baseline_path);

    if settings.establish {
        let baseline = gate.establish_baseline(&result.report, git_commit_hash(&settings.root))?;
        emit(settings, &result, None, Some(&baseline), ExitStatus::Success)?;
        return Ok(ExitStatus::Success);
    }

    let verdict = match gate.detect_regressions(&result.report) {
        Ok(v) => v,
        Err(e @ ParityError::NoBaseline { .. }) => {
            emit(settings, &result, None, None, ExitStatus::NoBaseline)?;
            eprintln!("hint: run with --establish-baseline to accept the current differences");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    let status = gate_status(&result, &verdict, settings.spot.strict);
    if !settings.spot.strict && !result.passed {
        tracing::warn!(
            score = result.report.parity_score,
            threshold = result.pass_threshold,
            "parity below threshold; not failing outside strict mode"
        );
    }
    emit(settings, &result, Some(&verdict), None, status)?;
    Ok(status)
}

/// Regressions always fail; a failed spot test only fails in strict mode.
fn gate_status(result: &SpotTestResult, verdict: &RegressionResult, strict: bool) -> ExitStatus {
    if !verdict.passed || (strict && !result.passed) {
        ExitStatus::Regression
    } else {
        ExitStatus::Success
    }
}

fn emit(
    settings: &Settings,
    result: &SpotTestResult,
    regression: Option<&RegressionResult>,
    baseline: Option<&Baseline>,
    status: ExitStatus,
) -> Result<()> {
    if settings.json {
        let out = JsonOutput {
            result,
            regression,
            baseline,
            exit_code: status.code(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    print!("{}", summary::render_result(result));
    if let Some(r) = regression {
        println!();
        print!("{}", summary::render_regression(r));
    }
    if let Some(b) = baseline {
        println!();
        print!("{}", summary::render_baseline(b, &settings.baseline_path));
    }
    Ok(())
}

fn ctrlc_cancel(cancel: CancellationToken) {
    let _ = ctrlc::set_handler(move || {
        cancel.cancel();
    });
}

/// HEAD of the repository at `root`, if there is one.
fn git_commit_hash(root: &Path) -> Option<String> {
    std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(root)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
