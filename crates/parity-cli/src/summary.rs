use parity_gate::{Baseline, RegressionResult};
use parity_runner::{RunMode, SpotTestResult};
use serde::Serialize;
use std::fmt::Write;

/// Differences shown in the human summary; the JSON output has all of them.
const SHOWN_DIFFERENCES: usize = 5;

/// Machine-readable run output for `--json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonOutput<'a> {
    pub result: &'a SpotTestResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regression: Option<&'a RegressionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<&'a Baseline>,
    pub exit_code: i32,
}

pub fn render_result(result: &SpotTestResult) -> String {
    let mut out = String::new();
    let r = &result.report;
    let icon = if result.passed { "✓" } else { "✗" };

    let _ = writeln!(out, "Parity validation");
    if result.mode == RunMode::ModelOnly {
        let _ = writeln!(out, "  ! reference unavailable: model-only run, nothing compared");
    }
    let seeds: Vec<String> = result.seeds.iter().map(|s| s.seed.to_string()).collect();
    let _ = writeln!(out, "  Seeds:      {}", seeds.join(", "));
    let _ = writeln!(
        out,
        "  Compared:   {} turns ({} exact, {} close)",
        r.total_commands, r.exact_matches, r.close_matches
    );
    let _ = writeln!(
        out,
        "  Parity:     {icon} {:.1}% (threshold {:.1}%)",
        r.parity_score, result.pass_threshold
    );
    let _ = writeln!(
        out,
        "  Severity:   {} critical, {} major, {} minor, {} formatting",
        r.summary.critical, r.summary.major, r.summary.minor, r.summary.formatting
    );
    for s in result.seeds.iter().filter(|s| s.terminated_early) {
        let _ = writeln!(out, "  ! seed {}: an implementation exited early", s.seed);
    }

    if !r.differences.is_empty() {
        let _ = writeln!(out, "\n  Differences:");
        for d in r.differences.iter().take(SHOWN_DIFFERENCES) {
            let _ = writeln!(
                out,
                "    #{:<4} {:<10} {:<22} {:?}",
                d.index,
                d.severity.as_str(),
                d.category.as_str(),
                d.command
            );
            let _ = writeln!(out, "          expected: {}", first_line(&d.expected));
            let _ = writeln!(out, "          actual:   {}", first_line(&d.actual));
        }
        if r.differences.len() > SHOWN_DIFFERENCES {
            let _ = writeln!(
                out,
                "    ... {} more (use --json for all)",
                r.differences.len() - SHOWN_DIFFERENCES
            );
        }
    }

    let a = &result.analysis;
    if !a.patterns.is_empty() {
        let _ = writeln!(out, "\n  Patterns (overall {}):", a.overall_severity);
        for p in &a.patterns {
            let _ = writeln!(
                out,
                "    [{}] {} x{}: {}",
                p.severity, p.pattern_type, p.frequency, p.description
            );
        }
    }
    if !a.recommendations.is_empty() {
        let _ = writeln!(out, "\n  Recommendations:");
        for line in &a.recommendations {
            let _ = writeln!(out, "    {line}");
        }
    }
    out
}

pub fn render_regression(result: &RegressionResult) -> String {
    let mut out = String::new();
    if result.passed {
        let _ = writeln!(out, "✓ No regressions ({})", result.summary);
    } else {
        let message = result
            .error_message
            .as_deref()
            .unwrap_or("new logic differences");
        let _ = writeln!(out, "✗ Regression: {message}");
        let _ = writeln!(out, "  {}", result.summary);
        for d in &result.new_logic_differences {
            let _ = writeln!(out, "    #{} {:?} ({})", d.index, d.command, d.category);
        }
    }
    out
}

pub fn render_baseline(baseline: &Baseline, path: &std::path::Path) -> String {
    format!(
        "✓ Baseline established at {} ({} differences: {} logic, {} state, {} rng)\n",
        path.display(),
        baseline.total_differences,
        baseline.summary.logic_differences,
        baseline.summary.state_divergences,
        baseline.summary.rng_differences,
    )
}

fn first_line(s: &str) -> &str {
    let line = s.lines().next().unwrap_or("");
    match line.char_indices().nth(72) {
        Some((i, _)) => &line[..i],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parity_core::{DiffEntry, DiffReport, DifferenceType, IssueAnalysis, Severity};
    use parity_runner::SeedOutcome;

    fn result(differences: Vec<DiffEntry>, passed: bool) -> SpotTestResult {
        let mut report = DiffReport::empty("ref", "model");
        report.total_commands = 10;
        report.exact_matches = 10 - differences.len();
        report.differences = differences;
        SpotTestResult {
            mode: RunMode::Differential,
            seeds: vec![SeedOutcome {
                seed: 42,
                commands: 9,
                model_entries: 10,
                reference_entries: Some(10),
                terminated_early: false,
                report: None,
            }],
            report,
            analysis: IssueAnalysis::default(),
            recommendations: vec![],
            passed,
            pass_threshold: 90.0,
            duration_ms: 5,
        }
    }

    fn diff(index: usize) -> DiffEntry {
        DiffEntry {
            index,
            command: "take lamp".into(),
            expected: "Taken.".into(),
            actual: "You can't see any lamp here.".into(),
            similarity: 0.2,
            severity: Severity::Critical,
            category: DifferenceType::MessageInconsistency,
        }
    }

    #[test]
    fn clean_run() {
        let text = render_result(&result(vec![], true));
        assert!(text.contains("Seeds:      42"));
        assert!(text.contains("✓"));
        assert!(!text.contains("Differences:"));
    }

    #[test]
    fn differences_truncated() {
        let text = render_result(&result((1..=7).map(diff).collect(), false));
        assert!(text.contains("✗"));
        assert!(text.contains("message_inconsistency"));
        assert!(text.contains("... 2 more"));
    }

    #[test]
    fn regression_lists_new_differences() {
        let r = RegressionResult {
            passed: false,
            summary: "logic 1 (baseline 0)".into(),
            error_message: Some("1 new logic difference(s) since baseline: take lamp".into()),
            new_logic_differences: vec![diff(3)],
        };
        let text = render_regression(&r);
        assert!(text.starts_with("✗ Regression"));
        assert!(text.contains("#3 \"take lamp\""));
    }

    #[test]
    fn long_lines_clipped() {
        let long = "x".repeat(200);
        assert_eq!(first_line(&long).len(), 72);
        assert_eq!(first_line("a\nb"), "a");
    }
}
