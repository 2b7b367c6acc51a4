use crate::baseline::{fingerprint, Baseline, BaselineStore, BaselineSummary};
use parity_core::{DiffEntry, DiffReport, ParityError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Verdict of one gate check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegressionResult {
    pub passed: bool,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Logic differences not covered by the baseline.
    pub new_logic_differences: Vec<DiffEntry>,
}

/// Compares reports against the stored baseline. Only new logic differences
/// fail the gate; state and rng drift is reported but tolerated.
#[derive(Debug, Clone)]
pub struct RegressionGate {
    store: BaselineStore,
}

impl RegressionGate {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: BaselineStore::new(path),
        }
    }

    pub fn store(&self) -> &BaselineStore {
        &self.store
    }

    /// Snapshot `report` as the new baseline, replacing any previous one.
    pub fn establish_baseline(
        &self,
        report: &DiffReport,
        commit_hash: Option<String>,
    ) -> anyhow::Result<Baseline> {
        let baseline = Baseline::from_report(report, commit_hash);
        if baseline.summary.logic_differences > 0 {
            tracing::warn!(
                logic = baseline.summary.logic_differences,
                "baseline accepts logic differences; they will not fail future runs"
            );
        }
        self.store.save(&baseline)?;
        tracing::info!(
            path = %self.store.path().display(),
            total = baseline.total_differences,
            commit = baseline.commit_hash.as_deref().unwrap_or("-"),
            "baseline established"
        );
        Ok(baseline)
    }

    pub fn detect_regressions(&self, report: &DiffReport) -> Result<RegressionResult, ParityError> {
        let baseline = self.store.load()?;
        let current = BaselineSummary::from_report(report);

        let new_logic: Vec<DiffEntry> = match &baseline.known_logic_differences {
            Some(known) => {
                let known: HashSet<&str> = known.iter().map(String::as_str).collect();
                report
                    .logic_differences()
                    .filter(|d| !known.contains(fingerprint(d).as_str()))
                    .cloned()
                    .collect()
            }
            None => {
                tracing::debug!("baseline has no fingerprints, comparing counts");
                report
                    .logic_differences()
                    .skip(baseline.summary.logic_differences)
                    .cloned()
                    .collect()
            }
        };

        if current.state_divergences > baseline.summary.state_divergences
            || current.rng_differences > baseline.summary.rng_differences
        {
            tracing::warn!(
                state = current.state_divergences,
                state_baseline = baseline.summary.state_divergences,
                rng = current.rng_differences,
                rng_baseline = baseline.summary.rng_differences,
                "non-logic differences grew since baseline"
            );
        }

        let summary = format!(
            "logic {} (baseline {}), state {} (baseline {}), rng {} (baseline {})",
            current.logic_differences,
            baseline.summary.logic_differences,
            current.state_divergences,
            baseline.summary.state_divergences,
            current.rng_differences,
            baseline.summary.rng_differences,
        );
        let passed = new_logic.is_empty();
        let error_message = (!passed).then(|| {
            let mut seen = HashSet::new();
            let commands: Vec<&str> = new_logic
                .iter()
                .map(|d| d.command.as_str())
                .filter(|c| seen.insert(*c))
                .collect();
            format!(
                "{} new logic difference(s) since baseline: {}",
                new_logic.len(),
                commands.join(", ")
            )
        });
        Ok(RegressionResult {
            passed,
            summary,
            error_message,
            new_logic_differences: new_logic,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parity_core::{DifferenceType, Severity};

    fn diff(index: usize, cmd: &str, actual: &str, category: DifferenceType) -> DiffEntry {
        DiffEntry {
            index,
            command: cmd.into(),
            expected: "Taken.".into(),
            actual: actual.into(),
            similarity: 0.3,
            severity: Severity::Critical,
            category,
        }
    }

    fn report(diffs: Vec<DiffEntry>) -> DiffReport {
        let mut r = DiffReport::empty("ref", "model");
        r.total_commands = 20;
        r.exact_matches = 20 - diffs.len();
        r.differences = diffs;
        r
    }

    fn gate() -> (tempfile::TempDir, RegressionGate) {
        let dir = tempfile::tempdir().unwrap();
        let gate = RegressionGate::new(dir.path().join("baseline.json"));
        (dir, gate)
    }

    #[test]
    fn no_baseline_error() {
        let (_dir, gate) = gate();
        let err = gate.detect_regressions(&report(vec![])).unwrap_err();
        assert!(matches!(err, ParityError::NoBaseline { .. }));
        assert_eq!(err.exit_status().code(), 2);
    }

    #[test]
    fn same_report_passes() {
        let (_dir, gate) = gate();
        let r = report(vec![
            diff(1, "take lamp", "Huh?", DifferenceType::MessageInconsistency),
            diff(2, "n", "Forest", DifferenceType::StateDivergence),
        ]);
        gate.establish_baseline(&r, Some("abc".into())).unwrap();
        let result = gate.detect_regressions(&r).unwrap();
        assert!(result.passed, "{result:?}");
        assert!(result.error_message.is_none());
        assert!(result.new_logic_differences.is_empty());
    }

    #[test]
    fn new_logic_difference_fails() {
        let (_dir, gate) = gate();
        gate.establish_baseline(&report(vec![]), None).unwrap();
        let r = report(vec![diff(5, "read leaflet", "Nothing.", DifferenceType::MissingEntry)]);
        let result = gate.detect_regressions(&r).unwrap();
        assert!(!result.passed);
        assert_eq!(result.new_logic_differences.len(), 1);
        assert!(result.error_message.unwrap().contains("read leaflet"));
    }

    #[test]
    fn failure_message_names_each_command_once() {
        let (_dir, gate) = gate();
        gate.establish_baseline(&report(vec![]), None).unwrap();
        let r = report(vec![
            diff(1, "take lamp", "Huh?", DifferenceType::MessageInconsistency),
            diff(2, "open door", "Locked.", DifferenceType::MessageInconsistency),
            diff(3, "take lamp", "What?", DifferenceType::MessageInconsistency),
        ]);
        let result = gate.detect_regressions(&r).unwrap();
        assert_eq!(result.new_logic_differences.len(), 3);
        let message = result.error_message.unwrap();
        assert!(message.ends_with(": take lamp, open door"), "{message}");
    }

    #[test]
    fn known_difference_at_new_index_passes() {
        let (_dir, gate) = gate();
        gate.establish_baseline(
            &report(vec![diff(3, "take lamp", "Huh?", DifferenceType::MessageInconsistency)]),
            None,
        )
        .unwrap();
        let moved = report(vec![diff(
            7,
            "take lamp",
            "Huh?",
            DifferenceType::MessageInconsistency,
        )]);
        assert!(gate.detect_regressions(&moved).unwrap().passed);
    }

    #[test]
    fn swapped_logic_difference_fails_despite_equal_count() {
        let (_dir, gate) = gate();
        gate.establish_baseline(
            &report(vec![diff(3, "take lamp", "Huh?", DifferenceType::MessageInconsistency)]),
            None,
        )
        .unwrap();
        let swapped =
            report(vec![diff(3, "open door", "Locked.", DifferenceType::MessageInconsistency)]);
        assert!(!gate.detect_regressions(&swapped).unwrap().passed);
    }

    #[test]
    fn state_and_rng_growth_tolerated() {
        let (_dir, gate) = gate();
        gate.establish_baseline(&report(vec![]), None).unwrap();
        let r = report(vec![
            diff(1, "n", "Forest", DifferenceType::StateDivergence),
            diff(2, "wait", "A thief appears", DifferenceType::RngDifference),
            diff(3, "look", "TAKEN.", DifferenceType::Formatting),
        ]);
        let result = gate.detect_regressions(&r).unwrap();
        assert!(result.passed);
        assert!(result.summary.contains("state 1 (baseline 0)"));
    }

    #[test]
    fn legacy_baseline_compares_counts() {
        let (dir, gate) = gate();
        std::fs::write(
            dir.path().join("baseline.json"),
            r#"{"totalDifferences":1,"summary":{"rngDifferences":0,"stateDivergences":0,"logicDifferences":1},"establishedAt":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        let one = report(vec![diff(1, "a", "x", DifferenceType::MessageInconsistency)]);
        assert!(gate.detect_regressions(&one).unwrap().passed);
        let two = report(vec![
            diff(1, "a", "x", DifferenceType::MessageInconsistency),
            diff(2, "b", "y", DifferenceType::MessageInconsistency),
        ]);
        let result = gate.detect_regressions(&two).unwrap();
        assert!(!result.passed);
        assert_eq!(result.new_logic_differences[0].command, "b");
    }
}
