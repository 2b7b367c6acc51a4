use anyhow::Context;
use parity_core::{BaselineCategory, DiffEntry, DiffReport, ParityError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

pub const BASELINE_SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    BASELINE_SCHEMA_VERSION
}

/// Difference counts per baseline category.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BaselineSummary {
    pub rng_differences: usize,
    pub state_divergences: usize,
    pub logic_differences: usize,
}

impl BaselineSummary {
    pub fn from_report(report: &DiffReport) -> Self {
        Self {
            rng_differences: report.count_category(BaselineCategory::Rng),
            state_divergences: report.count_category(BaselineCategory::State),
            logic_differences: report.count_category(BaselineCategory::Logic),
        }
    }
}

/// Accepted differences at a point in time. Replaced only by an explicit
/// establish, never edited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Baseline {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_hash: Option<String>,
    pub total_differences: usize,
    pub summary: BaselineSummary,
    pub established_at: String,
    /// Fingerprints of every logic difference at establish time. `None` for
    /// files written before fingerprints were recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_logic_differences: Option<Vec<String>>,
}

impl Baseline {
    pub fn from_report(report: &DiffReport, commit_hash: Option<String>) -> Self {
        let mut known: Vec<String> = report.logic_differences().map(fingerprint).collect();
        known.sort();
        known.dedup();
        Self {
            schema_version: BASELINE_SCHEMA_VERSION,
            commit_hash,
            total_differences: report.differences.len(),
            summary: BaselineSummary::from_report(report),
            established_at: parity_core::now_rfc3339(),
            known_logic_differences: Some(known),
        }
    }
}

/// Stable identity of a difference: sha256 over command, expected and actual
/// text. The index is left out so the same divergence still matches after
/// earlier commands shift.
pub fn fingerprint(diff: &DiffEntry) -> String {
    let mut h = Sha256::new();
    h.update(diff.command.as_bytes());
    h.update([0u8]);
    h.update(diff.expected.as_bytes());
    h.update([0u8]);
    h.update(diff.actual.as_bytes());
    hex::encode(h.finalize())
}

/// Reads and replaces the baseline file.
#[derive(Debug, Clone)]
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn load(&self) -> Result<Baseline, ParityError> {
        if !self.path.exists() {
            return Err(ParityError::NoBaseline {
                path: self.path.clone(),
            });
        }
        let content = std::fs::read_to_string(&self.path)?;
        parse_baseline(&content).map_err(|reason| ParityError::MalformedBaseline {
            path: self.path.clone(),
            reason,
        })
    }

    pub fn save(&self, baseline: &Baseline) -> anyhow::Result<()> {
        let data = serde_json::to_string_pretty(baseline)?;
        parity_store::write_atomic(&self.path, data.as_bytes())
            .with_context(|| format!("saving baseline: {}", self.path.display()))
    }
}

fn parse_baseline(content: &str) -> Result<Baseline, String> {
    let baseline: Baseline = serde_json::from_str(content).map_err(|e| e.to_string())?;
    if baseline.schema_version == 0 || baseline.schema_version > BASELINE_SCHEMA_VERSION {
        return Err(format!(
            "unsupported schema version {} (supported: {BASELINE_SCHEMA_VERSION})",
            baseline.schema_version
        ));
    }
    Ok(baseline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parity_core::{DifferenceType, Severity};

    fn diff(cmd: &str, category: DifferenceType) -> DiffEntry {
        DiffEntry {
            index: 4,
            command: cmd.into(),
            expected: "Taken.".into(),
            actual: "You can't see that.".into(),
            similarity: 0.2,
            severity: Severity::Critical,
            category,
        }
    }

    #[test]
    fn fingerprint_ignores_index() {
        let a = diff("take lamp", DifferenceType::MessageInconsistency);
        let mut b = a.clone();
        b.index = 9;
        assert_eq!(fingerprint(&a), fingerprint(&b));
        assert_eq!(fingerprint(&a).len(), 64);
        b.actual.push('!');
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn fingerprint_fields_do_not_run_together() {
        let mut a = diff("ab", DifferenceType::MessageInconsistency);
        a.expected = "c".into();
        let mut b = diff("a", DifferenceType::MessageInconsistency);
        b.expected = "bc".into();
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn summary_by_category() {
        let mut r = DiffReport::empty("a", "b");
        r.differences = vec![
            diff("x", DifferenceType::RngDifference),
            diff("y", DifferenceType::StateDivergence),
            diff("z", DifferenceType::MissingEntry),
            diff("w", DifferenceType::MessageInconsistency),
            diff("v", DifferenceType::Formatting),
        ];
        let b = Baseline::from_report(&r, Some("abc123".into()));
        assert_eq!(b.total_differences, 5);
        assert_eq!(
            b.summary,
            BaselineSummary {
                rng_differences: 1,
                state_divergences: 1,
                logic_differences: 2,
            }
        );
        assert_eq!(b.known_logic_differences.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn missing_file_is_no_baseline() {
        let dir = tempfile::tempdir().unwrap();
        let store = BaselineStore::new(dir.path().join("baseline.json"));
        assert!(matches!(store.load(), Err(ParityError::NoBaseline { .. })));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = BaselineStore::new(dir.path().join(".parity").join("baseline.json"));
        let b = Baseline::from_report(&DiffReport::empty("a", "b"), None);
        store.save(&b).unwrap();
        assert_eq!(store.load().unwrap(), b);
    }

    #[test]
    fn legacy_file_without_version_or_fingerprints() {
        let json = r#"{
            "commitHash": "deadbeef",
            "totalDifferences": 3,
            "summary": {"rngDifferences": 1, "stateDivergences": 0, "logicDifferences": 2},
            "establishedAt": "2024-01-01T00:00:00Z"
        }"#;
        let b = parse_baseline(json).unwrap();
        assert_eq!(b.schema_version, 1);
        assert!(b.known_logic_differences.is_none());
    }

    #[test]
    fn reject_unknown_fields_and_versions() {
        let extra = r#"{"totalDifferences":0,"summary":{"rngDifferences":0,"stateDivergences":0,"logicDifferences":0},"establishedAt":"x","notes":"hi"}"#;
        assert!(parse_baseline(extra).is_err());
        let future = r#"{"schemaVersion":9,"totalDifferences":0,"summary":{"rngDifferences":0,"stateDivergences":0,"logicDifferences":0},"establishedAt":"x"}"#;
        assert!(parse_baseline(future).unwrap_err().contains("schema version 9"));
    }

    #[test]
    fn garbage_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baseline.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = BaselineStore::new(&path).load().unwrap_err();
        assert!(matches!(err, ParityError::MalformedBaseline { .. }));
    }
}
