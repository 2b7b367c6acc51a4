use serde::{Deserialize, Serialize};

// ── Severity ──

/// How badly a single compared turn diverges. Ordered from benign to worst.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Formatting,
    Minor,
    Major,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Formatting => "formatting",
            Severity::Minor => "minor",
            Severity::Major => "major",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Difference type ──

/// What kind of divergence a diff entry represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DifferenceType {
    /// Same situation, different response text.
    MessageInconsistency,
    /// The two engines disagree about where the player is or how many turns passed.
    StateDivergence,
    /// Output touched by a configured random/known variation.
    RngDifference,
    /// One transcript has no entry at this index.
    MissingEntry,
    /// Differs only in case or layout.
    Formatting,
}

/// Bucket used by the regression baseline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BaselineCategory {
    Rng,
    State,
    Logic,
}

impl DifferenceType {
    pub const ALL: [DifferenceType; 5] = [
        DifferenceType::MessageInconsistency,
        DifferenceType::StateDivergence,
        DifferenceType::RngDifference,
        DifferenceType::MissingEntry,
        DifferenceType::Formatting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DifferenceType::MessageInconsistency => "message_inconsistency",
            DifferenceType::StateDivergence => "state_divergence",
            DifferenceType::RngDifference => "rng_difference",
            DifferenceType::MissingEntry => "missing_entry",
            DifferenceType::Formatting => "formatting",
        }
    }

    /// Baseline bucket. Formatting differences belong to none.
    pub fn baseline_category(&self) -> Option<BaselineCategory> {
        match self {
            DifferenceType::RngDifference => Some(BaselineCategory::Rng),
            DifferenceType::StateDivergence => Some(BaselineCategory::State),
            DifferenceType::MessageInconsistency | DifferenceType::MissingEntry => {
                Some(BaselineCategory::Logic)
            }
            DifferenceType::Formatting => None,
        }
    }

    pub fn is_logic(&self) -> bool {
        self.baseline_category() == Some(BaselineCategory::Logic)
    }
}

impl std::fmt::Display for DifferenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Diff entries and report ──

/// One compared index where the two transcripts were not equal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiffEntry {
    pub index: usize,
    pub command: String,
    /// Normalized reference output.
    pub expected: String,
    /// Normalized model output.
    pub actual: String,
    pub similarity: f64,
    pub severity: Severity,
    pub category: DifferenceType,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub formatting: usize,
    pub minor: usize,
    pub major: usize,
    pub critical: usize,
}

impl DiffSummary {
    pub fn from_entries(entries: &[DiffEntry]) -> Self {
        let mut summary = Self::default();
        for e in entries {
            match e.severity {
                Severity::Formatting => summary.formatting += 1,
                Severity::Minor => summary.minor += 1,
                Severity::Major => summary.major += 1,
                Severity::Critical => summary.critical += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.formatting + self.minor + self.major + self.critical
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiffReport {
    pub transcript_a: String,
    pub transcript_b: String,
    pub total_commands: usize,
    pub exact_matches: usize,
    pub close_matches: usize,
    pub differences: Vec<DiffEntry>,
    pub parity_score: f64,
    pub summary: DiffSummary,
}

impl DiffReport {
    /// Report for a run where nothing was compared.
    pub fn empty(transcript_a: impl Into<String>, transcript_b: impl Into<String>) -> Self {
        Self {
            transcript_a: transcript_a.into(),
            transcript_b: transcript_b.into(),
            total_commands: 0,
            exact_matches: 0,
            close_matches: 0,
            differences: Vec::new(),
            parity_score: 100.0,
            summary: DiffSummary::default(),
        }
    }

    /// Merge per-seed reports into one. Counts are summed, differences
    /// concatenated in input order, score and summary recomputed.
    pub fn combine(reports: &[DiffReport]) -> Self {
        if reports.len() == 1 {
            return reports[0].clone();
        }
        let total_commands: usize = reports.iter().map(|r| r.total_commands).sum();
        let exact_matches: usize = reports.iter().map(|r| r.exact_matches).sum();
        let close_matches: usize = reports.iter().map(|r| r.close_matches).sum();
        let differences: Vec<DiffEntry> = reports
            .iter()
            .flat_map(|r| r.differences.iter().cloned())
            .collect();
        Self {
            transcript_a: join_ids(reports.iter().map(|r| r.transcript_a.as_str())),
            transcript_b: join_ids(reports.iter().map(|r| r.transcript_b.as_str())),
            total_commands,
            exact_matches,
            close_matches,
            parity_score: match_score(total_commands, exact_matches + close_matches),
            summary: DiffSummary::from_entries(&differences),
            differences,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.differences.is_empty()
    }

    pub fn logic_differences(&self) -> impl Iterator<Item = &DiffEntry> {
        self.differences.iter().filter(|d| d.category.is_logic())
    }

    pub fn count_category(&self, category: BaselineCategory) -> usize {
        self.differences
            .iter()
            .filter(|d| d.category.baseline_category() == Some(category))
            .count()
    }
}

fn join_ids<'a>(ids: impl Iterator<Item = &'a str>) -> String {
    ids.collect::<Vec<_>>().join("+")
}

/// `100 × matched / total`, clamped, 100 for an empty run.
pub fn match_score(total_commands: usize, matched: usize) -> f64 {
    if total_commands == 0 {
        return 100.0;
    }
    let matched = matched.min(total_commands);
    100.0 * matched as f64 / total_commands as f64
}

/// Parity score from a command count and the reported differences. Every
/// reported difference is one unmatched turn; extra entries beyond the
/// command count are ignored.
pub fn calculate_parity_score(total_commands: usize, differences: &[DiffEntry]) -> f64 {
    let unmatched = differences.len().min(total_commands);
    match_score(total_commands, total_commands - unmatched)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diff(severity: Severity, category: DifferenceType) -> DiffEntry {
        DiffEntry {
            index: 1,
            command: "look".into(),
            expected: "a".into(),
            actual: "b".into(),
            similarity: 0.0,
            severity,
            category,
        }
    }

    #[test]
    fn severity_order() {
        assert!(Severity::Formatting < Severity::Minor);
        assert!(Severity::Minor < Severity::Major);
        assert!(Severity::Major < Severity::Critical);
    }

    #[test]
    fn parity_score_bounds() {
        let d = diff(Severity::Minor, DifferenceType::MessageInconsistency);
        for total in 0..12 {
            for n in 0..15 {
                let diffs = vec![d.clone(); n.min(total)];
                let score = calculate_parity_score(total, &diffs);
                assert!((0.0..=100.0).contains(&score));
                assert_eq!(score == 100.0, diffs.is_empty(), "total={total} n={n}");
            }
        }
    }

    #[test]
    fn parity_score_zero_commands() {
        assert_eq!(calculate_parity_score(0, &[]), 100.0);
        assert_eq!(match_score(0, 0), 100.0);
    }

    #[test]
    fn summary_counts_by_severity() {
        let entries = vec![
            diff(Severity::Critical, DifferenceType::MissingEntry),
            diff(Severity::Critical, DifferenceType::MissingEntry),
            diff(Severity::Minor, DifferenceType::RngDifference),
        ];
        let s = DiffSummary::from_entries(&entries);
        assert_eq!(s.critical, 2);
        assert_eq!(s.minor, 1);
        assert_eq!(s.total(), 3);
    }

    #[test]
    fn baseline_categories() {
        assert!(DifferenceType::MessageInconsistency.is_logic());
        assert!(DifferenceType::MissingEntry.is_logic());
        assert!(!DifferenceType::RngDifference.is_logic());
        assert_eq!(DifferenceType::Formatting.baseline_category(), None);
    }

    #[test]
    fn combine_sums_and_rescores() {
        let mut a = DiffReport::empty("m1", "r1");
        a.total_commands = 4;
        a.exact_matches = 4;
        a.parity_score = 100.0;

        let mut b = DiffReport::empty("m2", "r2");
        b.total_commands = 4;
        b.exact_matches = 2;
        b.differences = vec![
            diff(Severity::Major, DifferenceType::MessageInconsistency),
            diff(Severity::Critical, DifferenceType::StateDivergence),
        ];
        b.parity_score = 50.0;

        let c = DiffReport::combine(&[a, b]);
        assert_eq!(c.total_commands, 8);
        assert_eq!(c.differences.len(), 2);
        assert_eq!(c.parity_score, 75.0);
        assert_eq!(c.summary.critical, 1);
        assert_eq!(c.transcript_a, "m1+m2");
        assert_eq!(c.count_category(BaselineCategory::Logic), 1);
    }

    #[test]
    fn combine_empty_list_is_neutral() {
        let c = DiffReport::combine(&[]);
        assert_eq!(c.total_commands, 0);
        assert_eq!(c.parity_score, 100.0);
    }

    #[test]
    fn report_serializes_camel_case() {
        let r = DiffReport::empty("a", "b");
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains(r#""transcriptA":"a""#));
        assert!(json.contains(r#""parityScore":100.0"#));
    }
}
