use crate::recommend::{render, RecommendationEngine};
use parity_core::{
    DiffEntry, DiffReport, DifferenceType, IssueAnalysis, IssuePattern, IssueSeverity,
};
use std::collections::BTreeMap;

/// Occurrences needed before a difference type counts as a pattern.
pub const MIN_PATTERN_FREQUENCY: usize = 2;
/// Frequency at which a pattern is at least medium severity.
pub const ESCALATE_FREQUENCY: usize = 5;
pub const MAX_SAMPLE_COMMANDS: usize = 3;
/// Difference count that triggers deep analysis on its own.
pub const DEEP_ANALYSIS_DIFFERENCES: usize = 3;
pub const DEEP_ANALYSIS_TYPES: usize = 3;

/// Groups differences into recurring patterns and rates the whole set.
#[derive(Debug, Clone, Default)]
pub struct IssueAnalyzer {
    engine: RecommendationEngine,
}

impl IssueAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyze_report(&self, report: &DiffReport) -> IssueAnalysis {
        self.analyze(&report.differences)
    }

    pub fn analyze(&self, differences: &[DiffEntry]) -> IssueAnalysis {
        if differences.is_empty() {
            return IssueAnalysis::default();
        }

        let mut groups: BTreeMap<DifferenceType, Vec<&DiffEntry>> = BTreeMap::new();
        for d in differences {
            groups.entry(d.category).or_default().push(d);
        }

        let patterns: Vec<IssuePattern> = groups
            .iter()
            .filter(|(_, members)| members.len() >= MIN_PATTERN_FREQUENCY)
            .map(|(t, members)| build_pattern(*t, members))
            .collect();

        let worst_diff = differences
            .iter()
            .map(|d| IssueSeverity::from(d.severity))
            .max()
            .unwrap_or_default();
        let worst_pattern = patterns.iter().map(|p| p.severity).max().unwrap_or_default();
        let overall_severity = worst_diff.max(worst_pattern);

        let recommend_deep_analysis = overall_severity == IssueSeverity::Critical
            || differences.len() >= DEEP_ANALYSIS_DIFFERENCES
            || groups.len() >= DEEP_ANALYSIS_TYPES;

        let mut analysis = IssueAnalysis {
            patterns,
            overall_severity,
            recommend_deep_analysis,
            recommendations: Vec::new(),
        };
        analysis.recommendations = self.engine.recommend(&analysis).iter().map(render).collect();

        tracing::debug!(
            differences = differences.len(),
            patterns = analysis.patterns.len(),
            overall = %analysis.overall_severity,
            deep = analysis.recommend_deep_analysis,
            "issues analyzed"
        );
        analysis
    }
}

fn build_pattern(pattern_type: DifferenceType, members: &[&DiffEntry]) -> IssuePattern {
    let frequency = members.len();
    let mut severity = members
        .iter()
        .map(|d| IssueSeverity::from(d.severity))
        .max()
        .unwrap_or_default();
    if frequency >= ESCALATE_FREQUENCY {
        severity = severity.max(IssueSeverity::Medium);
    }

    let sample_commands = members
        .iter()
        .take(MAX_SAMPLE_COMMANDS)
        .map(|d| d.command.clone())
        .collect();

    IssuePattern {
        pattern_type,
        frequency,
        severity,
        description: describe(pattern_type, frequency),
        sample_commands,
    }
}

fn describe(t: DifferenceType, n: usize) -> String {
    match t {
        DifferenceType::MessageInconsistency => {
            format!("{n} commands produced different response text")
        }
        DifferenceType::StateDivergence => {
            format!("{n} commands show diverging location or turn count")
        }
        DifferenceType::RngDifference => format!("{n} differences involve known random output"),
        DifferenceType::MissingEntry => format!("{n} entries exist in only one transcript"),
        DifferenceType::Formatting => format!("{n} differences are layout or case only"),
    }
}
