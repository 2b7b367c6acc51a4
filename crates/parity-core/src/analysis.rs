use crate::diff::{DifferenceType, Severity};
use serde::{Deserialize, Serialize};

// ── Issue severity ──

/// Severity of an aggregated issue. Total order `low < medium < high < critical`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl From<Severity> for IssueSeverity {
    fn from(s: Severity) -> Self {
        match s {
            Severity::Formatting | Severity::Minor => IssueSeverity::Low,
            Severity::Major => IssueSeverity::High,
            Severity::Critical => IssueSeverity::Critical,
        }
    }
}

impl std::fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            IssueSeverity::Low => "low",
            IssueSeverity::Medium => "medium",
            IssueSeverity::High => "high",
            IssueSeverity::Critical => "critical",
        })
    }
}

// ── Patterns ──

/// A difference type that recurred at least twice in one report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IssuePattern {
    #[serde(rename = "type")]
    pub pattern_type: DifferenceType,
    pub frequency: usize,
    pub severity: IssueSeverity,
    pub description: String,
    /// First few commands that triggered it (at most three).
    pub sample_commands: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IssueAnalysis {
    pub patterns: Vec<IssuePattern>,
    pub overall_severity: IssueSeverity,
    pub recommend_deep_analysis: bool,
    pub recommendations: Vec<String>,
}

impl IssueAnalysis {
    pub fn max_pattern_severity(&self) -> Option<IssueSeverity> {
        self.patterns.iter().map(|p| p.severity).max()
    }
}

// ── Recommendations ──

/// Ordered so that sorting ascending puts the most urgent first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl From<IssueSeverity> for Priority {
    fn from(s: IssueSeverity) -> Self {
        match s {
            IssueSeverity::Critical => Priority::Critical,
            IssueSeverity::High => Priority::High,
            IssueSeverity::Medium => Priority::Medium,
            IssueSeverity::Low => Priority::Low,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub priority: Priority,
    pub category: String,
    pub action: String,
    pub reasoning: String,
    pub estimated_effort: Effort,
}
