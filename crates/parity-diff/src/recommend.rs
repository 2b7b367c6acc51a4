use parity_core::{DifferenceType, Effort, IssueAnalysis, IssuePattern, Priority, Recommendation};

/// Turns an [`IssueAnalysis`] into an ordered list of follow-up actions.
#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine;

impl RecommendationEngine {
    pub fn new() -> Self {
        Self
    }

    /// One recommendation per pattern, plus an investigation item when deep
    /// analysis was requested. Most urgent first; ties keep pattern order.
    pub fn recommend(&self, analysis: &IssueAnalysis) -> Vec<Recommendation> {
        let mut out: Vec<Recommendation> =
            analysis.patterns.iter().map(pattern_recommendation).collect();

        if analysis.recommend_deep_analysis {
            out.push(Recommendation {
                priority: Priority::High,
                category: "investigation".into(),
                action: "Run a longer multi-seed comparison and diff the saved transcripts by hand"
                    .into(),
                reasoning: format!(
                    "overall severity is {} across {} pattern(s)",
                    analysis.overall_severity,
                    analysis.patterns.len()
                ),
                estimated_effort: Effort::Medium,
            });
        }

        out.sort_by_key(|r| r.priority);
        out
    }
}

/// `[priority] action`, the form stored in `IssueAnalysis::recommendations`.
pub fn render(rec: &Recommendation) -> String {
    format!("[{}] {}", rec.priority, rec.action)
}

fn pattern_recommendation(pattern: &IssuePattern) -> Recommendation {
    let action = match pattern.pattern_type {
        DifferenceType::MessageInconsistency => {
            "Align response messages with the reference for the sampled commands"
        }
        DifferenceType::StateDivergence => {
            "Check room transitions and turn counting where the engines diverge"
        }
        DifferenceType::RngDifference => {
            "Verify random number seeding matches the reference interpreter"
        }
        DifferenceType::MissingEntry => {
            "Find why one engine stops responding before the command list ends"
        }
        DifferenceType::Formatting => "Review text layout and capitalization rules",
    };
    let mut reasoning = format!(
        "{} ({} occurrence(s))",
        pattern.description, pattern.frequency
    );
    if !pattern.sample_commands.is_empty() {
        reasoning.push_str(&format!(", e.g. {}", pattern.sample_commands.join(", ")));
    }

    Recommendation {
        priority: pattern.severity.into(),
        category: pattern.pattern_type.as_str().into(),
        action: action.into(),
        reasoning,
        estimated_effort: effort_for(pattern.frequency),
    }
}

fn effort_for(frequency: usize) -> Effort {
    match frequency {
        0..=2 => Effort::Small,
        3..=9 => Effort::Medium,
        _ => Effort::Large,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parity_core::IssueSeverity;

    fn pattern(t: DifferenceType, severity: IssueSeverity, frequency: usize) -> IssuePattern {
        IssuePattern {
            pattern_type: t,
            frequency,
            severity,
            description: "desc".into(),
            sample_commands: vec!["take lamp".into()],
        }
    }

    #[test]
    fn empty_analysis_no_recommendations() {
        assert!(RecommendationEngine::new()
            .recommend(&IssueAnalysis::default())
            .is_empty());
    }

    #[test]
    fn critical_pattern_first() {
        let analysis = IssueAnalysis {
            patterns: vec![
                pattern(DifferenceType::Formatting, IssueSeverity::Low, 2),
                pattern(DifferenceType::StateDivergence, IssueSeverity::Critical, 4),
            ],
            overall_severity: IssueSeverity::Critical,
            recommend_deep_analysis: true,
            recommendations: vec![],
        };
        let recs = RecommendationEngine::new().recommend(&analysis);
        let priorities: Vec<Priority> = recs.iter().map(|r| r.priority).collect();
        assert_eq!(priorities, vec![Priority::Critical, Priority::High, Priority::Low]);
        assert_eq!(recs[0].category, "state_divergence");
        assert_eq!(recs[0].estimated_effort, Effort::Medium);
        assert_eq!(recs[1].category, "investigation");
        assert!(recs[0].reasoning.contains("take lamp"));
    }

    #[test]
    fn stable_within_priority() {
        let analysis = IssueAnalysis {
            patterns: vec![
                pattern(DifferenceType::MessageInconsistency, IssueSeverity::Medium, 5),
                pattern(DifferenceType::RngDifference, IssueSeverity::Medium, 12),
            ],
            ..Default::default()
        };
        let recs = RecommendationEngine::new().recommend(&analysis);
        assert_eq!(recs[0].category, "message_inconsistency");
        assert_eq!(recs[1].category, "rng_difference");
        assert_eq!(recs[1].estimated_effort, Effort::Large);
    }

    #[test]
    fn render_line() {
        let rec = pattern_recommendation(&pattern(
            DifferenceType::MissingEntry,
            IssueSeverity::Critical,
            2,
        ));
        assert!(render(&rec).starts_with("[critical] Find why"));
    }
}
