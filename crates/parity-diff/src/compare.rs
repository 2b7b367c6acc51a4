use crate::classify::{classify_difference_type, classify_severity, contains_known_variation};
use crate::distance::similarity;
use parity_core::{
    match_score, DiffEntry, DiffReport, DiffSummary, DifferenceType, Severity, Transcript,
    TranscriptEntry,
};
use parity_transcript::{NormalizationPipeline, NormalizeOptions};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TOLERANCE: f64 = 0.95;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareOptions {
    /// Similarity at or above which a formatting-only pair counts as a close
    /// match and is left out of the report.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Substrings marking output that is expected to vary between runs
    /// (random events, timing).
    #[serde(default)]
    pub known_variations: Vec<String>,
    #[serde(default = "default_case_insensitive")]
    pub case_insensitive: bool,
    #[serde(default)]
    pub normalize: NormalizeOptions,
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_case_insensitive() -> bool {
    true
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            known_variations: Vec::new(),
            case_insensitive: true,
            normalize: NormalizeOptions::default(),
        }
    }
}

/// Positional transcript comparison.
#[derive(Debug, Clone, Default)]
pub struct TranscriptComparator {
    options: CompareOptions,
    pipeline: NormalizationPipeline,
}

impl TranscriptComparator {
    pub fn new(options: CompareOptions) -> Self {
        let pipeline = NormalizationPipeline::new(options.normalize.clone());
        Self { options, pipeline }
    }

    pub fn options(&self) -> &CompareOptions {
        &self.options
    }

    /// Compare the reference transcript (`expected`) with the model
    /// transcript (`actual`).
    pub fn compare(&self, expected: &Transcript, actual: &Transcript) -> DiffReport {
        self.compare_entries(&expected.id, &actual.id, &expected.entries, &actual.entries)
    }

    /// Compare two entry lists index by index. No realignment is attempted:
    /// every index present on only one side is a critical missing entry.
    pub fn compare_entries(
        &self,
        expected_id: &str,
        actual_id: &str,
        expected: &[TranscriptEntry],
        actual: &[TranscriptEntry],
    ) -> DiffReport {
        let total_commands = expected.len().max(actual.len());
        let mut exact_matches = 0;
        let mut close_matches = 0;
        let mut differences = Vec::new();

        for index in 0..total_commands {
            match (expected.get(index), actual.get(index)) {
                (Some(e), Some(a)) => match self.compare_pair(index, e, a) {
                    PairOutcome::Exact => exact_matches += 1,
                    PairOutcome::Close => close_matches += 1,
                    PairOutcome::Different(d) => differences.push(d),
                },
                (Some(e), None) => differences.push(self.missing(index, e, true)),
                (None, Some(a)) => differences.push(self.missing(index, a, false)),
                (None, None) => unreachable!("index below the longer transcript's length"),
            }
        }

        let parity_score = match_score(total_commands, exact_matches + close_matches);
        tracing::debug!(
            expected = expected_id,
            actual = actual_id,
            total_commands,
            exact_matches,
            close_matches,
            differences = differences.len(),
            parity_score,
            "transcripts compared"
        );

        DiffReport {
            transcript_a: expected_id.to_string(),
            transcript_b: actual_id.to_string(),
            total_commands,
            exact_matches,
            close_matches,
            summary: DiffSummary::from_entries(&differences),
            differences,
            parity_score,
        }
    }

    fn compare_pair(&self, index: usize, e: &TranscriptEntry, a: &TranscriptEntry) -> PairOutcome {
        let norm_e = self.pipeline.normalize_entry(index, &e.output, &e.command);
        let norm_a = self.pipeline.normalize_entry(index, &a.output, &a.command);
        if norm_e == norm_a {
            return PairOutcome::Exact;
        }

        let sim = similarity(&norm_e, &norm_a);
        let opts = &self.options;
        let known = contains_known_variation(&e.output, &a.output, &opts.known_variations);
        let severity = classify_severity(
            &norm_e,
            &norm_a,
            &e.output,
            &a.output,
            sim,
            &opts.known_variations,
            opts.case_insensitive,
        );
        if sim >= opts.tolerance && severity == Severity::Formatting {
            return PairOutcome::Close;
        }

        let category = classify_difference_type(e, a, severity, known);
        tracing::debug!(index, command = %e.command, %severity, %category, sim, "difference");
        PairOutcome::Different(DiffEntry {
            index,
            command: e.command.clone(),
            expected: norm_e,
            actual: norm_a,
            similarity: sim,
            severity,
            category,
        })
    }

    fn missing(&self, index: usize, present: &TranscriptEntry, in_expected: bool) -> DiffEntry {
        let text = self.pipeline.normalize_entry(index, &present.output, &present.command);
        let (expected, actual) = if in_expected {
            (text, String::new())
        } else {
            (String::new(), text)
        };
        DiffEntry {
            index,
            command: present.command.clone(),
            expected,
            actual,
            similarity: 0.0,
            severity: Severity::Critical,
            category: DifferenceType::MissingEntry,
        }
    }
}

enum PairOutcome {
    Exact,
    Close,
    Different(DiffEntry),
}
