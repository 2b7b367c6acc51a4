use parity_core::{DifferenceType, Severity, TranscriptEntry};
use parity_transcript::{is_movement_command, is_room_name, strip_status_bar};

/// Similarity floors for the severity bands.
pub const MINOR_SIMILARITY: f64 = 0.9;
pub const MAJOR_SIMILARITY: f64 = 0.7;

/// True if either raw output contains one of the configured variation strings.
pub fn contains_known_variation(raw_a: &str, raw_b: &str, known_variations: &[String]) -> bool {
    known_variations
        .iter()
        .filter(|v| !v.is_empty())
        .any(|v| raw_a.contains(v.as_str()) || raw_b.contains(v.as_str()))
}

/// Equal once layout (all whitespace) and, optionally, case are ignored.
pub fn layout_equal(a: &str, b: &str, case_insensitive: bool) -> bool {
    let fold = |s: &str| -> String {
        let squashed: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        if case_insensitive {
            squashed.to_lowercase()
        } else {
            squashed
        }
    };
    fold(a) == fold(b)
}

/// Severity of one non-identical pair.
///
/// Known variation → minor; same text modulo layout/case → formatting;
/// otherwise banded by similarity.
pub fn classify_severity(
    a: &str,
    b: &str,
    raw_a: &str,
    raw_b: &str,
    similarity: f64,
    known_variations: &[String],
    case_insensitive: bool,
) -> Severity {
    if contains_known_variation(raw_a, raw_b, known_variations) {
        Severity::Minor
    } else if layout_equal(a, b, case_insensitive) {
        Severity::Formatting
    } else if similarity >= MINOR_SIMILARITY {
        Severity::Minor
    } else if similarity >= MAJOR_SIMILARITY {
        Severity::Major
    } else {
        Severity::Critical
    }
}

/// Room name heading the raw output, ignoring any status line.
pub fn leading_room_name(raw: &str) -> Option<String> {
    let text = strip_status_bar(raw);
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .filter(|l| is_room_name(l))
        .map(str::to_string)
}

/// Difference type of one non-identical aligned pair.
pub fn classify_difference_type(
    expected: &TranscriptEntry,
    actual: &TranscriptEntry,
    severity: Severity,
    known_variation: bool,
) -> DifferenceType {
    if severity == Severity::Formatting {
        return DifferenceType::Formatting;
    }
    if known_variation {
        return DifferenceType::RngDifference;
    }
    if expected.turn_differs(actual) {
        return DifferenceType::StateDivergence;
    }
    let room_a = leading_room_name(&expected.output);
    let room_b = leading_room_name(&actual.output);
    let rooms_differ = match (&room_a, &room_b) {
        (Some(a), Some(b)) => a != b,
        (None, None) => false,
        // one side moved, the other did not
        _ => is_movement_command(&expected.command),
    };
    if rooms_differ {
        DifferenceType::StateDivergence
    } else {
        DifferenceType::MessageInconsistency
    }
}
