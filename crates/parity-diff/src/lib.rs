//! Positional transcript comparison and issue analysis.

pub mod analyze;
pub mod classify;
pub mod compare;
pub mod distance;
pub mod recommend;

pub use analyze::IssueAnalyzer;
pub use classify::{classify_difference_type, classify_severity};
pub use compare::{CompareOptions, TranscriptComparator, DEFAULT_TOLERANCE};
pub use distance::{edit_distance, similarity};
pub use recommend::RecommendationEngine;
