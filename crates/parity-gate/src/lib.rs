pub mod baseline;
pub mod gate;

pub use baseline::{fingerprint, Baseline, BaselineStore, BaselineSummary, BASELINE_SCHEMA_VERSION};
pub use gate::{RegressionGate, RegressionResult};
