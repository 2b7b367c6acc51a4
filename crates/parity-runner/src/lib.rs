//! Spot-test orchestration: generate seeded command sequences, record the
//! model and reference concurrently, compare, analyze.

pub mod commands;
pub mod config;
pub mod event_log;
pub mod runner;

pub use commands::{CommandGenerator, CommandType};
pub use config::{SpotTestConfig, QUICK_COMMAND_LIMIT};
pub use event_log::{Event, RunLog};
pub use runner::{RunMode, SeedOutcome, SpotTestResult, SpotTestRunner};
