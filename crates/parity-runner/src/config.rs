use crate::commands::CommandType;
use parity_diff::CompareOptions;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_COMMAND_COUNT: usize = 50;
pub const DEFAULT_SEED: u64 = 12345;
pub const DEFAULT_PASS_THRESHOLD: f64 = 90.0;
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(300);
/// Command cap in quick mode.
pub const QUICK_COMMAND_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct SpotTestConfig {
    pub command_count: usize,
    pub seeds: Vec<u64>,
    pub quick: bool,
    /// Whole-run budget raced against the recordings.
    pub timeout: Duration,
    pub command_timeout: Duration,
    /// Minimum parity score (percent) for a pass.
    pub pass_threshold: f64,
    /// Reference required; critical differences fail the run.
    pub strict: bool,
    pub focus_areas: Vec<String>,
    pub command_types: Vec<CommandType>,
    pub transcript_dir: Option<PathBuf>,
    pub compare: CompareOptions,
}

impl Default for SpotTestConfig {
    fn default() -> Self {
        Self {
            command_count: DEFAULT_COMMAND_COUNT,
            seeds: vec![DEFAULT_SEED],
            quick: false,
            timeout: DEFAULT_RUN_TIMEOUT,
            command_timeout: parity_recorder::DEFAULT_COMMAND_TIMEOUT,
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            strict: false,
            focus_areas: Vec::new(),
            command_types: Vec::new(),
            transcript_dir: None,
            compare: CompareOptions::default(),
        }
    }
}

impl SpotTestConfig {
    pub fn effective_command_count(&self) -> usize {
        if self.quick {
            self.command_count.min(QUICK_COMMAND_LIMIT)
        } else {
            self.command_count
        }
    }

    pub fn effective_seeds(&self) -> Vec<u64> {
        let seeds = if self.seeds.is_empty() {
            vec![DEFAULT_SEED]
        } else {
            self.seeds.clone()
        };
        if self.quick {
            seeds.into_iter().take(1).collect()
        } else {
            seeds
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quick_mode_caps() {
        let cfg = SpotTestConfig {
            command_count: 100,
            seeds: vec![3, 4, 5],
            quick: true,
            ..Default::default()
        };
        assert_eq!(cfg.effective_command_count(), 10);
        assert_eq!(cfg.effective_seeds(), vec![3]);

        let small = SpotTestConfig {
            command_count: 4,
            quick: true,
            ..Default::default()
        };
        assert_eq!(small.effective_command_count(), 4);
    }

    #[test]
    fn empty_seed_list_uses_default() {
        let cfg = SpotTestConfig {
            seeds: vec![],
            ..Default::default()
        };
        assert_eq!(cfg.effective_seeds(), vec![DEFAULT_SEED]);
        assert_eq!(cfg.effective_command_count(), DEFAULT_COMMAND_COUNT);
    }
}
