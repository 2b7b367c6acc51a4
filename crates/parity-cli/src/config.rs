use crate::Cli;
use anyhow::{bail, Context, Result};
use parity_runner::{CommandType, SpotTestConfig};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Everything a validation run needs: flags first, then `PARITY_*`
/// environment variables, then defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub spot: SpotTestConfig,
    pub establish: bool,
    pub baseline_path: PathBuf,
    pub verbose: bool,
    pub json: bool,
    pub root: PathBuf,
    pub interpreter: Option<PathBuf>,
    pub interpreter_args: Vec<String>,
    pub game_file: Option<PathBuf>,
    pub model_cmd: PathBuf,
}

impl Settings {
    pub fn from_env(cli: &Cli, root: &Path) -> Result<Self> {
        Self::resolve(cli, root, &|key| std::env::var(key).ok())
    }

    pub fn resolve(cli: &Cli, root: &Path, env: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let mut spot = SpotTestConfig::default();

        if let Some(n) = cli.commands.or(env_parse(env, "PARITY_COMMAND_COUNT")?) {
            spot.command_count = n;
        }
        spot.seeds = if !cli.seeds.is_empty() {
            cli.seeds.clone()
        } else if let Some(list) = env("PARITY_SEED") {
            parse_list(&list, "PARITY_SEED")?
        } else {
            spot.seeds
        };
        if let Some(ms) = cli.timeout.or(env_parse(env, "PARITY_TIMEOUT_MS")?) {
            spot.timeout = Duration::from_millis(ms);
        }
        spot.quick = cli.quick || env_flag(env, "PARITY_QUICK");
        spot.strict = cli.strict || env_flag(env, "PARITY_STRICT");
        if let Some(t) = cli.threshold.or(env_parse(env, "PARITY_PASS_THRESHOLD")?) {
            if !(0.0..=100.0).contains(&t) {
                bail!("pass threshold must be between 0 and 100, got {t}");
            }
            spot.pass_threshold = t;
        }
        if let Some(list) = env("PARITY_FOCUS_AREAS") {
            spot.focus_areas = split_list(&list).map(str::to_string).collect();
        }
        if let Some(list) = env("PARITY_COMMAND_TYPES") {
            spot.command_types = parse_list::<CommandType>(&list, "PARITY_COMMAND_TYPES")?;
        }
        spot.transcript_dir = cli.transcript_dir.clone();

        let model_cmd = cli
            .model_cmd
            .clone()
            .or_else(|| env("PARITY_MODEL_CMD").map(PathBuf::from))
            .context("no model engine configured: pass --model-cmd or set PARITY_MODEL_CMD")?;

        Ok(Self {
            spot,
            establish: cli.establish_baseline,
            baseline_path: cli
                .baseline_path
                .clone()
                .unwrap_or_else(|| parity_store::default_baseline_path(root)),
            verbose: cli.verbose || env_flag(env, "PARITY_VERBOSE"),
            json: cli.json,
            root: root.to_path_buf(),
            interpreter: cli
                .interpreter
                .clone()
                .or_else(|| env("PARITY_INTERPRETER").map(PathBuf::from)),
            interpreter_args: cli.interpreter_args.clone(),
            game_file: cli
                .game_file
                .clone()
                .or_else(|| env("PARITY_GAME_FILE").map(PathBuf::from)),
            model_cmd,
        })
    }
}

fn env_flag(env: &dyn Fn(&str) -> Option<String>, key: &str) -> bool {
    env(key).is_some_and(|v| {
        matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
    })
}

fn env_parse<T>(env: &dyn Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env(key) {
        Some(v) => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("invalid {key}={v:?}: {e}")),
        None => Ok(None),
    }
}

fn split_list(s: &str) -> impl Iterator<Item = &str> {
    s.split(',').map(str::trim).filter(|p| !p.is_empty())
}

fn parse_list<T>(s: &str, key: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    split_list(s)
        .map(|p| {
            p.parse()
                .map_err(|e| anyhow::anyhow!("invalid {key} entry {p:?}: {e}"))
        })
        .collect()
}
