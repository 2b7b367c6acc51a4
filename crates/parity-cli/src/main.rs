mod cmd_validate;
mod config;
mod summary;

use clap::Parser;
use parity_core::ExitStatus;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "parity-validate",
    version,
    about = "Check a rewritten interactive-fiction engine against the reference interpreter"
)]
pub struct Cli {
    /// Accept the current differences as the new baseline
    #[arg(short = 'e', long)]
    establish_baseline: bool,
    /// First seed only, at most 10 commands
    #[arg(short, long)]
    quick: bool,
    /// Comma-separated RNG seeds (e.g. 1,2,3)
    #[arg(long, value_delimiter = ',')]
    seeds: Vec<u64>,
    /// Commands per seed
    #[arg(long)]
    commands: Option<usize>,
    /// Baseline file (default: .parity/baseline.json)
    #[arg(long)]
    baseline_path: Option<PathBuf>,
    /// Whole-run timeout in milliseconds
    #[arg(long)]
    timeout: Option<u64>,
    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
    /// Require the reference interpreter and fail on critical differences
    #[arg(long)]
    strict: bool,
    /// Minimum parity score in percent
    #[arg(long)]
    threshold: Option<f64>,
    /// Reference interpreter executable
    #[arg(long)]
    interpreter: Option<PathBuf>,
    /// Extra interpreter argument, placed before the game file (repeatable)
    #[arg(long = "interpreter-arg", allow_hyphen_values = true)]
    interpreter_args: Vec<String>,
    /// Story file loaded by the reference interpreter
    #[arg(long)]
    game_file: Option<PathBuf>,
    /// REPL binary of the rewritten engine
    #[arg(long)]
    model_cmd: Option<PathBuf>,
    /// Save both transcripts of every seed here
    #[arg(long)]
    transcript_dir: Option<PathBuf>,
    /// Print the full result as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn init_tracing(verbose: bool) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(spec) if !spec.is_empty() => EnvFilter::new(spec),
        _ => EnvFilter::new(if verbose { "debug" } else { "info" }),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    let status = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|root| config::Settings::from_env(&cli, &root))
        .and_then(|settings| {
            init_tracing(settings.verbose);
            cmd_validate::execute(&settings)
        });

    let code = match status {
        Ok(status) => status.code(),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitStatus::from_error(e.as_ref()).code()
        }
    };
    std::process::exit(code);
}
