//! idlestop - shut down an idle CI machine before it pays for another cycle
//!
//! Wires together:
//! - Configuration loading
//! - Marker directory scanning and evaluation
//! - Host adapter (Linux uptime and shutdown command)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use idlestop::{Mode, Outcome, Runner, render_json, render_text};
use idlestop_config::{Policy, load_config, load_config_or_default};
use idlestop_core::{DirMarkerSource, EvaluatorSettings, IdlenessEvaluator};
use idlestop_host_api::{FixedUptime, SystemClock, UptimeSource};
use idlestop_host_linux::{CommandShutdown, ProcUptime};
use idlestop_util::{
    IDLESTOP_CONFIG_ENV, IDLESTOP_MARKER_DIR_ENV, config_path_without_env, is_mock_time_active,
};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// idlestop - cost-saving shutdown for idle CI machines
#[derive(Parser, Debug)]
#[command(name = "idlestop", version)]
#[command(about = "Shut down an idle CI machine near the end of its paid billing cycle", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/idlestop/config.toml)
    #[arg(short, long, env = IDLESTOP_CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Marker directory override
    #[arg(short, long, env = IDLESTOP_MARKER_DIR_ENV)]
    marker_dir: Option<PathBuf>,

    /// Use this uptime instead of reading /proc/uptime
    #[arg(long)]
    uptime_minutes: Option<u64>,

    /// Never run the shutdown command
    #[arg(long)]
    dry_run: bool,

    /// Print the evaluation as JSON
    #[arg(long)]
    json: bool,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Evaluate and print the decision (default)
    Check,
    /// Evaluate and shut down if the machine is idle near the end of its cycle
    Run,
}

impl From<Command> for Mode {
    fn from(command: Command) -> Self {
        match command {
            Command::Check => Mode::Check,
            Command::Run => Mode::Run,
        }
    }
}

fn load_policy(args: &Args) -> Result<Policy> {
    let mut policy = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => {
            let path = config_path_without_env();
            load_config_or_default(&path)
                .with_context(|| format!("Failed to load config from {:?}", path))?
        }
    };

    if let Some(dir) = &args.marker_dir {
        policy.markers.dir = dir.clone();
    }
    if args.dry_run {
        policy.shutdown.dry_run = true;
    }

    Ok(policy)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so --json output stays parseable
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    debug!(version = env!("CARGO_PKG_VERSION"), "idlestop starting");

    if is_mock_time_active() {
        warn!("Mock time is active, marker ages are measured against a shifted clock");
    }

    let policy = load_policy(&args)?;
    info!(
        marker_dir = %policy.markers.dir.display(),
        extension = %policy.markers.extension,
        cycle_length_minutes = policy.billing.cycle_length_minutes,
        threshold_minutes = policy.billing.threshold_minutes,
        dry_run = policy.shutdown.dry_run,
        "Configuration loaded"
    );

    let evaluator = IdlenessEvaluator::new(EvaluatorSettings::from_policy(&policy))
        .context("Invalid billing configuration")?;
    let markers =
        DirMarkerSource::from_policy(&policy.markers).context("Invalid marker settings")?;
    let uptime: Box<dyn UptimeSource> = match args.uptime_minutes {
        Some(minutes) => Box::new(FixedUptime::from_minutes(minutes)),
        None => Box::new(ProcUptime::new()),
    };
    let shutdown = CommandShutdown::new(policy.shutdown.command.clone());

    let runner = Runner {
        evaluator: &evaluator,
        markers: &markers,
        clock: &SystemClock,
        uptime: uptime.as_ref(),
        shutdown: &shutdown,
        shutdown_message: &policy.shutdown.message,
        dry_run: policy.shutdown.dry_run,
    };

    let mode = args.command.unwrap_or(Command::Check).into();
    let result = runner.run_once(mode).context("Evaluation failed")?;

    if args.json {
        println!("{}", render_json(&result)?);
    } else {
        print!("{}", render_text(&result.report));
        if result.outcome == Outcome::ShutdownRequested {
            println!("Shutdown requested.");
        }
    }

    Ok(())
}
