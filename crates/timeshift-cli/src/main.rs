//! `timeshift` CLI — plan and verify nightly-window rewrites of a linear
//! commit history.
//!
//! ## Usage
//!
//! ```sh
//! # Dry run: show what would change (stdin → stdout)
//! git-log-to-json | timeshift plan
//!
//! # Custom window, 9 PM to 2 AM, slower pace
//! timeshift --start-hour 21 --end-hour 2 --min-rate 50 plan -i commits.json
//!
//! # Emit the id → timestamp mapping for the rewriter (fails on any violation)
//! timeshift apply -i commits.json -o mapping.json
//!
//! # After rewriting, verify the history that actually landed
//! timeshift check -i commits.json --mapping reread.json
//! ```

mod input;

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Duration;
use clap::{Args, Parser, Subcommand, ValueEnum};
use timeshift_engine::{plan, plan_strict, schedule_from_rewrite, validate, Config, PlanReport};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::input::{describe_merges, parse_history, parse_mapping, History};

#[derive(Parser)]
#[command(
    name = "timeshift",
    version,
    about = "Reschedule a linear commit history into a nightly time window"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    window: WindowArgs,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines on stderr
    #[arg(long, global = true)]
    json: bool,
}

/// Scheduling parameters. Flags override values loaded with `--config`.
#[derive(Args)]
struct WindowArgs {
    /// JSON file holding a serialized configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Hour the nightly window opens (0-23, default 20)
    #[arg(long, global = true)]
    start_hour: Option<u32>,

    /// Minute past the start hour the window opens (default 0)
    #[arg(long, global = true)]
    start_minute: Option<u32>,

    /// Hour the nightly window closes (0-23, default 4)
    #[arg(long, global = true)]
    end_hour: Option<u32>,

    /// Minute past the end hour the window closes (default 0)
    #[arg(long, global = true)]
    end_minute: Option<u32>,

    /// Minimum pace in changed lines per hour (default 100)
    #[arg(long, global = true)]
    min_rate: Option<f64>,

    /// Fraction of original spacing to preserve, in (0, 1] (default 0.5)
    #[arg(long, global = true)]
    distance_factor: Option<f64>,

    /// Smallest gap between consecutive commits, in seconds (default 300)
    #[arg(long, global = true)]
    min_granularity_secs: Option<i64>,

    /// IANA timezone for the window (default: offset of the first commit)
    #[arg(long, global = true)]
    timezone: Option<String>,

    /// Upper bound of the cosmetic per-commit shift, in seconds (default 0)
    #[arg(long, global = true)]
    max_jitter_secs: Option<i64>,

    /// Seed for the cosmetic shift
    #[arg(long, global = true)]
    jitter_seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the proposed schedule without producing a mapping
    Plan {
        /// Commit log JSON (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Report format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
        /// List every commit instead of a sample
        #[arg(long)]
        all: bool,
    },
    /// Produce the rewrite mapping; refuses if any constraint fails
    Apply {
        /// Commit log JSON (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Mapping output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Validate timestamps read back after a rewrite
    Check {
        /// Original commit log JSON (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Rewrite mapping read back from the history
        #[arg(short, long)]
        mapping: String,
        /// Report format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl WindowArgs {
    fn to_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))?
            }
            None => Config::default(),
        };

        if let Some(v) = self.start_hour {
            config.start_hour = v;
        }
        if let Some(v) = self.start_minute {
            config.start_minute = v;
        }
        if let Some(v) = self.end_hour {
            config.end_hour = v;
        }
        if let Some(v) = self.end_minute {
            config.end_minute = v;
        }
        if let Some(v) = self.min_rate {
            config.min_rate_per_hour = v;
        }
        if let Some(v) = self.distance_factor {
            config.distance_factor = v;
        }
        if let Some(v) = self.min_granularity_secs {
            config.min_granularity = seconds("--min-granularity-secs", v)?;
        }
        if let Some(v) = &self.timezone {
            config.timezone = Some(v.clone());
        }
        if let Some(v) = self.max_jitter_secs {
            config.max_jitter = seconds("--max-jitter-secs", v)?;
        }
        if let Some(v) = self.jitter_seed {
            config.jitter_seed = v;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

fn seconds(flag: &str, value: i64) -> Result<Duration> {
    Duration::try_seconds(value).with_context(|| format!("{} out of range: {}", flag, value))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json, if cli.verbose { Level::DEBUG } else { Level::WARN });

    let config = cli.window.to_config()?;

    match cli.command {
        Commands::Plan { input, format, all } => {
            let history = load_linear_history(input.as_deref())?;
            let plan = plan(&history.events, &config).context("Failed to plan schedule")?;
            let report = PlanReport::new(&history.events, &plan, &config)
                .with_rejected_nonlinear(history.merges.len());
            match format {
                Format::Text if all => println!("{:#}", report),
                Format::Text => println!("{}", report),
                Format::Json => println!("{}", report.to_json()?),
            }
        }
        Commands::Apply { input, output } => {
            let history = load_linear_history(input.as_deref())?;
            let plan = plan_strict(&history.events, &config)
                .context("Refusing to produce a rewrite mapping")?;
            info!(
                events = plan.schedule.len(),
                nights = plan.schedule.nights_used(),
                "schedule validated"
            );
            let mapping = serde_json::to_string_pretty(&plan.schedule.rewrite_entries())?;
            write_output(output.as_deref(), &mapping)?;
        }
        Commands::Check {
            input,
            mapping,
            format,
        } => {
            let history = load_linear_history(input.as_deref())?;
            let raw = std::fs::read_to_string(&mapping)
                .with_context(|| format!("Failed to read file: {}", mapping))?;
            let entries = parse_mapping(&raw)?;
            let schedule = schedule_from_rewrite(&history.events, &entries, &config)?;
            let validation = validate(&history.events, &schedule, &config)
                .context("Mapping does not line up with the commit log")?;
            let report =
                PlanReport::from_validation(&history.events, &schedule, &validation, &config)
                    .applying();
            match format {
                Format::Text => println!("{}", report),
                Format::Json => println!("{}", report.to_json()?),
            }
            if !validation.ok {
                bail!(
                    "{} constraint violation(s) in rewritten history",
                    validation.violations.len()
                );
            }
        }
    }

    Ok(())
}

/// Read the commit log and refuse histories that contain merges.
fn load_linear_history(path: Option<&str>) -> Result<History> {
    let raw = read_input(path)?;
    let history = parse_history(&raw)?;
    if !history.merges.is_empty() {
        bail!(
            "Cannot process a history with merge commits ({} found):\n{}\n\
             Only linear history is supported. Squash or rebase onto a linear branch first.",
            history.merges.len(),
            describe_merges(&history.merges)
        );
    }
    info!(events = history.events.len(), "loaded commit log");
    Ok(history)
}

/// Logs go to stderr so stdout stays clean for reports and mappings.
/// `TIMESHIFT_LOG`, then `RUST_LOG`, override the level.
fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_env("TIMESHIFT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(io::stderr).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(io::stderr))
            .try_init()
            .ok();
    }
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
