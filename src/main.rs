//! sktop - Interactive terminal dashboard for your Slurm jobs

mod display;
mod formatting;
mod models;
mod slurm;
mod tui;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use models::{MAX_REFRESH_INTERVAL, MIN_REFRESH_INTERVAL, TuiConfig, is_valid_refresh_interval};
use slurm::SlurmInterface;
use tui::app::{JobTable, SelectionSet};

#[derive(Parser)]
#[command(name = "sktop")]
#[command(about = "Interactive terminal dashboard for your Slurm jobs", long_about = None)]
#[command(version)]
struct Cli {
    /// Seconds between automatic refreshes
    #[arg(short, long, value_name = "SECONDS", value_parser = parse_refresh)]
    refresh: Option<f64>,

    /// Show jobs of this user instead of the current one
    #[arg(short, long)]
    user: Option<String>,

    /// Append diagnostics to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print the current job table once and exit
    #[arg(long)]
    once: bool,
}

fn parse_refresh(s: &str) -> Result<f64, String> {
    let secs: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a number of seconds"))?;
    if !is_valid_refresh_interval(secs) {
        return Err(format!(
            "refresh interval must be between {MIN_REFRESH_INTERVAL} and {MAX_REFRESH_INTERVAL} second(s)"
        ));
    }
    Ok(secs)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, mut warnings) = TuiConfig::load()?;

    // Command line flags take precedence over files and environment
    if let Some(interval) = cli.refresh {
        config.refresh.interval = interval;
    }
    if let Some(path) = cli.log_file {
        config.logging.file = path;
    }

    if let Some(warning) = init_logging(&config.logging.file, &config.logging.level) {
        warnings.push(warning);
    }

    let username = cli.user.unwrap_or_else(SlurmInterface::get_current_user);
    let slurm = SlurmInterface::with_config(config.system.slurm_bin_path.as_deref());

    if cli.once {
        return print_snapshot(&config, &slurm, &username);
    }

    tui::run(config, warnings, username, slurm)
}

/// Route `tracing` output to the diagnostics file.
///
/// Returns a warning for the status bar when the file cannot be opened; in
/// that case events are discarded so nothing is ever written to the terminal.
fn init_logging(path: &Path, level: &str) -> Option<String> {
    let filter = EnvFilter::try_from_env("SKTOP_LOG").unwrap_or_else(|_| EnvFilter::new(level));

    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file))
                .try_init();
            None
        }
        Err(e) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::sink)
                .try_init();
            Some(format!("cannot open log file {}: {}", path.display(), e))
        }
    }
}

/// Fetch one snapshot, reconcile it like the dashboard does and print it
fn print_snapshot(config: &TuiConfig, slurm: &SlurmInterface, username: &str) -> Result<()> {
    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let jobs = rt
        .block_on(slurm.fetch_jobs(username))
        .with_context(|| format!("failed to query jobs for user '{username}'"))?;

    let mut table = JobTable::default();
    table.reconcile(jobs, &SelectionSet::default(), Utc::now().timestamp());

    println!(
        "{}",
        display::format_jobs(table.rows(), config.display.name_max_length)
    );
    Ok(())
}
