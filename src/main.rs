//! Form Guard for Zentinel
//!
//! Replays recorded form submissions through the threat detector and prints
//! one JSON verdict per line. Lines of the form `{"unblock": "<ip>"}` clear
//! an identity at that point in the stream.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use zentinel_form_guard::replay::replay;
use zentinel_form_guard::{FormGuardConfig, ThreatDetectionOrchestrator};

#[derive(Parser, Debug)]
#[command(name = "zentinel-form-guard")]
#[command(author, version, about = "Threat detection for public form endpoints")]
struct Args {
    /// Path to configuration file (JSON or YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON-lines file of submissions and unblock events; reads stdin when omitted or "-"
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Enable JSON logging format
    #[arg(long)]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(json: bool, level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    // Verdicts go to stdout; logs stay on stderr.
    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(io::stderr))
            .init();
    }
}

fn open_input(path: Option<&PathBuf>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(p) if p.as_os_str() != "-" => {
            let file = std::fs::File::open(p)
                .with_context(|| format!("failed to open input {}", p.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.json_logs, &args.log_level);

    let config = match &args.config {
        Some(path) => FormGuardConfig::from_path(path)?,
        None => FormGuardConfig::default(),
    };

    let guard = ThreatDetectionOrchestrator::from_config(config);

    let reader = open_input(args.input.as_ref())?;
    let summary = replay(&guard, reader, io::stdout().lock()).context("replay failed")?;

    let stats = guard.reputation().stats();
    info!(
        evaluated = summary.evaluated,
        blocked = summary.blocked,
        unblocked = summary.unblocked,
        skipped = summary.skipped,
        suspicious = stats.suspicious_count,
        blacklisted = ?guard.reputation().blacklisted(),
        "Replay complete"
    );

    Ok(())
}
