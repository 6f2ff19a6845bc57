//! Command line entry point for the rating engine
//!
//! Loads a ratings file and a recorded match, applies the configured rating
//! method and writes the updated ratings back out.

use anyhow::{Context, Result};
use clap::Parser;
use rating_engine::config::{AppConfig, RatingMethodKind};
use rating_engine::metrics::RatingMetrics;
use rating_engine::rating::{OrchestratorSettings, RatingMethod, RatingUpdateOrchestrator};
use rating_engine::{InMemoryRatingStorage, MatchOutcome, RatingRecord};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Rating Engine - apply a match result to stored skill ratings
#[derive(Parser)]
#[command(
    name = "rating-engine",
    version,
    about = "Compute updated skill ratings for a recorded match",
    long_about = "Rating Engine reads participant rating records and a match outcome, \
                 computes new ratings with Elo, RMS-weighted Elo or Glicko-2, and writes \
                 every updated record in one batch."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Current rating records
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "JSON array of rating records"
    )]
    ratings: Option<PathBuf>,

    /// Match outcome to apply
    #[arg(
        short,
        long = "match",
        value_name = "FILE",
        help = "JSON match outcome (team_a, team_b, result)"
    )]
    match_file: Option<PathBuf>,

    /// Where to write the updated records
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Output path for updated records (defaults to stdout)"
    )]
    output: Option<PathBuf>,

    /// Rating method override
    #[arg(long, value_name = "METHOD", help = "Override rating method (elo, rms, glicko2)")]
    method: Option<String>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Print Prometheus metrics after the update
    #[arg(long, help = "Print metrics in Prometheus text format to stderr")]
    print_metrics: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and exit without rating anything"
    )]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from file/environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }
    if let Some(method) = &args.method {
        config.rating.method = method.parse::<RatingMethodKind>()?;
    }

    rating_engine::config::validate_config(&config)?;
    Ok(config)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Display startup information
fn display_startup_banner(config: &AppConfig) {
    info!("Rating Engine v{}", rating_engine::VERSION);
    info!("   Service: {}", config.service.name);
    info!("   Method: {}", config.rating.method);
    info!("   Commit timeout: {}ms", config.service.commit_timeout_ms);
    info!(
        "   Max commit attempts: {}",
        config.service.max_commit_attempts
    );
}

async fn run(args: &Args, config: &AppConfig) -> Result<()> {
    let ratings_path = args
        .ratings
        .as_ref()
        .context("--ratings is required unless --dry-run is given")?;
    let match_path = args
        .match_file
        .as_ref()
        .context("--match is required unless --dry-run is given")?;

    let records: Vec<RatingRecord> = read_json(ratings_path)?;
    let outcome: MatchOutcome = read_json(match_path)?;
    info!(
        "Loaded {} rating records and a {} match ({} vs {} participants)",
        records.len(),
        outcome.result,
        outcome.team_a.len(),
        outcome.team_b.len()
    );

    let method = RatingMethod::from_config(&config.rating)?;
    let storage = Arc::new(InMemoryRatingStorage::from_records(records));
    let metrics = Arc::new(RatingMetrics::new()?);
    let orchestrator = RatingUpdateOrchestrator::new(
        method,
        storage.clone(),
        OrchestratorSettings::from(&config.service),
    )
    .with_metrics(metrics.clone());

    let summary = orchestrator.record_match(&outcome).await?;
    for delta in &summary.deltas {
        info!(
            "{}: {:.1} -> {:.1} ({:+.1})",
            delta.participant_id,
            delta.old_value,
            delta.new_value,
            delta.change()
        );
    }

    let updated = serde_json::to_string_pretty(&storage.snapshot()?)?;
    match &args.output {
        Some(path) => std::fs::write(path, updated)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", updated),
    }

    if args.print_metrics {
        eprintln!("{}", metrics.gather_text()?);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    display_startup_banner(&config);

    if args.dry_run {
        info!("Configuration validation successful");
        return Ok(());
    }

    if let Err(e) = run(&args, &config).await {
        error!("Rating update failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
