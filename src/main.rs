//! Credit Risk Audit - Main Entry Point
//!
//! `credit-audit score` scores loan applications with the trained model;
//! `credit-audit metrics` computes group and bias metrics over a scored,
//! labeled sample.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use credit_risk_audit::{
    config::{AppConfig, LoggingConfig},
    consumer::RecordReader,
    metrics::MetricsReporter,
    models::inference::InferenceEngine,
    producer::ReportWriter,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const DEFAULT_CONFIG: &str = "config/config.toml";

/// Credit default scoring and fairness audit.
#[derive(Parser)]
#[command(name = "credit-audit", about = "Credit default scoring and fairness audit", version)]
struct Cli {
    /// Configuration file (defaults to config/config.toml when present).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score loan applications read from a JSON lines file.
    Score {
        /// Applications, one JSON object per line.
        #[arg(short, long, default_value = "data/df_sample.json")]
        input: PathBuf,

        /// Model artifact, overriding `model.path`.
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Score only the first N applications.
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Compute group and bias metrics over scored, labeled records.
    Metrics {
        /// Scored records, one JSON object per line.
        #[arg(short, long, default_value = "data/df_sample_scored.json")]
        input: PathBuf,

        /// Write the report here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the report.
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, config_found) = load_config(cli.config.as_deref())?;
    init_logging(&config.logging, cli.verbose)?;

    if !config_found {
        warn!("No configuration file at {}, using defaults", DEFAULT_CONFIG);
    }

    match cli.command {
        Commands::Score {
            input,
            model,
            limit,
        } => score(&config, &input, model.as_deref(), limit),
        Commands::Metrics {
            input,
            output,
            pretty,
        } => metrics(&config, &input, output.as_deref(), pretty),
    }
}

fn load_config(path: Option<&Path>) -> Result<(AppConfig, bool)> {
    match path {
        Some(path) => Ok((AppConfig::load_from_path(path)?, true)),
        None if Path::new(DEFAULT_CONFIG).exists() => Ok((AppConfig::load()?, true)),
        None => Ok((AppConfig::default(), false)),
    }
}

fn init_logging(logging: &LoggingConfig, verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("credit_risk_audit={level}").parse()?)
        .add_directive(format!("credit_audit={level}").parse()?);

    // Logs go to stderr so stdout carries only JSON results
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format.as_str() {
        "json" => builder.json().init(),
        _ => builder.init(),
    }

    Ok(())
}

fn score(config: &AppConfig, input: &Path, model: Option<&Path>, limit: Option<usize>) -> Result<()> {
    let model_path = model.unwrap_or_else(|| Path::new(&config.model.path));

    let engine = InferenceEngine::new();
    engine
        .initialize(model_path)
        .with_context(|| format!("Failed to initialize model from {}", model_path.display()))?;

    let records = RecordReader::open(input)
        .and_then(RecordReader::read_all)
        .with_context(|| format!("Failed to read applications from {}", input.display()))?;

    let mut writer = ReportWriter::stdout(false);
    let mut scored_count = 0;
    for (index, record) in records.iter().take(limit.unwrap_or(usize::MAX)).enumerate() {
        let scored = engine
            .score(record)
            .with_context(|| format!("Failed to score application {index}"))?;
        writer.write_record(&scored)?;
        scored_count += 1;
    }
    writer.flush()?;

    info!(scored = scored_count, "Scoring complete");
    Ok(())
}

fn metrics(config: &AppConfig, input: &Path, output: Option<&Path>, pretty: bool) -> Result<()> {
    let records = RecordReader::open(input)
        .and_then(RecordReader::read_all)
        .with_context(|| format!("Failed to read scored records from {}", input.display()))?;

    let reporter = MetricsReporter::new(config.audit.clone());
    let report = reporter
        .metrics(&records)
        .context("Failed to compute fairness metrics")?;

    let mut writer = match output {
        Some(path) => ReportWriter::create(path, pretty)?,
        None => ReportWriter::stdout(pretty),
    };
    writer.write_report(&report)?;
    writer.flush()?;

    info!(
        group_rows = report.group_metrics.len(),
        bias_rows = report.bias_metrics.len(),
        "Metrics report complete"
    );
    Ok(())
}
