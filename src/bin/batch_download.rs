use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use theta_etl::app::batch::{self, JobStatus};
use theta_etl::config::toml_config::BatchConfig;
use theta_etl::utils::{logger, validation::Validate};
use theta_etl::{EtlEngine, LocalStorage, TerminalPipeline};

#[derive(Parser)]
#[command(name = "batch_download")]
#[command(about = "Run a TOML file of theta-etl downloads")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "theta-batch.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Dry run - show what would be downloaded without contacting the terminal
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = BatchConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config file '{}'", args.config))?;

    if config.json_logs() {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }
    tracing::info!("Loaded configuration from {}", args.config);

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("{}", e.user_friendly_message());
        eprintln!("Suggestion: {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let jobs = batch::plan(&config).context("invalid job command")?;

    if args.dry_run {
        println!("Dry run: {} jobs against {}", jobs.len(), config.terminal.base_url);
        println!("Output directory: {}", config.output.path);
        if let Some(archive) = &config.output.archive {
            println!("Archive: {}", archive);
        }
        for (job, entry) in jobs.iter().zip(&config.jobs) {
            println!("  {:<24} {}", job.name, entry.command);
        }
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    let storage = LocalStorage::from_config(&config);
    let pipeline = TerminalPipeline::new(storage.clone(), config.clone())?;
    let engine = Arc::new(EtlEngine::new_with_monitoring(pipeline, monitor_enabled));

    let summary = batch::run_batch(engine, &storage, &config).await?;

    for outcome in &summary.outcomes {
        match &outcome.status {
            JobStatus::Succeeded(output) => println!(
                "ok      {:<24} {} rows -> {}",
                outcome.name,
                output.table.len(),
                output.csv_path.as_deref().unwrap_or("-")
            ),
            JobStatus::Failed(e) => {
                println!("failed  {:<24} {}", outcome.name, e.user_friendly_message());
                println!("        suggestion: {}", e.recovery_suggestion());
            }
            JobStatus::Skipped => println!("skipped {:<24}", outcome.name),
        }
    }
    if let Some(archive) = &summary.archive {
        println!("Archive written to {}", archive);
    }
    if let Some(e) = &summary.archive_error {
        println!("Archive failed: {}", e.user_friendly_message());
        println!("        suggestion: {}", e.recovery_suggestion());
    }
    println!(
        "{} succeeded, {} failed, {} skipped",
        summary.succeeded(),
        summary.failed(),
        summary.skipped()
    );

    if !summary.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
