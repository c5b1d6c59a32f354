use clap::Parser;
use std::io::Write;
use theta_etl::app::dispatch;
use theta_etl::utils::error::{ErrorSeverity, EtlError};
use theta_etl::utils::{logger, progress, validation::Validate};
use theta_etl::{CliConfig, EtlEngine, LocalStorage, TerminalPipeline};

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        fail(&e);
    }

    let storage = LocalStorage::from_config(&config);
    let to_stdout = config.stdout;
    let show_progress = !config.no_progress;
    let monitor_enabled = config.monitor;
    let command = config.command.clone();

    let pipeline = match TerminalPipeline::new(storage, config) {
        Ok(pipeline) => pipeline,
        Err(e) => fail(&e),
    };
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    let spinner = progress::create_spinner("Loading data...", show_progress);
    let result = dispatch::execute(&engine, &command, !to_stdout).await;
    spinner.finish_and_clear();

    engine.monitor().log_final_stats();

    match result {
        Ok(output) if to_stdout => {
            let written = output
                .table
                .to_csv()
                .and_then(|csv| Ok(std::io::stdout().write_all(&csv)?));
            if let Err(e) = written {
                fail(&e);
            }
        }
        Ok(output) => {
            println!("Data retrieved successfully");
            println!("Rows: {}", output.table.len());
            if let Some(path) = output.csv_path {
                println!("Saved to: {}", path);
            }
        }
        Err(e) => {
            tracing::error!(
                "Request failed: {} (category: {:?}, severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            fail(&e);
        }
    }
}

fn fail(e: &EtlError) -> ! {
    eprintln!("Failed to retrieve data");
    eprintln!("{}", e.user_friendly_message());
    eprintln!("Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
