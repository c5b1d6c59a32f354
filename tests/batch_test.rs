mod common;

use common::body;
use httpmock::prelude::*;
use serde_json::json;
use std::io::Read;
use std::sync::Arc;
use tempfile::TempDir;
use theta_etl::app::batch::{self, JobStatus};
use theta_etl::config::toml_config::OnError;
use theta_etl::utils::validation::Validate;
use theta_etl::{BatchConfig, EtlEngine, EtlError, LocalStorage, TerminalPipeline};

const JOBS: &str = r#"
[terminal]
base_url = "http://127.0.0.1:25510"

[output]
path = "./data"
archive = "bundle.zip"

[execution]
concurrent_requests = 2

[[jobs]]
name = "aapl-eod"
command = "stocks historical eod-report AAPL 20240101 20240131"

[[jobs]]
name = "spy-chain"
command = "options snapshot bulk-open-interest SPY 20240119"

[[jobs]]
name = "msft-trades"
command = "stocks snapshot trades MSFT"
"#;

fn config_for(server: &MockServer, dir: &TempDir) -> BatchConfig {
    let mut config = BatchConfig::from_toml_str(JOBS).unwrap();
    config.terminal.base_url = server.base_url();
    config.output.path = dir.path().display().to_string();
    config.validate().unwrap();
    config
}

#[tokio::test]
async fn test_batch_runs_jobs_and_archives_csv_files() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/hist/stock/eod");
            then.status(200)
                .json_body(body(&["close", "date"], json!([[185.64, 20240102]])));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/bulk_snapshot/option/open_interest");
            then.status(200).json_body(body(
                &["open_interest", "date"],
                json!([{
                    "ticks": [[1520, 20240102]],
                    "contract": {"root": "SPY", "expiration": 20240119, "strike": 470000, "right": "C"}
                }]),
            ));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/snapshot/stock/trade");
            then.status(472).body("No data for the specified timeframe");
        })
        .await;

    let config = config_for(&server, &temp_dir);
    let storage = LocalStorage::new(temp_dir.path());
    let pipeline = TerminalPipeline::new(storage.clone(), config.clone()).unwrap();
    let engine = Arc::new(EtlEngine::new(pipeline));

    let summary = batch::run_batch(engine, &storage, &config).await.unwrap();

    let names: Vec<&str> = summary.outcomes.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, ["aapl-eod", "spy-chain", "msft-trades"]);
    assert_eq!(summary.succeeded(), 2);
    assert_eq!(summary.failed(), 1);
    assert!(!summary.is_success());
    assert!(matches!(
        summary.outcomes[2].status,
        JobStatus::Failed(EtlError::HttpStatusError { status: 472, .. })
    ));

    let archive_path = summary.archive.unwrap();
    let mut archive =
        zip::ZipArchive::new(std::fs::File::open(&archive_path).unwrap()).unwrap();
    assert_eq!(archive.len(), 2);

    let mut csv = String::new();
    archive
        .by_name("eod_report_AAPL_20240101_20240131.csv")
        .unwrap()
        .read_to_string(&mut csv)
        .unwrap();
    assert_eq!(csv, "close,date\n185.64,20240102\n");
    assert!(archive
        .by_name("bulk_option_open_interest_snapshot_SPY_20240119.csv")
        .is_ok());
}

#[tokio::test]
async fn test_abort_skips_remaining_jobs() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    let eod = server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/hist/stock/eod");
            then.status(500).body("terminal exploded");
        })
        .await;
    let others = server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(200).json_body(body(&["x"], json!([])));
        })
        .await;

    let mut config = config_for(&server, &temp_dir);
    config.execution.concurrent_requests = 1;
    config.execution.on_error = OnError::Abort;
    config.output.archive = None;

    let storage = LocalStorage::new(temp_dir.path());
    let pipeline = TerminalPipeline::new(storage.clone(), config.clone()).unwrap();
    let engine = Arc::new(EtlEngine::new(pipeline));

    let summary = batch::run_batch(engine, &storage, &config).await.unwrap();

    eod.assert_async().await;
    others.assert_hits_async(0).await;
    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.skipped(), 2);
    assert_eq!(summary.archive, None);
}

#[test]
fn test_plan_rejects_bad_job_before_running_anything() {
    let mut config = BatchConfig::from_toml_str(JOBS).unwrap();
    config.jobs[1].command = "options snapshot quote SPY 20240119 470000 X".to_string();
    assert!(batch::plan(&config).is_err());
}

const COLLIDING_JOBS: &str = r#"
[output]
path = "./data"
archive = "bundle.zip"

[[jobs]]
name = "spy-quotes"
command = "options bulk quote SPY 20240119 20240102 20240102 --ivl 60000"

[[jobs]]
name = "spy-quotes-at-time"
command = "options bulk quote-at-time SPY 20240119 20240102 20240102 --ivl 60000"
"#;

async fn mock_bulk_quotes(server: &MockServer) {
    for path in ["/v2/bulk_hist/option/quote", "/v2/bulk_at_time/option/quote"] {
        server
            .mock_async(|when, then| {
                when.method(GET).path(path);
                then.status(200).json_body(body(&["bid", "ask"], json!([])));
            })
            .await;
    }
}

fn colliding_config(server: &MockServer, dir: &TempDir) -> BatchConfig {
    let mut config = BatchConfig::from_toml_str(COLLIDING_JOBS).unwrap();
    config.terminal.base_url = server.base_url();
    config.output.path = dir.path().display().to_string();
    config
}

#[tokio::test]
async fn test_archive_holds_one_entry_per_file_name() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    mock_bulk_quotes(&server).await;

    let config = colliding_config(&server, &temp_dir);
    let storage = LocalStorage::new(temp_dir.path());
    let pipeline = TerminalPipeline::new(storage.clone(), config.clone()).unwrap();
    let engine = Arc::new(EtlEngine::new(pipeline));

    let summary = batch::run_batch(engine, &storage, &config).await.unwrap();

    assert_eq!(summary.succeeded(), 2);
    assert!(summary.archive_error.is_none());
    assert!(summary.is_success());

    let archive_path = summary.archive.unwrap();
    let archive = zip::ZipArchive::new(std::fs::File::open(&archive_path).unwrap()).unwrap();
    assert_eq!(archive.len(), 1);
    assert_eq!(
        archive.file_names().collect::<Vec<_>>(),
        ["bulk_option_quote_SPY_20240119.csv"]
    );
}

#[tokio::test]
async fn test_archive_failure_keeps_job_outcomes() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    mock_bulk_quotes(&server).await;
    // A directory where the archive should go makes the write fail.
    std::fs::create_dir(temp_dir.path().join("bundle.zip")).unwrap();

    let config = colliding_config(&server, &temp_dir);
    let storage = LocalStorage::new(temp_dir.path());
    let pipeline = TerminalPipeline::new(storage.clone(), config.clone()).unwrap();
    let engine = Arc::new(EtlEngine::new(pipeline));

    let summary = batch::run_batch(engine, &storage, &config).await.unwrap();

    assert_eq!(summary.outcomes.len(), 2);
    assert_eq!(summary.succeeded(), 2);
    assert_eq!(summary.archive, None);
    assert!(summary.archive_error.is_some());
    assert!(!summary.is_success());
}

#[test]
fn test_plan_validates_dates_before_running() {
    let mut config = BatchConfig::from_toml_str(JOBS).unwrap();
    config.jobs[0].command = "stocks historical eod-report AAPL 20240230 20240101".to_string();
    let err = batch::plan(&config).unwrap_err();
    assert!(err.to_string().contains("aapl-eod"), "{}", err);
}
