mod common;

use clap::Parser;
use common::{body, read_lines};
use httpmock::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use theta_etl::app::dispatch;
use theta_etl::utils::validation::Validate;
use theta_etl::{CliConfig, EtlEngine, LocalStorage, TerminalPipeline};

fn parse(base_url: &str, output_dir: &str, command: &[&str]) -> CliConfig {
    let mut args = vec![
        "theta-etl",
        "--base-url",
        base_url,
        "--output-dir",
        output_dir,
        "--no-progress",
    ];
    args.extend_from_slice(command);
    CliConfig::try_parse_from(args).unwrap()
}

#[tokio::test]
async fn test_cli_command_runs_matching_endpoint() {
    let temp_dir = TempDir::new().unwrap();
    let output_dir = temp_dir.path().join("csv");
    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v2/hist/option/trade_quote")
                .query_param("root", "AAPL")
                .query_param("strike", "170000")
                .query_param("right", "P")
                .query_param("exclusive", "true")
                .query_param("rth", "true");
            then.status(200).json_body(body(
                &["ms_of_day", "price", "bid", "ask"],
                json!([[34200123, 1.25, 1.2, 1.3]]),
            ));
        })
        .await;

    let base_url = server.base_url();
    let config = parse(
        &base_url,
        output_dir.to_str().unwrap(),
        &[
            "options",
            "historical",
            "trade-quote",
            "AAPL",
            "20240119",
            "170000",
            "P",
            "20240102",
            "20240105",
            "--exclusive",
        ],
    );
    assert!(config.validate().is_ok());

    let storage = LocalStorage::from_config(&config);
    let command = config.command.clone();
    let engine = EtlEngine::new(TerminalPipeline::new(storage, config).unwrap());
    let output = dispatch::execute(&engine, &command, true).await.unwrap();

    api_mock.assert_async().await;
    let csv_path = output.csv_path.unwrap();
    assert!(csv_path.ends_with("historical_trade_quote_AAPL_20240119_170000_P.csv"));
    assert_eq!(read_lines(&csv_path)[1], "34200123,1.25,1.2,1.3");
}

#[tokio::test]
async fn test_cli_snapshot_quotes_with_venue() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v2/snapshot/stock/quote")
                .query_param("root", "MSFT")
                .query_param("venue", "utp_cta");
            then.status(200)
                .json_body(body(&["bid", "ask"], json!([[370.0, 370.1]])));
        })
        .await;

    let base_url = server.base_url();
    let config = parse(
        &base_url,
        temp_dir.path().to_str().unwrap(),
        &["stocks", "snapshot", "quotes", "MSFT", "--venue", "utp_cta"],
    );
    let storage = LocalStorage::new(temp_dir.path());
    let command = config.command.clone();
    let engine = EtlEngine::new(TerminalPipeline::new(storage, config).unwrap());

    let output = dispatch::execute(&engine, &command, false).await.unwrap();

    api_mock.assert_async().await;
    assert_eq!(output.csv_path, None);
    let csv = String::from_utf8(output.table.to_csv().unwrap()).unwrap();
    assert_eq!(csv, "bid,ask\n370.0,370.1\n");
}

#[test]
fn test_cli_rejects_malformed_arguments() {
    let bad = [
        vec!["theta-etl", "stocks", "snapshot", "quotes", "AAPL", "--venue", "nyse"],
        vec!["theta-etl", "options", "snapshot", "quote", "AAPL", "20240119", "abc", "C"],
        vec!["theta-etl", "stocks", "snapshot", "bulk-ohlc"],
        vec!["theta-etl", "options"],
    ];
    for args in bad {
        assert!(CliConfig::try_parse_from(&args).is_err(), "{:?}", args);
    }
}
