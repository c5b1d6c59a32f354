use crate::core::{ApiResponse, ConfigProvider, DataRequest, Pipeline, Storage, Table};
use crate::utils::error::{EtlError, Result};
use reqwest::header::ACCEPT;
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:25510";

/// Talks to Theta Terminal over HTTP and writes CSV files through `Storage`.
pub struct TerminalPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: Client,
}

impl<S: Storage, C: ConfigProvider> TerminalPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs()))
            .build()?;
        Ok(Self {
            storage,
            config,
            client,
        })
    }

    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url().trim_end_matches('/'), endpoint)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for TerminalPipeline<S, C> {
    async fn extract(&self, request: &DataRequest) -> Result<ApiResponse> {
        let url = self.url_for(&request.endpoint);
        tracing::debug!("Sending request to {} with params: {:?}", url, request.params);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .query(&request.params)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Request to {} failed with HTTP {}: {}", url, status, body.trim());
            return Err(EtlError::HttpStatusError {
                status: status.as_u16(),
                url,
                body,
            });
        }

        let body = response.text().await?;
        let parsed: ApiResponse = serde_json::from_str(&body)?;
        if let Some(err) = parsed.header.remote_error() {
            tracing::error!("Terminal reported an error for {}: {}", url, err);
            return Err(err);
        }

        tracing::info!("Request successful");
        Ok(parsed)
    }

    async fn transform(&self, request: &DataRequest, response: ApiResponse) -> Result<Table> {
        let table = Table::from_response(response, request.fallback_columns.as_deref())?;
        tracing::debug!(
            "Parsed {} rows x {} columns",
            table.len(),
            table.columns.len()
        );
        Ok(table)
    }

    async fn load(&self, request: &DataRequest, table: &Table) -> Result<String> {
        let file_name = request.file_name();
        let data = table.to_csv()?;

        tracing::debug!("Writing CSV file ({} bytes) to storage", data.len());
        self.storage.write_file(&file_name, &data).await?;

        let location = self.storage.location(&file_name);
        tracing::info!("CSV file written: {}", location);
        Ok(location)
    }
}
