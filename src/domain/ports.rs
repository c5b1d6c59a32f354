use crate::domain::model::{ApiResponse, DataRequest, Table};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Display form of where `path` lands, for messages and return values.
    fn location(&self, path: &str) -> String;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn output_path(&self) -> &str;
    fn timeout_secs(&self) -> u64;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self, request: &DataRequest) -> Result<ApiResponse>;
    async fn transform(&self, request: &DataRequest, response: ApiResponse) -> Result<Table>;
    async fn load(&self, request: &DataRequest, table: &Table) -> Result<String>;
}
