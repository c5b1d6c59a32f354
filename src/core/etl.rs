use crate::core::{DataRequest, FetchOutput, Pipeline};
use crate::utils::error::Result;
use crate::utils::monitor::SessionMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SessionMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SessionMonitor::new(monitor_enabled),
        }
    }

    pub fn monitor(&self) -> &SessionMonitor {
        &self.monitor
    }

    /// Runs one request through extract, transform and (when the request
    /// asks for it) load.
    #[tracing::instrument(skip_all, fields(endpoint = %request.endpoint, id = %request.identifier))]
    pub async fn run(&self, request: &DataRequest) -> Result<FetchOutput> {
        match self.run_phases(request).await {
            Ok(output) => {
                self.monitor.record_success(output.table.len());
                self.monitor.log_stats(&request.datatype);
                Ok(output)
            }
            Err(e) => {
                self.monitor.record_failure();
                tracing::warn!("Request failed: {}", e);
                Err(e)
            }
        }
    }

    async fn run_phases(&self, request: &DataRequest) -> Result<FetchOutput> {
        tracing::debug!("Extracting data...");
        let response = self.pipeline.extract(request).await?;

        tracing::debug!("Transforming {} response rows...", response.response.len());
        let table = self.pipeline.transform(request, response).await?;
        tracing::info!("Retrieved {} rows", table.len());

        if !request.write_csv {
            return Ok(FetchOutput {
                table,
                csv_path: None,
            });
        }

        tracing::debug!("Loading data...");
        let csv_path = self.pipeline.load(request, &table).await?;

        Ok(FetchOutput {
            table,
            csv_path: Some(csv_path),
        })
    }
}
