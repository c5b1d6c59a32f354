use crate::app::dispatch;
use crate::config::commands::Command;
use crate::config::toml_config::{BatchConfig, ExecutionConfig, OnError};
use crate::core::etl::EtlEngine;
use crate::core::{FetchOutput, Pipeline, Storage};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::Validate;
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use zip::write::{FileOptions, ZipWriter};

/// A job whose command line parsed successfully.
#[derive(Debug, Clone)]
pub struct PlannedJob {
    pub name: String,
    pub command: Command,
}

#[derive(Debug)]
pub enum JobStatus {
    Succeeded(FetchOutput),
    Failed(EtlError),
    /// Not started because an earlier job failed under `on_error = "abort"`.
    Skipped,
}

#[derive(Debug)]
pub struct JobOutcome {
    pub name: String,
    pub status: JobStatus,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<JobOutcome>,
    pub archive: Option<String>,
    /// Set when the jobs ran but bundling their CSV files failed.
    pub archive_error: Option<EtlError>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.count(|s| matches!(s, JobStatus::Succeeded(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, JobStatus::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, JobStatus::Skipped))
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.skipped() == 0 && self.archive_error.is_none()
    }

    fn count(&self, pred: impl Fn(&JobStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Parses and validates every job's command line. Fails on the first bad one
/// so nothing runs from a half-valid file.
pub fn plan(config: &BatchConfig) -> Result<Vec<PlannedJob>> {
    config
        .jobs
        .iter()
        .map(|job| {
            let command = Command::parse_line(&job.command)?;
            command
                .validate()
                .map_err(|e| EtlError::ConfigValidationError {
                    field: format!("jobs.{}", job.name),
                    message: format!("'{}': {}", job.command, e),
                })?;
            Ok(PlannedJob {
                name: job.name.clone(),
                command,
            })
        })
        .collect()
}

/// Runs the jobs with at most `concurrent_requests` in flight. Outcomes come
/// back in job order regardless of completion order.
pub async fn run_jobs<P: Pipeline + 'static>(
    engine: Arc<EtlEngine<P>>,
    jobs: Vec<PlannedJob>,
    execution: &ExecutionConfig,
) -> Vec<JobOutcome> {
    let semaphore = Arc::new(Semaphore::new(execution.concurrent_requests.max(1)));
    let aborted = Arc::new(AtomicBool::new(false));
    let abort_on_error = execution.on_error == OnError::Abort;

    let handles: Vec<_> = jobs
        .into_iter()
        .map(|job| {
            let engine = Arc::clone(&engine);
            let semaphore = Arc::clone(&semaphore);
            let aborted = Arc::clone(&aborted);
            let name = job.name.clone();

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return JobStatus::Skipped,
                };
                if aborted.load(Ordering::SeqCst) {
                    return JobStatus::Skipped;
                }

                tracing::info!(job = %job.name, "Starting job");
                match dispatch::execute(&*engine, &job.command, true).await {
                    Ok(output) => {
                        tracing::info!(job = %job.name, rows = output.table.len(), "Job finished");
                        JobStatus::Succeeded(output)
                    }
                    Err(e) => {
                        tracing::error!(job = %job.name, "Job failed: {}", e);
                        if abort_on_error {
                            aborted.store(true, Ordering::SeqCst);
                        }
                        JobStatus::Failed(e)
                    }
                }
            });
            (name, handle)
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (name, handle) in handles {
        let status = handle.await.unwrap_or_else(|e| {
            JobStatus::Failed(EtlError::processing(format!("job task failed: {}", e)))
        });
        outcomes.push(JobOutcome { name, status });
    }
    outcomes
}

/// Bundles every CSV written by the batch into one zip through `storage`.
/// Jobs that wrote the same file name share one entry holding what is on
/// disk. Returns the archive's location.
pub async fn write_archive<S: Storage>(
    storage: &S,
    archive_name: &str,
    outcomes: &[JobOutcome],
) -> Result<String> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    for outcome in outcomes {
        let JobStatus::Succeeded(FetchOutput {
            csv_path: Some(csv_path),
            ..
        }) = &outcome.status
        else {
            continue;
        };
        let file_name = Path::new(csv_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| EtlError::processing(format!("bad CSV path {}", csv_path)))?;
        if !seen.insert(file_name.clone()) {
            tracing::debug!("{} already archived, skipping duplicate", file_name);
            continue;
        }
        let data = storage.read_file(&file_name).await?;
        entries.push((file_name, data));
    }

    tracing::debug!("Creating ZIP file with {} files", entries.len());
    let zip_data = {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (file_name, data) in &entries {
            zip.start_file::<_, ()>(file_name.as_str(), FileOptions::default())?;
            zip.write_all(data)?;
        }
        zip.finish()?.into_inner()
    };

    storage.write_file(archive_name, &zip_data).await?;
    let location = storage.location(archive_name);
    tracing::info!("Wrote archive {} ({} bytes)", location, zip_data.len());
    Ok(location)
}

/// Plans, runs and optionally archives a whole batch.
pub async fn run_batch<P, S>(
    engine: Arc<EtlEngine<P>>,
    storage: &S,
    config: &BatchConfig,
) -> Result<BatchSummary>
where
    P: Pipeline + 'static,
    S: Storage,
{
    let jobs = plan(config)?;
    tracing::info!(
        "Running {} jobs with up to {} in flight",
        jobs.len(),
        config.execution.concurrent_requests
    );

    let outcomes = run_jobs(Arc::clone(&engine), jobs, &config.execution).await;
    engine.monitor().log_final_stats();

    let mut summary = BatchSummary {
        outcomes,
        ..Default::default()
    };
    if let Some(name) = &config.output.archive {
        match write_archive(storage, name, &summary.outcomes).await {
            Ok(location) => summary.archive = Some(location),
            Err(e) => {
                tracing::error!("Failed to write archive {}: {}", name, e);
                summary.archive_error = Some(e);
            }
        }
    }

    Ok(summary)
}
