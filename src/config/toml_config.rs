use crate::core::pipeline::DEFAULT_BASE_URL;
use crate::core::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_path, validate_range, validate_url, Validate};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A batch of download jobs run against one terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub terminal: TerminalConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    pub monitoring: Option<MonitoringConfig>,
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    /// Zip file, relative to `path`, bundling every CSV the batch wrote.
    pub archive: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    #[default]
    Continue,
    Abort,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_concurrency")]
    pub concurrent_requests: usize,
    #[serde(default)]
    pub on_error: OnError,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            concurrent_requests: default_concurrency(),
            on_error: OnError::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    #[serde(default)]
    pub json_logs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,
    /// A `theta-etl` command line without the program name.
    pub command: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_concurrency() -> usize {
    4
}

impl BatchConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value. Unset variables are left
    /// as written so validation can point at them.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_url("terminal.base_url", &self.terminal.base_url)?;
        validate_range("terminal.timeout_seconds", self.terminal.timeout_seconds, 1, 3600)?;
        validate_path("output.path", &self.output.path)?;
        if let Some(archive) = &self.output.archive {
            validate_path("output.archive", archive)?;
        }
        validate_range(
            "execution.concurrent_requests",
            self.execution.concurrent_requests,
            1,
            64,
        )?;

        if self.jobs.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "jobs".to_string(),
            });
        }
        for (index, job) in self.jobs.iter().enumerate() {
            if job.name.trim().is_empty() || job.command.trim().is_empty() {
                return Err(EtlError::InvalidConfigValueError {
                    field: format!("jobs[{}]", index),
                    value: job.name.clone(),
                    reason: "every job needs a name and a command".to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.json_logs).unwrap_or(false)
    }
}

impl ConfigProvider for BatchConfig {
    fn base_url(&self) -> &str {
        &self.terminal.base_url
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn timeout_secs(&self) -> u64 {
        self.terminal.timeout_seconds
    }
}

impl Validate for BatchConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
