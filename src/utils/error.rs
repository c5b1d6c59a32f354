use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API returned HTTP {status} for {url}: {body}")]
    HttpStatusError {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Theta Terminal reported {error_type}: {message}")]
    RemoteError { error_type: String, message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration field '{field}' is invalid: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field '{field}'")]
    MissingConfigError { field: String },

    #[error("Invalid parameter '{field}' = '{value}': {reason}")]
    InvalidParameterError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Remote,
    Data,
    Storage,
    Configuration,
    Validation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn invalid_parameter(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        EtlError::InvalidParameterError {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        EtlError::ProcessingError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) => ErrorCategory::Network,
            EtlError::HttpStatusError { .. } | EtlError::RemoteError { .. } => {
                ErrorCategory::Remote
            }
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::ProcessingError { .. } => ErrorCategory::Data,
            EtlError::IoError(_) | EtlError::ZipError(_) => ErrorCategory::Storage,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::InvalidParameterError { .. } => ErrorCategory::Validation,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network | ErrorCategory::Remote => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Validation | ErrorCategory::Configuration => {
                ErrorSeverity::High
            }
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::ApiError(e) if e.is_connect() => {
                "Start Theta Terminal and check that --base-url points at it (default http://127.0.0.1:25510)".to_string()
            }
            EtlError::ApiError(e) if e.is_timeout() => {
                "The terminal did not answer in time; narrow the date range or raise --timeout-secs".to_string()
            }
            EtlError::ApiError(_) => "Check the terminal connection and try again".to_string(),
            EtlError::HttpStatusError { status: 472, .. } => {
                "No data exists for this request; check the symbol, contract and dates".to_string()
            }
            EtlError::HttpStatusError { status: 471, .. } => {
                "Your subscription does not cover this endpoint".to_string()
            }
            EtlError::HttpStatusError { .. } | EtlError::RemoteError { .. } => {
                "Read the terminal's message above; the request parameters were rejected".to_string()
            }
            EtlError::CsvError(_) | EtlError::SerializationError(_) => {
                "The response could not be decoded; make sure the terminal version serves the v2 API".to_string()
            }
            EtlError::ProcessingError { .. } => {
                "The response shape was unexpected; rerun with --verbose to inspect it".to_string()
            }
            EtlError::IoError(_) | EtlError::ZipError(_) => {
                "Check that the output directory exists and is writable".to_string()
            }
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => {
                "Fix the configuration value and run again".to_string()
            }
            EtlError::InvalidParameterError { field, .. } => match field.as_str() {
                "start_date" | "end_date" | "exp" => {
                    "Dates are formatted YYYYMMDD, e.g. 20240131".to_string()
                }
                "right" => "Use C for calls or P for puts".to_string(),
                "ivl" | "interval" => {
                    "Intervals are milliseconds between 100 and 3600000".to_string()
                }
                "venue" => "Venue must be nqb or utp_cta".to_string(),
                _ => "Check the command arguments".to_string(),
            },
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::ApiError(e) if e.is_connect() => {
                "Could not connect to Theta Terminal".to_string()
            }
            EtlError::HttpStatusError { status, body, .. } => {
                if body.trim().is_empty() {
                    format!("Theta Terminal rejected the request (HTTP {})", status)
                } else {
                    format!("Theta Terminal rejected the request (HTTP {}): {}", status, body.trim())
                }
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
