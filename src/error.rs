use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum MetricsError {
    #[error("The series is empty")]
    EmptySeries,

    #[error("Not enough data: need at least {required} months, have {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Index {index} is out of range for a series of {len} months")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Malformed month label '{0}', expected e.g. 'January 2024'")]
    MalformedMonth(String),

    #[error("Months are not contiguous: '{current}' does not follow '{previous}'")]
    NotContiguous { previous: String, current: String },
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid report URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Report endpoint returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("No metrics data found in the response")]
    MissingMetrics,

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read or write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported input format for {0}, expected .json or .csv")]
    UnsupportedFormat(PathBuf),
}
