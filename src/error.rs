// src/error.rs

use reqwest::StatusCode;
use thiserror::Error;

/// Problems with the inputs handed to the ingestor. These are raised before
/// any network traffic and always abort the run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("window {0} is required but was not provided")]
    MissingWindowBound(&'static str),

    #[error("window {which} {value:?} is neither a YYYY-MM-DD date nor an ISO timestamp")]
    InvalidWindowBound { which: &'static str, value: String },

    #[error("pipeline variables are not valid JSON: {0}")]
    InvalidVars(#[from] serde_json::Error),

    #[error("availability ceiling {0:?} is not a YYYY-MM-DD date")]
    InvalidCeiling(String),

    #[error("invalid base URL {0:?}: {1}")]
    InvalidBaseUrl(String, url::ParseError),
}

/// Why a single fetch target was skipped. Never aborts the run.
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("timed out")]
    Timeout,

    #[error("HTTP {0}")]
    Status(StatusCode),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("could not read parquet body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchFailure::Timeout
        } else if let Some(status) = err.status() {
            FetchFailure::Status(status)
        } else {
            FetchFailure::Transport(err.to_string())
        }
    }
}

impl From<parquet::errors::ParquetError> for FetchFailure {
    fn from(err: parquet::errors::ParquetError) -> Self {
        FetchFailure::Decode(err.to_string())
    }
}

impl From<arrow::error::ArrowError> for FetchFailure {
    fn from(err: arrow::error::ArrowError) -> Self {
        FetchFailure::Decode(err.to_string())
    }
}

/// Fatal outcome of an ingest run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not assemble the result table: {0}")]
    Assemble(#[from] arrow::error::ArrowError),
}
