// src/utils/error.rs
use thiserror::Error;

/// Failures of a single outbound request. Never retried.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network request failed: {0}")]
    Network(reqwest::Error),

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("HTTP error {status} for {url}")]
    Http { status: reqwest::StatusCode, url: String },

    #[error("SEC rate limit likely exceeded (403 Forbidden) for {url}")]
    RateLimited { url: String },

    #[error("Malformed response body from {url}: {reason}")]
    Malformed { url: String, reason: String },
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            let url = err.url().map(|u| u.to_string()).unwrap_or_default();
            return FetchError::Timeout { url };
        }
        FetchError::Network(err)
    }
}

/// Errors of the resolve -> catalog pipeline.
#[derive(Error, Debug)]
pub enum EdgarError {
    /// Ticker absent from the lookup table. Recoverable.
    #[error("Ticker not found: {0}")]
    NotFound(String),

    #[error("Fetch failed: {0}")]
    FetchFailed(#[from] FetchError),

    /// The registry returned data that cannot be normalized without
    /// dropping or misaligning records. Aborts the current fetch.
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Missing precondition: {0}")]
    MissingPrecondition(String),
}

impl EdgarError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, EdgarError::NotFound(_))
    }
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Fetch(#[from] EdgarError),

    #[error("XML parsing error: {0}")]
    Xml(String),

    #[error("Report not found: {0}")]
    ReportNotFound(String),

    #[error("No statement table found in {0}")]
    TableNotFound(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum RatioError {
    #[error("No value for any of {labels:?} in period {period}")]
    MissingValue { labels: Vec<String>, period: String },

    #[error("Denominator {label} is zero in period {period}")]
    ZeroDenominator { label: String, period: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("EDGAR interaction failed: {0}")]
    Edgar(#[from] EdgarError),

    #[error("Report extraction failed: {0}")]
    Report(#[from] ReportError),

    #[error("Ratio calculation failed: {0}")]
    Ratio(#[from] RatioError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
