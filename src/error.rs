use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("run deadline passed before {url} was fetched")]
    DeadlineExceeded { url: String },

    #[error("fetch of {url} aborted: {reason}")]
    Aborted { url: String, reason: String },
}

/// Company enrichment failed; the record keeps its fields and gets an empty patch.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("settings file not found: {0}")]
    Missing(String),

    #[error("invalid settings: {0}")]
    Invalid(#[from] config::ConfigError),
}

/// No records survived URL processing and the sample fallback.
#[derive(Debug, Error)]
#[error("no job records found")]
pub struct NoDataError;
