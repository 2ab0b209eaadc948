//! Error types shared across the reporter.

use thiserror::Error;

/// Shared result type for fallible reporter setup.
pub type Result<T> = std::result::Result<T, ReporterError>;

/// Startup failures. Any of these aborts construction; nothing is left half-built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("license key must be set")]
    MissingLicenseKey,
    #[error("app name must not be empty")]
    MissingAppName,
    #[error("no endpoints registered, at least one is needed")]
    NoEndpoints,
    #[error("endpoint '{0}' is already registered")]
    DuplicateEndpoint(String),
    #[error("endpoint name '{0}' is reserved")]
    ReservedEndpoint(String),
    #[error("endpoint name must not be empty")]
    EmptyEndpointName,
    #[error("reporting interval must be at least one second")]
    InvalidInterval,
    #[error("can not resolve host name")]
    Hostname,
    #[error("invalid config: {0}")]
    Parse(String),
}

/// A single update that could not be applied. Logged and skipped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ObservationError {
    #[error("request to '{endpoint}' carries no start time")]
    MissingStartTime { endpoint: String },
}

/// A flush that could not be delivered. The flushed values are dropped.
#[derive(Debug, Error)]
pub enum TransmissionError {
    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("request to collector failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("collector answered {status}: {body}")]
    Status { status: u16, body: String },
}

/// Errors surfaced by the reporter's public API.
#[derive(Debug, Error)]
pub enum ReporterError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("reporter is {actual}, expected {expected}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("start must be called from within a tokio runtime")]
    NoRuntime,
}
