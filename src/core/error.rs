// src/core/error.rs

//! Error taxonomy for the recon engine.
//!
//! Validation errors are fatal and raised before any socket is opened.
//! Probe errors never leave the scheduler: they are folded into "absent".
//! Export errors only fail the stage that tried to write a report.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Input that was rejected before any network activity took place.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid domain: '{0}'")]
    InvalidDomain(String),

    #[error("invalid target '{0}': expected an IP address or a domain name")]
    InvalidTarget(String),

    #[error("invalid port specification '{spec}': {reason}")]
    InvalidPortSpec { spec: String, reason: String },

    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    #[error("concurrency limit must be at least 1")]
    InvalidConcurrency,

    #[error("per-probe timeout must be greater than zero")]
    InvalidTimeout,
}

/// A single probe failed. Kept for diagnostics, never surfaced to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("resolver error: {0}")]
    Resolve(String),

    #[error("connect error: {0}")]
    Connect(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("probe task failed: {0}")]
    TaskFailed(String),

    #[error("probe cannot handle candidate '{0}'")]
    Unsupported(String),
}

/// Writing a report failed. Previously collected results stay valid.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unsupported output format: '{0}'")]
    UnsupportedFormat(String),

    #[error("failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Umbrella error for the command layer.
#[derive(Debug, Error)]
pub enum ReconError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ReconError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_messages_name_the_input() {
        let err = ValidationError::InvalidPortSpec {
            spec: "80-".to_string(),
            reason: "missing range end".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid port specification '80-': missing range end"
        );
    }

    #[test]
    fn validation_converts_into_recon_error() {
        let err: ReconError = ValidationError::InvalidDomain("bad_domain".into()).into();
        assert!(matches!(err, ReconError::Validation(_)));
        assert_eq!(err.to_string(), "invalid domain: 'bad_domain'");
    }
}
