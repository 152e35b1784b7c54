// src/core/config.rs

use std::num::NonZeroUsize;
use std::time::Duration;

use crate::core::error::ValidationError;
use crate::core::models::Candidate;

/// Default number of in-flight DNS / HTTP probes during enumeration.
pub const DEFAULT_ENUM_THREADS: usize = 50;
/// Default per-probe timeout during enumeration, in seconds.
pub const DEFAULT_ENUM_TIMEOUT_SECS: f64 = 5.0;
/// Default number of in-flight TCP connects during a port scan.
pub const DEFAULT_SCAN_THREADS: usize = 100;
/// Default per-probe timeout during a port scan, in seconds.
pub const DEFAULT_SCAN_TIMEOUT_SECS: f64 = 1.0;
/// Timeout used by the fingerprint and header analyzers.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
/// User agent sent with every HTTP request.
pub const USER_AGENT: &str = concat!("reconx-rs/", env!("CARGO_PKG_VERSION"));

/// One engine invocation: what to probe and how hard.
#[derive(Debug, Clone)]
pub struct ScanConfiguration {
    concurrency_limit: NonZeroUsize,
    per_probe_timeout: Duration,
    targets: Vec<Candidate>,
}

impl ScanConfiguration {
    /// Builds a configuration, rejecting a zero concurrency limit or a zero
    /// timeout.
    pub fn new(
        concurrency_limit: usize,
        per_probe_timeout: Duration,
        targets: Vec<Candidate>,
    ) -> Result<Self, ValidationError> {
        let concurrency_limit =
            NonZeroUsize::new(concurrency_limit).ok_or(ValidationError::InvalidConcurrency)?;
        if per_probe_timeout.is_zero() {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(Self { concurrency_limit, per_probe_timeout, targets })
    }

    pub fn concurrency_limit(&self) -> NonZeroUsize {
        self.concurrency_limit
    }

    pub fn per_probe_timeout(&self) -> Duration {
        self.per_probe_timeout
    }

    pub fn targets(&self) -> &[Candidate] {
        &self.targets
    }

    /// Same limits, different targets.
    pub fn with_targets(&self, targets: Vec<Candidate>) -> Self {
        Self { targets, ..self.clone() }
    }
}

/// Converts a user-supplied number of seconds into a timeout.
pub fn timeout_from_secs(secs: f64) -> Result<Duration, ValidationError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ValidationError::InvalidTimeout);
    }
    Duration::try_from_secs_f64(secs).map_err(|_| ValidationError::InvalidTimeout)
}
