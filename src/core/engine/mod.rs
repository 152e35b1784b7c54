// src/core/engine/mod.rs

//! The concurrent probing engine: admission control, the scheduler that fans
//! probes out under it, and the aggregator that collects what they confirm.

pub mod admission;
pub mod aggregator;
pub mod scheduler;

use std::future::Future;

use crate::core::models::{Candidate, ProbeOutcome};

pub use self::admission::AdmissionController;
pub use self::aggregator::ResultAggregator;
pub use self::scheduler::{ProbeScheduler, ProgressHook};

/// One atomic network check against a [`Candidate`].
///
/// Implementations report failures as `Absent` or `Errored` and never panic
/// on network errors. The scheduler applies the per-probe timeout, so a probe
/// may simply await its I/O.
pub trait Probe: Send + Sync + 'static {
    /// What a confirmed probe reports back.
    type Finding: Ord + Clone + Send + 'static;

    fn probe(&self, target: &Candidate) -> impl Future<Output = ProbeOutcome<Self::Finding>> + Send;
}
