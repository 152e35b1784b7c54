// src/core/engine/scheduler.rs

use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, trace, warn};

use crate::core::config::ScanConfiguration;
use crate::core::engine::{AdmissionController, Probe, ResultAggregator};
use crate::core::error::ProbeError;
use crate::core::models::ProbeOutcome;

/// Called once per settled probe, whatever its outcome.
pub type ProgressHook = Arc<dyn Fn() + Send + Sync>;

/// Outcome counts of one scheduler run, for diagnostics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub confirmed: usize,
    pub absent: usize,
    pub errored: usize,
}

impl RunStats {
    pub fn total(&self) -> usize {
        self.confirmed + self.absent + self.errored
    }
}

/// Expands a configuration's targets into probe tasks and runs them all to
/// completion under one [`AdmissionController`].
///
/// Gather, never fail fast: a probe that times out, errors or panics is
/// counted and dropped, and its siblings keep running.
pub struct ProbeScheduler {
    config: ScanConfiguration,
    admission: AdmissionController,
    progress: Option<ProgressHook>,
}

impl ProbeScheduler {
    pub fn new(config: ScanConfiguration) -> Self {
        let admission = AdmissionController::new(config.concurrency_limit());
        Self { config, admission, progress: None }
    }

    pub fn with_progress(mut self, hook: ProgressHook) -> Self {
        self.progress = Some(hook);
        self
    }

    #[cfg(test)]
    pub fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    /// Probes every target and adds each confirmed finding to `aggregator`.
    pub async fn run<P: Probe>(
        &self,
        probe: Arc<P>,
        aggregator: &ResultAggregator<P::Finding>,
    ) -> RunStats {
        let timeout = self.config.per_probe_timeout();
        let targets = self.config.targets();
        debug!(
            targets = targets.len(),
            limit = self.admission.limit().get(),
            ?timeout,
            "Scheduling probes."
        );

        let mut tasks = JoinSet::new();
        for candidate in targets.iter().cloned() {
            let probe = Arc::clone(&probe);
            let gate = self.admission.clone();
            tasks.spawn(async move {
                let outcome = match gate.acquire().await {
                    // The permit is held for the probe only and released at the end of this arm.
                    Ok(_permit) => match tokio::time::timeout(timeout, probe.probe(&candidate)).await {
                        Ok(outcome) => outcome,
                        Err(_) => ProbeOutcome::Errored(ProbeError::Timeout(timeout)),
                    },
                    Err(e) => ProbeOutcome::Errored(e),
                };
                (candidate, outcome)
            });
        }

        let mut stats = RunStats::default();
        while let Some(joined) = tasks.join_next().await {
            if let Some(hook) = &self.progress {
                hook();
            }
            match joined {
                Ok((candidate, ProbeOutcome::Confirmed(finding))) => {
                    stats.confirmed += 1;
                    if !aggregator.add(finding) {
                        trace!(%candidate, "Finding already recorded.");
                    }
                }
                Ok((candidate, ProbeOutcome::Absent)) => {
                    stats.absent += 1;
                    trace!(%candidate, "Probe found nothing.");
                }
                Ok((candidate, ProbeOutcome::Errored(e))) => {
                    stats.errored += 1;
                    debug!(%candidate, error = %e, "Probe errored, treating as absent.");
                }
                Err(e) => {
                    stats.errored += 1;
                    warn!(error = %e, "Probe task did not complete.");
                }
            }
        }

        info!(
            probes = stats.total(),
            confirmed = stats.confirmed,
            absent = stats.absent,
            errored = stats.errored,
            peak_in_flight = self.admission.peak_in_flight(),
            "Probe run finished."
        );
        stats
    }
}
