// src/core/engine/admission.rs

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::trace;

use crate::core::error::ProbeError;

/// Counting gate bounding how many probes are in flight at once.
///
/// Cloning is cheap and every clone shares the same permits. Waiting for a
/// permit has no deadline: the probe timeout only starts once the permit is
/// held, so the limit caps throughput and never rejects work.
#[derive(Debug, Clone)]
pub struct AdmissionController {
    semaphore: Arc<Semaphore>,
    limit: NonZeroUsize,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

/// A held admission slot. Dropping it releases the slot.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        // Runs before the semaphore permit is returned.
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AdmissionController {
    pub fn new(limit: NonZeroUsize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(limit.get())),
            limit,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Suspends until a slot is free.
    pub async fn acquire(&self) -> Result<AdmissionPermit, ProbeError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| ProbeError::TaskFailed(format!("admission gate closed: {e}")))?;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        trace!(in_flight = now, limit = self.limit.get(), "Admission granted.");

        Ok(AdmissionPermit { _permit: permit, in_flight: Arc::clone(&self.in_flight) })
    }

    pub fn limit(&self) -> NonZeroUsize {
        self.limit
    }

    /// Probes currently holding a permit.
    #[cfg(test)]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously held permits seen so far.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}
