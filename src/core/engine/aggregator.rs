// src/core/engine/aggregator.rs

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::core::models::ResultSet;

/// Deduplicating accumulation of confirmed values.
///
/// Safe to share between many in-flight probes and across several scheduler
/// runs. Adding a value twice is a no-op.
#[derive(Debug)]
pub struct ResultAggregator<T: Ord> {
    found: Mutex<BTreeSet<T>>,
}

impl<T: Ord + Clone> ResultAggregator<T> {
    pub fn new() -> Self {
        Self { found: Mutex::new(BTreeSet::new()) }
    }

    // A panicking holder cannot leave a BTreeSet half-inserted, so a poisoned
    // lock is still usable.
    fn lock(&self) -> MutexGuard<'_, BTreeSet<T>> {
        self.found.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` if the value was not already present.
    pub fn add(&self, value: T) -> bool {
        self.lock().insert(value)
    }

    #[cfg(test)]
    pub fn extend<I: IntoIterator<Item = T>>(&self, values: I) {
        self.lock().extend(values);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Immutable copy of everything accumulated so far.
    pub fn snapshot(&self) -> ResultSet<T> {
        ResultSet::from_set(self.lock().clone())
    }
}

impl<T: Ord + Clone> Default for ResultAggregator<T> {
    fn default() -> Self {
        Self::new()
    }
}
