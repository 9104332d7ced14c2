//! Accumulation of per-repository results into the final aggregate (spec §4.8).

use std::collections::BTreeMap;
use std::time::Duration;

use crate::model::{BulkResult, RepositoryResult, StatusCode};

/// Tallies a stream of [`RepositoryResult`] (already in input order, per
/// [`crate::runner::run_bulk`]'s guarantee) into a [`BulkResult`].
pub struct Reporter {
    total_scanned: usize,
    repositories: Vec<RepositoryResult>,
}

impl Reporter {
    pub fn new(total_scanned: usize) -> Self {
        Self {
            total_scanned,
            repositories: Vec::new(),
        }
    }

    pub fn record(&mut self, result: RepositoryResult) {
        self.repositories.push(result);
    }

    /// Consume the accumulated results into a [`BulkResult`], building the
    /// per-status histogram from what was actually recorded.
    pub fn finish(self, duration: Duration) -> BulkResult {
        let mut histogram: BTreeMap<StatusCode, u32> = BTreeMap::new();
        for result in &self.repositories {
            *histogram.entry(result.status).or_insert(0) += 1;
        }
        BulkResult {
            total_scanned: self.total_scanned,
            total_processed: self.repositories.len(),
            duration,
            per_status_histogram: histogram,
            repositories: self.repositories,
        }
    }
}

/// Build a [`BulkResult`] directly from a completed results vector, as
/// produced by [`crate::runner::run_bulk`].
pub fn summarize(total_scanned: usize, results: Vec<RepositoryResult>, duration: Duration) -> BulkResult {
    let mut reporter = Reporter::new(total_scanned);
    for result in results {
        reporter.record(result);
    }
    reporter.finish(duration)
}
