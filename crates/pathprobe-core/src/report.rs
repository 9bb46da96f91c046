//! Per-run counters shared by the worker threads and the batch backend.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use crate::policy::Verdict;
use crate::task::DiscoveryTask;

/// Summary of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub confirmed: usize,
    pub protected: usize,
    pub absent: usize,
    /// Tasks dropped after running out of retries.
    pub exhausted: usize,
    /// Requeues performed (each one is an extra fetch).
    pub retries: usize,
    /// Candidates dropped without a fetch (root path, unjoinable URL, rejected).
    pub skipped: usize,
    /// Baseline used for soft-404 detection.
    pub baseline: Option<u32>,
    /// Directory tasks with their computed not-found fingerprint.
    pub directories: Vec<DiscoveryTask>,
    /// True if the run was stopped before the queue drained.
    pub cancelled: bool,
}

/// Lock-free counters updated as tasks reach a terminal state.
#[derive(Debug, Default)]
pub struct Tally {
    confirmed: AtomicUsize,
    protected: AtomicUsize,
    absent: AtomicUsize,
    exhausted: AtomicUsize,
    retries: AtomicUsize,
    skipped: AtomicUsize,
    /// Transport failures in a row across all workers; reset by any response.
    consecutive_failures: AtomicU32,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a terminal verdict. `Retry` is not terminal and is ignored here.
    pub fn record(&self, verdict: &Verdict) {
        let counter = match verdict {
            Verdict::Skipped => &self.skipped,
            Verdict::Retry => return,
            Verdict::Absent(_) => &self.absent,
            Verdict::Protected => &self.protected,
            Verdict::Valid { .. } => &self.confirmed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn retried(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Note a transport failure; returns the current run of consecutive failures.
    pub fn transport_failed(&self) -> u32 {
        self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Acquire)
    }

    pub fn transport_ok(&self) {
        self.consecutive_failures.store(0, Ordering::Release);
    }

    /// Counters so far, with no baseline or directories attached.
    pub fn snapshot(&self) -> ScanReport {
        ScanReport {
            confirmed: self.confirmed.load(Ordering::Relaxed),
            protected: self.protected.load(Ordering::Relaxed),
            absent: self.absent.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            ..ScanReport::default()
        }
    }
}
