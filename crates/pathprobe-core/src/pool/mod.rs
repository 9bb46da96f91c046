//! Thread-pool backend.
//!
//! A run has two phases over the same pool of threads:
//!
//! 1. Baseline discovery: each directory task fetches a random file that
//!    cannot exist and records the fingerprint of the not-found page. The
//!    root's fingerprint is published as the run's baseline. The phase ends
//!    at the queue's completion barrier.
//! 2. Existence testing: each candidate is fetched and classified by
//!    `ProbePolicy` against the published baseline.
//!
//! Existence workers only start after phase 1 has fully drained, so no task
//! can be classified against a missing baseline.

mod baseline;
mod existence;
mod stop;

pub use stop::StopHandle;

use std::sync::Arc;
use std::thread;

use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::fetch::Fetcher;
use crate::fingerprint::BaselineCell;
use crate::output::OutputSink;
use crate::policy::{ProbePolicy, ProbeSettings};
use crate::queue::{Lease, TaskQueue};
use crate::report::{ScanReport, Tally};
use crate::retry::RetryDecision;
use crate::task::{DiscoveryTask, ResultCollection};

use stop::CloseOnPanic;

/// Fixed-size pool of worker threads sharing one fetcher and one policy.
pub struct WorkerPool<F> {
    fetcher: F,
    policy: ProbePolicy,
    settings: ProbeSettings,
    output: OutputSink,
    workers: usize,
    stop: StopHandle,
}

impl<F: Fetcher> WorkerPool<F> {
    pub fn new(
        fetcher: F,
        policy: ProbePolicy,
        settings: ProbeSettings,
        output: OutputSink,
        workers: usize,
    ) -> Self {
        Self {
            fetcher,
            policy,
            settings,
            output,
            workers: workers.max(1),
            stop: StopHandle::new(),
        }
    }

    /// Pool for `cfg.target_host` with `cfg.workers` threads.
    pub fn from_config(
        cfg: &ScanConfig,
        fetcher: F,
        output: OutputSink,
    ) -> Result<Self, ScanError> {
        let settings = ProbeSettings::from_config(cfg)?;
        Ok(Self::new(
            fetcher,
            ProbePolicy::from_config(cfg),
            settings,
            output,
            cfg.workers,
        ))
    }

    /// Handle that cancels this pool's current and future phases.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn policy(&self) -> &ProbePolicy {
        &self.policy
    }

    /// Full run: baseline phase over `directories` (the root is added if
    /// missing), then existence testing of `candidates`. Confirmed paths are
    /// appended to `results`.
    pub fn run(
        &self,
        directories: Vec<DiscoveryTask>,
        candidates: Vec<DiscoveryTask>,
        results: &ResultCollection,
    ) -> Result<ScanReport, ScanError> {
        let mut directories = directories;
        if !directories.iter().any(DiscoveryTask::is_root) {
            directories.insert(0, DiscoveryTask::root());
        }

        let cell = BaselineCell::new();
        let tally = Tally::new();
        let directories = self.discover_baselines(directories, &cell, &tally)?;
        if self.stop.is_stopped() {
            let mut report = tally.snapshot();
            report.directories = directories;
            report.cancelled = true;
            return Ok(report);
        }
        let baseline = cell.get().ok_or_else(|| ScanError::BaselineUnavailable {
            host: self.settings.host.clone(),
        })?;
        tracing::info!(baseline = %format!("{:#010x}", baseline), "baseline established");

        self.test_existence(candidates, baseline, results, &tally)?;

        let mut report = tally.snapshot();
        report.baseline = Some(baseline);
        report.directories = directories;
        report.cancelled = self.stop.is_stopped();
        Ok(report)
    }

    /// Phase 1. Returns the directory tasks that got a fingerprint; the root's
    /// fingerprint is published into `cell`.
    pub fn discover_baselines(
        &self,
        directories: Vec<DiscoveryTask>,
        cell: &BaselineCell,
        tally: &Tally,
    ) -> Result<Vec<DiscoveryTask>, ScanError> {
        let done = std::sync::Mutex::new(Vec::new());
        self.drain(directories, |lease| {
            if let Some(task) = self.fingerprint_directory(lease, cell, tally) {
                done.lock().unwrap_or_else(|e| e.into_inner()).push(task);
            }
        })?;
        Ok(done.into_inner().unwrap_or_else(|e| e.into_inner()))
    }

    /// Phase 2. Requires an established `baseline`.
    pub fn test_existence(
        &self,
        candidates: Vec<DiscoveryTask>,
        baseline: u32,
        results: &ResultCollection,
        tally: &Tally,
    ) -> Result<(), ScanError> {
        self.drain(candidates, |lease| {
            self.probe_candidate(lease, baseline, results, tally);
        })
    }

    /// Run `work` on every task with `self.workers` threads, blocking until
    /// the queue's completion barrier is reached (retries included).
    fn drain<W>(&self, tasks: Vec<DiscoveryTask>, work: W) -> Result<(), ScanError>
    where
        W: Fn(Lease<'_>) + Sync,
    {
        let queue = Arc::new(TaskQueue::from_tasks(tasks));
        self.stop.attach(&queue);
        let workers = self.workers;

        let panicked = thread::scope(|s| {
            let handles: Vec<_> = (0..workers)
                .map(|id| {
                    let queue = &queue;
                    let work = &work;
                    s.spawn(move || {
                        let _guard = CloseOnPanic(queue);
                        while let Some(lease) = queue.pop() {
                            work(lease);
                        }
                        tracing::trace!(worker = id, "worker exiting");
                    })
                })
                .collect();

            queue.join();
            queue.close();
            handles.into_iter().map(|h| h.join()).filter(Result::is_err).count()
        });

        self.stop.detach();
        if panicked > 0 {
            tracing::error!(panicked, "worker thread(s) panicked");
            return Err(ScanError::WorkerPanicked);
        }
        Ok(())
    }

    /// Shared timeout handling for both phases: requeue or report exhaustion.
    fn handle_timeout(&self, mut lease: Lease<'_>, url: &str, tally: &Tally) {
        match self.policy.timeouts.handle_timeout(lease.task_mut()) {
            RetryDecision::Requeue => {
                tally.retried();
                tracing::debug!(url, attempt = lease.task().timeout_count, "re-queuing");
                if self.settings.debug {
                    self.output.debug(format!("re-queuing {}", url));
                }
                lease.requeue();
            }
            RetryDecision::Exhausted => {
                tally.exhausted();
                tracing::warn!(url, "retries exhausted");
                self.output.timeout(url);
            }
        }
    }
}
