//! Cooperative batch backend.
//!
//! `BatchFetcher::fetch_files` submits a whole batch of candidates at once
//! and handles each one as it completes, in completion order. A prober
//! reports per-candidate problems as a `ProbeSignal` value instead of
//! unwinding:
//!
//! - `Fatal`: the host is offline. The batch stops immediately and the
//!   remaining in-flight probes are dropped unclassified.
//! - `Reject`: the candidate cannot be probed; skipped.
//! - `SoftStop`: a known dead end for this candidate; counted as a non-match.

mod accumulator;
mod prober;
mod run;

pub use accumulator::{Accumulator, ResultAccumulator};
pub use prober::PolicyProber;
pub use run::{establish_baseline, run_batches};

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use thiserror::Error;

use crate::error::ScanError;
use crate::task::DiscoveryTask;

/// Non-success outcome of a single batch probe.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeSignal {
    #[error("host {host} is offline")]
    Fatal { host: String },
    #[error("candidate rejected: {reason}")]
    Reject { reason: String },
    #[error("candidate stopped")]
    SoftStop,
}

/// Heuristic flags attached to a probed entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryFlags {
    /// The task's match string was found in the body.
    pub string_match: bool,
    /// Body matched the not-found fingerprint.
    pub soft404: bool,
    /// Status outside the expected set.
    pub error_behavior: bool,
    /// 401: reported, never stored.
    pub protected: bool,
}

/// A completed probe handed to the validity filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeEntry {
    pub task: DiscoveryTask,
    pub url: String,
    pub status: u32,
    pub flags: EntryFlags,
}

/// Source of probe results for the batch backend.
#[async_trait]
pub trait BatchProber: Send + Sync {
    async fn probe(&self, task: DiscoveryTask) -> Result<Option<ProbeEntry>, ProbeSignal>;
}

/// Counts for one `fetch_files` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub accepted: usize,
    pub invalid: usize,
    pub rejected: usize,
    pub soft_stopped: usize,
}

/// Whether an entry must be dropped before reaching the accumulator.
///
/// A string match always wins over the soft-404 and error heuristics.
pub fn is_entry_invalid(entry: Option<&ProbeEntry>) -> bool {
    let Some(entry) = entry else {
        return true;
    };
    if entry.flags.string_match {
        return false;
    }
    entry.flags.soft404 || entry.flags.error_behavior
}

/// Drives one prober over batches of candidates and feeds valid entries to
/// an accumulator.
pub struct BatchFetcher<P, A> {
    host: String,
    prober: P,
    accumulator: A,
}

impl<P: BatchProber, A: Accumulator> BatchFetcher<P, A> {
    pub fn new(host: impl Into<String>, prober: P, accumulator: A) -> Self {
        Self {
            host: host.into(),
            prober,
            accumulator,
        }
    }

    pub fn accumulator(&self) -> &A {
        &self.accumulator
    }

    pub fn into_accumulator(self) -> A {
        self.accumulator
    }

    /// Probe every file concurrently and process results in completion order.
    /// Returns `ScanError::HostOffline` on the first fatal signal; probes
    /// still in flight are dropped without being classified.
    pub async fn fetch_files(
        &mut self,
        files: Vec<DiscoveryTask>,
    ) -> Result<BatchSummary, ScanError> {
        let mut summary = BatchSummary::default();
        let prober = &self.prober;
        let mut in_flight: FuturesUnordered<_> =
            files.into_iter().map(|file| prober.probe(file)).collect();

        while let Some(outcome) = in_flight.next().await {
            match outcome {
                Ok(entry) => {
                    if is_entry_invalid(entry.as_ref()) {
                        summary.invalid += 1;
                        continue;
                    }
                    if let Some(entry) = entry {
                        self.accumulator.add_entry(entry);
                        summary.accepted += 1;
                    }
                }
                Err(ProbeSignal::Fatal { host }) => {
                    tracing::warn!(
                        %host,
                        pending = in_flight.len(),
                        "host offline; aborting batch"
                    );
                    return Err(ScanError::HostOffline { host });
                }
                Err(ProbeSignal::Reject { reason }) => {
                    tracing::debug!(%reason, host = %self.host, "candidate rejected");
                    summary.rejected += 1;
                }
                Err(ProbeSignal::SoftStop) => {
                    summary.soft_stopped += 1;
                }
            }
        }
        Ok(summary)
    }
}
