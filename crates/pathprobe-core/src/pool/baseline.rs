//! Phase 1 worker: fingerprint the not-found page of each directory.

use crate::fetch::{random_missing_path, Fetcher};
use crate::fingerprint::BaselineCell;
use crate::queue::Lease;
use crate::report::Tally;
use crate::task::DiscoveryTask;

use super::WorkerPool;

impl<F: Fetcher> WorkerPool<F> {
    /// Fetch a random missing file under the leased directory and store the
    /// fingerprint in the task. Returns the task once it has a fingerprint;
    /// `None` if it was requeued, exhausted, or unjoinable.
    pub(super) fn fingerprint_directory(
        &self,
        mut lease: Lease<'_>,
        cell: &BaselineCell,
        tally: &Tally,
    ) -> Option<DiscoveryTask> {
        let path = random_missing_path(&lease.task().url);
        let url = match self.settings.url_for(&path) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(dir = %lease.task().url, error = %e, "skipping directory");
                tally.skipped();
                return None;
            }
        };
        if self.settings.debug {
            self.output.debug(url.clone());
        }

        let response = self
            .fetcher
            .fetch(&url, &self.settings.user_agent, self.settings.timeout);
        if self.policy.timeouts.is_retryable(response.status) {
            self.handle_timeout(lease, &url, tally);
            return None;
        }

        let crc = self.policy.fingerprint(&response.body);
        let task = lease.task_mut();
        task.computed_404_crc = Some(crc);
        if task.is_root() && !cell.publish(crc) {
            tracing::warn!("root baseline already published; keeping the first value");
        }
        tracing::debug!(
            dir = %task.url,
            status = response.status,
            crc,
            "computed not-found fingerprint"
        );
        if self.settings.debug {
            self.output
                .debug(format!("Computed checksum for: {} ({:#010x})", task.url, crc));
        }
        Some(lease.into_task())
    }
}
