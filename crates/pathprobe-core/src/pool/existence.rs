//! Phase 2 worker: fetch a candidate and apply the classification policy.

use crate::fetch::Fetcher;
use crate::policy::Verdict;
use crate::queue::Lease;
use crate::report::Tally;
use crate::task::ResultCollection;

use super::WorkerPool;

impl<F: Fetcher> WorkerPool<F> {
    pub(super) fn probe_candidate(
        &self,
        lease: Lease<'_>,
        baseline: u32,
        results: &ResultCollection,
        tally: &Tally,
    ) {
        if lease.task().is_root() {
            tally.skipped();
            return;
        }
        let url = match self.settings.url_for(&lease.task().url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "skipping candidate");
                tally.skipped();
                return;
            }
        };
        if self.settings.debug {
            self.output.debug(format!("Testing: {}", url));
        }

        let response = self
            .fetcher
            .fetch(&url, &self.settings.user_agent, self.settings.timeout);
        let verdict = self.policy.classify(lease.task(), &response, baseline);
        tally.record(&verdict);

        match verdict {
            Verdict::Retry => self.handle_timeout(lease, &url, tally),
            Verdict::Skipped | Verdict::Absent(_) => {
                tracing::trace!(url, ?verdict, "not found");
            }
            Verdict::Protected => {
                if self.settings.echo_hits {
                    self.output.protected(&lease.task().description, &url);
                }
            }
            Verdict::Valid { string_matched } => {
                if self.settings.echo_hits {
                    self.output
                        .found(&lease.task().description, &url, string_matched);
                }
                let task = lease.into_task();
                if let Some(result) = verdict.into_result(task, response.status) {
                    results.push(result);
                }
            }
        }
    }
}
