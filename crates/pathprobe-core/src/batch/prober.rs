//! `BatchProber` over a blocking `Fetcher` and the shared `ProbePolicy`.

use async_trait::async_trait;
use std::sync::Arc;

use crate::fetch::Fetcher;
use crate::output::OutputSink;
use crate::policy::{AbsentReason, ProbePolicy, ProbeSettings, Verdict};
use crate::report::Tally;
use crate::retry::run_with_retry;
use crate::task::DiscoveryTask;

use super::{BatchProber, EntryFlags, ProbeEntry, ProbeSignal};

/// Fetches on the blocking pool, retries per `TimeoutPolicy`, then classifies
/// on the scheduler thread after the await point. A probe dropped by a fatal
/// abort is therefore never classified.
pub struct PolicyProber<F> {
    fetcher: Arc<F>,
    policy: ProbePolicy,
    settings: ProbeSettings,
    baseline: u32,
    output: OutputSink,
    tally: Arc<Tally>,
    dead_host_threshold: u32,
}

impl<F: Fetcher + 'static> PolicyProber<F> {
    pub fn new(
        fetcher: Arc<F>,
        policy: ProbePolicy,
        settings: ProbeSettings,
        baseline: u32,
        output: OutputSink,
        tally: Arc<Tally>,
    ) -> Self {
        Self {
            fetcher,
            policy,
            settings,
            baseline,
            output,
            tally,
            dead_host_threshold: u32::MAX,
        }
    }

    /// Declare the host offline after `threshold` transport failures in a row.
    pub fn with_dead_host_threshold(mut self, threshold: u32) -> Self {
        self.dead_host_threshold = threshold.max(1);
        self
    }

    fn entry(
        &self,
        task: DiscoveryTask,
        url: String,
        status: u32,
        verdict: Verdict,
    ) -> Result<Option<ProbeEntry>, ProbeSignal> {
        let mut flags = EntryFlags::default();
        match verdict {
            Verdict::Skipped | Verdict::Retry => return Err(ProbeSignal::SoftStop),
            Verdict::Absent(AbsentReason::MatchStringMissing) => return Err(ProbeSignal::SoftStop),
            Verdict::Absent(AbsentReason::MatchesBaseline) => flags.soft404 = true,
            Verdict::Absent(AbsentReason::UnexpectedStatus(_)) => flags.error_behavior = true,
            Verdict::Protected => flags.protected = true,
            Verdict::Valid { string_matched } => flags.string_match = string_matched,
        }
        Ok(Some(ProbeEntry {
            task,
            url,
            status,
            flags,
        }))
    }
}

#[async_trait]
impl<F: Fetcher + 'static> BatchProber for PolicyProber<F> {
    async fn probe(&self, task: DiscoveryTask) -> Result<Option<ProbeEntry>, ProbeSignal> {
        if task.is_root() {
            return Err(ProbeSignal::SoftStop);
        }
        let url = self.settings.url_for(&task.url).map_err(|e| ProbeSignal::Reject {
            reason: e.to_string(),
        })?;
        if self.settings.debug {
            self.output.debug(format!("Testing: {}", url));
        }

        let fetcher = Arc::clone(&self.fetcher);
        let tally = Arc::clone(&self.tally);
        let timeouts = self.policy.timeouts;
        let user_agent = self.settings.user_agent.clone();
        let timeout = self.settings.timeout;
        let fetch_url = url.clone();
        let (task, fetched) = tokio::task::spawn_blocking(move || {
            let mut task = task;
            let fetched = run_with_retry(&timeouts, &mut task, &fetch_url, || {
                let response = fetcher.fetch(&fetch_url, &user_agent, timeout);
                if response.is_transport_failure() {
                    tally.transport_failed();
                } else {
                    tally.transport_ok();
                }
                response
            });
            (task, fetched)
        })
        .await
        .map_err(|e| ProbeSignal::Reject {
            reason: format!("fetch task failed: {}", e),
        })?;

        for _ in 0..task.timeout_count {
            self.tally.retried();
        }

        let response = match fetched {
            Ok(response) => response,
            Err(exhausted) => {
                self.tally.exhausted();
                self.output.timeout(&url);
                tracing::warn!(%exhausted, "retries exhausted");
                if self.tally.consecutive_failures() >= self.dead_host_threshold {
                    return Err(ProbeSignal::Fatal {
                        host: self.settings.host.clone(),
                    });
                }
                return Err(ProbeSignal::SoftStop);
            }
        };

        let verdict = self.policy.classify(&task, &response, self.baseline);
        self.tally.record(&verdict);
        self.entry(task, url, response.status, verdict)
    }
}
