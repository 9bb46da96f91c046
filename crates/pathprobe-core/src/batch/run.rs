//! Async driver: establish the baseline, then probe candidates batch by batch.

use std::sync::Arc;

use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::fetch::{random_missing_path, Fetcher};
use crate::output::OutputSink;
use crate::policy::{ProbePolicy, ProbeSettings};
use crate::report::{ScanReport, Tally};
use crate::retry::run_with_retry;
use crate::task::{DiscoveryTask, ResultCollection, ROOT_PATH};

use super::{BatchFetcher, PolicyProber, ResultAccumulator};

/// Fetch a random missing file at the root and return its fingerprint.
/// An exhausted root probe is reported once as a timeout.
pub async fn establish_baseline<F: Fetcher + 'static>(
    fetcher: Arc<F>,
    policy: &ProbePolicy,
    settings: &ProbeSettings,
    output: &OutputSink,
) -> Result<u32, ScanError> {
    let url = settings.url_for(&random_missing_path(ROOT_PATH))?;
    let timeouts = policy.timeouts;
    let user_agent = settings.user_agent.clone();
    let timeout = settings.timeout;
    let fetched = tokio::task::spawn_blocking(move || {
        let mut root = DiscoveryTask::root();
        run_with_retry(&timeouts, &mut root, &url, || {
            fetcher.fetch(&url, &user_agent, timeout)
        })
    })
    .await
    .map_err(|_| ScanError::WorkerPanicked)?;

    match fetched {
        Ok(response) => Ok(policy.fingerprint(&response.body)),
        Err(exhausted) => {
            tracing::warn!(%exhausted, "baseline probe failed");
            output.timeout(&exhausted.url);
            Err(ScanError::BaselineUnavailable {
                host: settings.host.clone(),
            })
        }
    }
}

/// Probe `candidates` in batches of `cfg.batch_size`. Confirmed paths go to
/// `results`. Any error that ends the run (bad host, no baseline, host
/// offline) is sent to `output` as a fatal line and returned.
pub async fn run_batches<F: Fetcher + 'static>(
    cfg: &ScanConfig,
    fetcher: Arc<F>,
    candidates: Vec<DiscoveryTask>,
    results: &ResultCollection,
    output: &OutputSink,
) -> Result<ScanReport, ScanError> {
    let outcome = scan_batches(cfg, fetcher, candidates, results, output).await;
    if let Err(e) = &outcome {
        output.fatal(e.to_string());
    }
    outcome
}

async fn scan_batches<F: Fetcher + 'static>(
    cfg: &ScanConfig,
    fetcher: Arc<F>,
    candidates: Vec<DiscoveryTask>,
    results: &ResultCollection,
    output: &OutputSink,
) -> Result<ScanReport, ScanError> {
    let policy = ProbePolicy::from_config(cfg);
    let settings = ProbeSettings::from_config(cfg)?;
    let baseline = establish_baseline(Arc::clone(&fetcher), &policy, &settings, output).await?;
    tracing::info!(baseline = %format!("{:#010x}", baseline), "baseline established");

    let tally = Arc::new(Tally::new());
    let prober = PolicyProber::new(
        fetcher,
        policy,
        settings.clone(),
        baseline,
        output.clone(),
        Arc::clone(&tally),
    )
    .with_dead_host_threshold(cfg.dead_host_threshold);
    let accumulator = ResultAccumulator::new(results.clone(), output.clone(), settings.echo_hits);
    let mut batches = BatchFetcher::new(settings.host.clone(), prober, accumulator);

    let batch_size = cfg.batch_size.max(1);
    let mut candidates = candidates.into_iter().peekable();
    while candidates.peek().is_some() {
        let batch: Vec<DiscoveryTask> = candidates.by_ref().take(batch_size).collect();
        let summary = batches.fetch_files(batch).await?;
        tracing::debug!(?summary, "batch done");
    }

    let mut report = tally.snapshot();
    report.baseline = Some(baseline);
    Ok(report)
}
