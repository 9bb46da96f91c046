//! `pathprobe scan` – probe a candidate list on one host.

use anyhow::Result;
use pathprobe_core::batch;
use pathprobe_core::config::{Backend, ScanConfig};
use pathprobe_core::fetch::{resolve_url, CurlFetcher};
use pathprobe_core::output::{OutputSerializer, OutputSink};
use pathprobe_core::pool::WorkerPool;
use pathprobe_core::{DiscoveryTask, ResultCollection, ScanError, ScanReport};
use std::path::Path;
use std::sync::Arc;

use super::load_candidates;

pub async fn run_scan(cfg: ScanConfig, paths: &Path, dirs: Vec<String>) -> Result<ScanReport> {
    let candidates = load_candidates(paths)?;
    let directories: Vec<DiscoveryTask> = dirs
        .into_iter()
        .map(|d| DiscoveryTask::new(d.clone(), d))
        .collect();

    let serializer = OutputSerializer::stdout();
    let output = serializer.sink();
    output.info(format!(
        "Scanning {} with {} candidate path(s) ({:?} backend)",
        cfg.target_host,
        candidates.len(),
        cfg.backend
    ));

    if let Some(notice) = ignored_directories_notice(&cfg, &directories) {
        tracing::warn!("{}", notice);
        output.info(notice);
    }

    let results = ResultCollection::new();
    let outcome = match cfg.backend {
        Backend::Threads => scan_threads(&cfg, directories, candidates, &results, &output).await,
        Backend::Async => scan_async(&cfg, candidates, &results, &output).await,
    };

    if let Ok(report) = &outcome {
        summarize(&cfg, report, &results, &output);
    }
    drop(output);
    serializer.finish()?;
    Ok(outcome?)
}

async fn scan_threads(
    cfg: &ScanConfig,
    directories: Vec<DiscoveryTask>,
    candidates: Vec<DiscoveryTask>,
    results: &ResultCollection,
    output: &OutputSink,
) -> Result<ScanReport, ScanError> {
    let pool = WorkerPool::from_config(cfg, CurlFetcher::new(), output.clone())?;
    let stop = pool.stop_handle();
    let results = results.clone();
    let mut scan = tokio::task::spawn_blocking(move || pool.run(directories, candidates, &results));

    let joined = tokio::select! {
        joined = &mut scan => joined,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted; stopping workers");
            output.info("Interrupted, waiting for in-flight requests");
            stop.stop();
            scan.await
        }
    };
    let outcome = joined.map_err(|_| ScanError::WorkerPanicked).and_then(|r| r);
    if let Err(e) = &outcome {
        output.fatal(e.to_string());
    }
    outcome
}

async fn scan_async(
    cfg: &ScanConfig,
    candidates: Vec<DiscoveryTask>,
    results: &ResultCollection,
    output: &OutputSink,
) -> Result<ScanReport, ScanError> {
    let fetcher = Arc::new(CurlFetcher::new());
    tokio::select! {
        outcome = batch::run_batches(cfg, fetcher, candidates, results, output) => outcome,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted; dropping in-flight batch");
            output.info("Interrupted");
            Ok(ScanReport {
                cancelled: true,
                ..ScanReport::default()
            })
        }
    }
}

/// The async backend only fingerprints the root; `--dir` has no effect there.
fn ignored_directories_notice(cfg: &ScanConfig, directories: &[DiscoveryTask]) -> Option<String> {
    if cfg.backend != Backend::Async || directories.is_empty() {
        return None;
    }
    let dirs: Vec<&str> = directories.iter().map(|d| d.url.as_str()).collect();
    Some(format!(
        "Ignoring --dir {} (the async backend only fingerprints the root)",
        dirs.join(", ")
    ))
}

fn summarize(
    cfg: &ScanConfig,
    report: &ScanReport,
    results: &ResultCollection,
    output: &OutputSink,
) {
    let hits = results.snapshot();
    if !cfg.echo_hits() {
        for hit in &hits {
            // Same join the fetch used, so the reported URL is the probed one.
            let url = resolve_url(&cfg.target_host, &hit.task.url)
                .unwrap_or_else(|_| hit.task.url.clone());
            output.found(&hit.task.description, &url, hit.string_matched);
        }
    }
    if let (true, Some(baseline)) = (cfg.debug, report.baseline) {
        output.debug(format!("Baseline fingerprint: {:#010x}", baseline));
    }
    // An interrupted async run has no tally; the result collection is authoritative.
    output.info(format!(
        "{} found, {} protected, {} timed out, {} retries{}",
        hits.len(),
        report.protected,
        report.exhausted,
        report.retries,
        if report.cancelled { " (interrupted)" } else { "" }
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathprobe_core::output::OutputMessage;
    use pathprobe_core::ValidPathResult;

    fn config(host: &str, display_output: bool) -> ScanConfig {
        ScanConfig {
            target_host: host.to_string(),
            display_output,
            ..ScanConfig::default()
        }
    }

    fn hit(path: &str) -> ValidPathResult {
        ValidPathResult {
            task: DiscoveryTask::new(path, "Admin"),
            status: 200,
            protected: false,
            string_matched: false,
        }
    }

    #[test]
    fn quiet_summary_reports_the_probed_url() {
        let cfg = config("http://example.com/app/", false);
        let results = ResultCollection::new();
        results.push(hit("/admin"));
        let (output, rx) = OutputSink::detached();

        summarize(&cfg, &ScanReport::default(), &results, &output);

        let messages: Vec<OutputMessage> = rx.try_iter().collect();
        assert_eq!(
            messages[0],
            OutputMessage::Found {
                description: "Admin".into(),
                url: resolve_url("http://example.com/app/", "/admin").unwrap(),
                string_matched: false,
            }
        );
        assert!(matches!(
            &messages[0],
            OutputMessage::Found { url, .. } if url == "http://example.com/admin"
        ));
    }

    #[test]
    fn interrupted_summary_counts_stored_hits() {
        let cfg = config("http://example.com/", true);
        let results = ResultCollection::new();
        results.push(hit("/admin"));
        results.push(hit("/login"));
        let (output, rx) = OutputSink::detached();
        let report = ScanReport {
            cancelled: true,
            ..ScanReport::default()
        };

        summarize(&cfg, &report, &results, &output);

        let messages: Vec<OutputMessage> = rx.try_iter().collect();
        assert_eq!(
            messages,
            vec![OutputMessage::Info(
                "2 found, 0 protected, 0 timed out, 0 retries (interrupted)".into()
            )]
        );
    }

    #[test]
    fn dir_with_async_backend_is_flagged() {
        let dirs = vec![DiscoveryTask::new("/images/", "/images/")];
        let mut cfg = config("http://example.com/", true);
        assert!(ignored_directories_notice(&cfg, &dirs).is_none());
        cfg.backend = Backend::Async;
        let notice = ignored_directories_notice(&cfg, &dirs).unwrap();
        assert!(notice.contains("/images/"));
        assert!(ignored_directories_notice(&cfg, &[]).is_none());
    }
}
