//! `pathprobe baseline` – print a directory's not-found fingerprint.

use anyhow::{bail, Result};
use pathprobe_core::config::ScanConfig;
use pathprobe_core::fetch::CurlFetcher;
use pathprobe_core::fingerprint::BaselineCell;
use pathprobe_core::output::OutputSerializer;
use pathprobe_core::pool::WorkerPool;
use pathprobe_core::report::Tally;
use pathprobe_core::DiscoveryTask;

pub async fn run_baseline(cfg: &ScanConfig, dir: &str) -> Result<()> {
    let serializer = OutputSerializer::stdout();
    let output = serializer.sink();
    let pool = WorkerPool::from_config(cfg, CurlFetcher::new(), output.clone())?;
    let dir = dir.to_string();

    let fingerprinted = tokio::task::spawn_blocking(move || {
        let task = DiscoveryTask::new(dir.clone(), dir);
        pool.discover_baselines(vec![task], &BaselineCell::new(), &Tally::new())
    })
    .await??;

    let outcome = match fingerprinted.first() {
        Some(DiscoveryTask {
            url,
            computed_404_crc: Some(crc),
            ..
        }) => {
            output.info(format!("Not-found fingerprint for {}: {:#010x}", url, crc));
            Ok(())
        }
        _ => Err(cfg.target_host.clone()),
    };
    drop(output);
    serializer.finish()?;

    match outcome {
        Ok(()) => Ok(()),
        Err(host) => bail!("no usable response from {}", host),
    }
}
