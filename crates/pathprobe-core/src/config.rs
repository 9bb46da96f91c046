use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Concurrency backend used to drain the candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// OS threads sharing one task queue.
    #[default]
    Threads,
    /// Single-threaded async batches, processed in completion order.
    Async,
}

/// Scan configuration loaded from `~/.config/pathprobe/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Base URL every candidate path is joined against. Normally set per run.
    pub target_host: String,
    pub user_agent: String,
    /// Per-request timeout in seconds (connect and total).
    pub fetch_timeout_secs: u64,
    /// Requeues allowed after a transport failure before a task is dropped.
    pub max_timeout_count: u32,
    /// Bytes of body sampled for the not-found fingerprint.
    pub crc_sample_len: usize,
    /// Statuses that can count as a hit.
    pub expected_path_responses: Vec<u32>,
    /// HTTP status retried like a transport failure.
    pub server_error_status: u32,
    /// Emit per-request debug lines on the console.
    pub debug: bool,
    /// Echo hits as they are found.
    pub display_output: bool,
    /// Number of worker threads (threads backend).
    pub workers: usize,
    /// Requests in flight per batch (async backend).
    pub batch_size: usize,
    /// Consecutive transport failures after which the host is declared offline.
    pub dead_host_threshold: u32,
    pub backend: Backend,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            target_host: String::new(),
            user_agent: concat!("pathprobe/", env!("CARGO_PKG_VERSION")).to_string(),
            fetch_timeout_secs: 10,
            max_timeout_count: 2,
            crc_sample_len: 2048,
            expected_path_responses: vec![200, 301, 401, 403],
            server_error_status: 500,
            debug: false,
            display_output: true,
            workers: 16,
            batch_size: 64,
            dead_host_threshold: 10,
            backend: Backend::Threads,
        }
    }
}

impl ScanConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Whether a hit should be echoed to the console.
    pub fn echo_hits(&self) -> bool {
        self.display_output || self.debug
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pathprobe")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ScanConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ScanConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file. Missing keys take their defaults.
pub fn load_from_path(path: &Path) -> Result<ScanConfig> {
    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ScanConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
