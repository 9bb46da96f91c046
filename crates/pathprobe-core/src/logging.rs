//! Diagnostic logging through `tracing`.
//!
//! Log lines go to `$XDG_STATE_HOME/pathprobe/pathprobe.log`, or to stderr
//! when that file cannot be opened. Console findings go through
//! `output::OutputSerializer` and never through the subscriber.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "pathprobe.log";

/// Filter used when `RUST_LOG` is unset.
fn default_filter(debug: bool, to_file: bool) -> &'static str {
    match (debug, to_file) {
        (true, _) => "debug,pathprobe_core=trace,pathprobe=trace",
        (false, true) => "info,pathprobe_core=debug,pathprobe=debug",
        // stderr shares the terminal with findings; keep it quiet.
        (false, false) => "warn",
    }
}

fn env_filter(debug: bool, to_file: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(debug, to_file)))
}

/// Directory holding the log file.
pub fn log_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pathprobe")?;
    Ok(xdg_dirs.get_state_home().join("pathprobe"))
}

/// Open (append) the log file inside `dir`, creating the directory if needed.
pub fn open_log_file(dir: &Path) -> Result<(fs::File, PathBuf)> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join(LOG_FILE_NAME);
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open {}", path.display()))?;
    Ok((file, path))
}

/// Install the file subscriber. Returns the log file path.
/// On failure the caller should fall back to `init_logging_stderr`.
pub fn init_logging(debug: bool) -> Result<PathBuf> {
    let (file, path) = open_log_file(&log_dir()?)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(debug, true))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install subscriber: {e}"))?;

    tracing::info!(path = %path.display(), "logging initialized");
    Ok(path)
}

/// Log to stderr only. Used when the log file is unavailable.
pub fn init_logging_stderr(debug: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(debug, false))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
