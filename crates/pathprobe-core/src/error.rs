//! Errors that end a scan run.
//!
//! Per-path outcomes (absent, protected, retry exhausted) are not errors;
//! they are reported through the output channel and counted in `ScanReport`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    /// The target host stopped answering altogether.
    #[error("host {host} appears to be offline")]
    HostOffline { host: String },
    /// The root not-found page could not be fetched, so no soft-404 baseline exists.
    #[error("could not establish a not-found baseline for {host}")]
    BaselineUnavailable { host: String },
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("worker thread panicked")]
    WorkerPanicked,
}
