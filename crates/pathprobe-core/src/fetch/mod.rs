//! HTTP fetch layer.
//!
//! The engine only sees the `Fetcher` trait: one GET per call, returning the
//! status, body, and headers. A status of `0` means no response was received
//! (connect/DNS/timeout failure); it is a sentinel, not an HTTP status.
//! `CurlFetcher` is the libcurl implementation used by the CLI.

mod transport;
mod parse;

pub use transport::CurlFetcher;
pub use parse::parse_header_lines;

use anyhow::{Context, Result};
use std::time::Duration;
use url::Url;

use crate::retry::TRANSPORT_FAILURE;

/// Outcome of a single GET.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status, or `0` on transport failure.
    pub status: u32,
    pub body: Vec<u8>,
    /// Response headers of the final response, in order.
    pub headers: Vec<(String, String)>,
}

impl FetchResponse {
    /// Response standing in for a transport failure.
    pub fn transport_failure() -> Self {
        Self {
            status: TRANSPORT_FAILURE,
            ..Self::default()
        }
    }

    pub fn is_transport_failure(&self) -> bool {
        self.status == TRANSPORT_FAILURE
    }

    /// First header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Blocking GET used by every worker.
///
/// Implementations must never fail: transport errors are reported as
/// `FetchResponse::transport_failure()` so the retry policy can handle them.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str, user_agent: &str, timeout: Duration) -> FetchResponse;
}

impl<F: Fetcher + ?Sized> Fetcher for std::sync::Arc<F> {
    fn fetch(&self, url: &str, user_agent: &str, timeout: Duration) -> FetchResponse {
        (**self).fetch(url, user_agent, timeout)
    }
}

/// Join a task path against the target host (`http://host/` + `/admin`).
pub fn resolve_url(host: &str, path: &str) -> Result<String> {
    let base = Url::parse(host).with_context(|| format!("invalid target host {host:?}"))?;
    let joined = base
        .join(path)
        .with_context(|| format!("cannot join {path:?} onto {host}"))?;
    Ok(joined.into())
}

/// Path of a file that almost certainly does not exist under directory `base`.
pub fn random_missing_path(base: &str) -> String {
    let name = uuid::Uuid::new_v4();
    if base.ends_with('/') {
        format!("{base}{name}")
    } else {
        format!("{base}/{name}")
    }
}
