//! libcurl-backed `Fetcher`.

use std::str;
use std::time::Duration;

use super::parse::parse_header_lines;
use super::{FetchResponse, Fetcher};

/// Body bytes kept per response. Fingerprints only look at the first
/// `crc_sample_len` bytes, but match strings may sit anywhere in the page.
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Blocking GET over libcurl. One `Easy` handle per call; safe to share
/// between worker threads.
#[derive(Debug, Clone)]
pub struct CurlFetcher {
    follow_redirects: bool,
    max_body_bytes: usize,
}

impl Default for CurlFetcher {
    fn default() -> Self {
        Self {
            follow_redirects: false,
            max_body_bytes: MAX_BODY_BYTES,
        }
    }
}

impl CurlFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow redirects instead of reporting the 3xx itself. Off by default:
    /// a 301 on a directory is a hit in its own right.
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    fn get(
        &self,
        url: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<FetchResponse, curl::Error> {
        let mut body: Vec<u8> = Vec::new();
        let mut lines: Vec<String> = Vec::new();
        let limit = self.max_body_bytes;

        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.useragent(user_agent)?;
        easy.follow_location(self.follow_redirects)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(timeout)?;
        easy.timeout(timeout)?;
        easy.accept_encoding("")?;

        {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    lines.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.write_function(|data| {
                let room = limit.saturating_sub(body.len());
                body.extend_from_slice(&data[..data.len().min(room)]);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let status = easy.response_code()?;
        Ok(FetchResponse {
            status,
            body,
            headers: parse_header_lines(&lines),
        })
    }
}

impl Fetcher for CurlFetcher {
    fn fetch(&self, url: &str, user_agent: &str, timeout: Duration) -> FetchResponse {
        match self.get(url, user_agent, timeout) {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(url, error = %e, "transport failure");
                FetchResponse::transport_failure()
            }
        }
    }
}
