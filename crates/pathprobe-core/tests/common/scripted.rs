//! In-memory `Fetcher` that answers from a per-path script.
//!
//! Each path has a list of responses served in order; the last one repeats.
//! Paths without a script (including the random not-found probes) get the
//! fallback response.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use pathprobe_core::fetch::{FetchResponse, Fetcher};

pub const HOST: &str = "http://scripted.test/";

pub fn response(status: u32, body: &[u8]) -> FetchResponse {
    FetchResponse {
        status,
        body: body.to_vec(),
        headers: Vec::new(),
    }
}

pub fn transport_failure() -> FetchResponse {
    FetchResponse::transport_failure()
}

#[derive(Default)]
struct Script {
    routes: HashMap<String, Vec<FetchResponse>>,
    hits: HashMap<String, usize>,
}

pub struct ScriptedFetcher {
    fallback: FetchResponse,
    script: Mutex<Script>,
}

impl ScriptedFetcher {
    /// Unknown paths answer `404` with `not_found_body`.
    pub fn new(not_found_body: &[u8]) -> Self {
        Self::with_fallback(response(404, not_found_body))
    }

    pub fn with_fallback(fallback: FetchResponse) -> Self {
        Self {
            fallback,
            script: Mutex::new(Script::default()),
        }
    }

    pub fn route(self, path: &str, responses: Vec<FetchResponse>) -> Self {
        self.script
            .lock()
            .unwrap()
            .routes
            .insert(path.to_string(), responses);
        self
    }

    /// Number of fetches made for `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.script.lock().unwrap().hits.get(path).copied().unwrap_or(0)
    }
}

impl Fetcher for ScriptedFetcher {
    fn fetch(&self, url: &str, _user_agent: &str, _timeout: Duration) -> FetchResponse {
        let path = format!("/{}", url.strip_prefix(HOST).unwrap_or(url));
        let mut script = self.script.lock().unwrap();
        *script.hits.entry(path.clone()).or_default() += 1;
        match script.routes.get_mut(&path) {
            Some(queue) if queue.len() > 1 => queue.remove(0),
            Some(queue) => queue[0].clone(),
            None => self.fallback.clone(),
        }
    }
}
