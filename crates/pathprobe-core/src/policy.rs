//! Classification policy shared by every backend.
//!
//! `ProbePolicy::classify` is a pure function of the response, the task, and
//! the baseline fingerprint. The worker pool and the batch orchestrator both
//! call it; neither makes its own hit/miss decisions.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use regex::bytes::{Regex, RegexBuilder};

use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::fetch::{resolve_url, FetchResponse};
use crate::fingerprint::compute_limited_crc;
use crate::retry::TimeoutPolicy;
use crate::task::{DiscoveryTask, ValidPathResult};

/// Status returned for paths behind authentication.
pub const STATUS_UNAUTHORIZED: u32 = 401;

/// Why a response was judged not to be a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbsentReason {
    /// Status not in the expected set.
    UnexpectedStatus(u32),
    /// Body fingerprint equals the baseline (soft-404).
    MatchesBaseline,
    /// A match string was configured and the body does not contain it.
    MatchStringMissing,
}

/// Result of classifying one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Root path: only used for the baseline, never classified.
    Skipped,
    /// Transport failure or server error; hand the task to the timeout policy.
    Retry,
    Absent(AbsentReason),
    /// 401 with a body that differs from the baseline. Reported, never kept.
    Protected,
    Valid { string_matched: bool },
}

impl Verdict {
    /// Result-collection entry for a `Valid` verdict; `None` otherwise.
    pub fn into_result(self, task: DiscoveryTask, status: u32) -> Option<ValidPathResult> {
        match self {
            Verdict::Valid { string_matched } => Some(ValidPathResult {
                task,
                status,
                protected: false,
                string_matched,
            }),
            _ => None,
        }
    }
}

/// Decision inputs taken from the scan configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbePolicy {
    pub expected_statuses: BTreeSet<u32>,
    pub crc_sample_len: usize,
    pub timeouts: TimeoutPolicy,
}

impl Default for ProbePolicy {
    fn default() -> Self {
        Self::from_config(&ScanConfig::default())
    }
}

impl ProbePolicy {
    pub fn from_config(cfg: &ScanConfig) -> Self {
        Self {
            expected_statuses: cfg.expected_path_responses.iter().copied().collect(),
            crc_sample_len: cfg.crc_sample_len,
            timeouts: TimeoutPolicy {
                max_timeout_count: cfg.max_timeout_count,
                server_error_status: cfg.server_error_status,
            },
        }
    }

    /// Fingerprint of `body` under this policy's sample length.
    pub fn fingerprint(&self, body: &[u8]) -> u32 {
        compute_limited_crc(body, self.crc_sample_len)
    }

    /// Classify `response` for `task` against the root not-found `baseline`.
    pub fn classify(
        &self,
        task: &DiscoveryTask,
        response: &FetchResponse,
        baseline: u32,
    ) -> Verdict {
        if task.is_root() {
            return Verdict::Skipped;
        }
        let status = response.status;
        if self.timeouts.is_retryable(status) {
            return Verdict::Retry;
        }
        if !self.expected_statuses.contains(&status) {
            return Verdict::Absent(AbsentReason::UnexpectedStatus(status));
        }
        if self.fingerprint(&response.body) == baseline {
            return Verdict::Absent(AbsentReason::MatchesBaseline);
        }
        if status == STATUS_UNAUTHORIZED {
            return Verdict::Protected;
        }
        match task.match_string.as_deref() {
            Some(needle) if body_contains(&response.body, needle) => {
                Verdict::Valid { string_matched: true }
            }
            Some(_) => Verdict::Absent(AbsentReason::MatchStringMissing),
            None => Verdict::Valid { string_matched: false },
        }
    }
}

/// Request settings shared by both backends for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    pub host: String,
    pub user_agent: String,
    pub timeout: Duration,
    /// Echo hits and protected paths to the console as they are found.
    pub echo_hits: bool,
    pub debug: bool,
}

impl ProbeSettings {
    /// Settings for `cfg.target_host`; fails if the host is not an absolute URL.
    pub fn from_config(cfg: &ScanConfig) -> Result<Self, ScanError> {
        url::Url::parse(&cfg.target_host)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", cfg.target_host, e)))?;
        Ok(Self {
            host: cfg.target_host.clone(),
            user_agent: cfg.user_agent.clone(),
            timeout: cfg.fetch_timeout(),
            echo_hits: cfg.echo_hits(),
            debug: cfg.debug,
        })
    }

    /// Absolute URL of `path` on the target host.
    pub fn url_for(&self, path: &str) -> Result<String, ScanError> {
        resolve_url(&self.host, path).map_err(|e| ScanError::InvalidUrl(format!("{e:#}")))
    }
}

/// Case-insensitive search for the literal `needle` in `body`.
fn body_contains(body: &[u8], needle: &str) -> bool {
    matcher(needle).is_some_and(|re| re.is_match(body))
}

/// Compiled matcher for `needle`, built once per distinct match string.
/// A needle that fails to compile is remembered as `None`.
fn matcher(needle: &str) -> Option<Arc<Regex>> {
    static MATCHERS: OnceLock<Mutex<HashMap<String, Option<Arc<Regex>>>>> = OnceLock::new();
    let mut matchers = MATCHERS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    matchers
        .entry(needle.to_string())
        .or_insert_with(|| {
            match RegexBuilder::new(&regex::escape(needle))
                .case_insensitive(true)
                .build()
            {
                Ok(re) => Some(Arc::new(re)),
                Err(e) => {
                    tracing::warn!(
                        needle,
                        error = %e,
                        "match string does not compile; treating as no match"
                    );
                    None
                }
            }
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: usize = 10;

    fn policy() -> ProbePolicy {
        ProbePolicy {
            expected_statuses: [200, 301, 401, 403].into_iter().collect(),
            crc_sample_len: SAMPLE,
            timeouts: TimeoutPolicy::default(),
        }
    }

    fn response(status: u32, body: &[u8]) -> FetchResponse {
        FetchResponse {
            status,
            body: body.to_vec(),
            headers: Vec::new(),
        }
    }

    const NOT_FOUND: &[u8] = b"<h1>Not Found</h1>..";

    fn baseline() -> u32 {
        compute_limited_crc(NOT_FOUND, SAMPLE)
    }

    #[test]
    fn root_is_never_classified() {
        let v = policy().classify(&DiscoveryTask::root(), &response(200, b"home"), baseline());
        assert_eq!(v, Verdict::Skipped);
    }

    #[test]
    fn transport_and_server_errors_retry() {
        let t = DiscoveryTask::new("/a", "A");
        assert_eq!(policy().classify(&t, &response(0, b""), baseline()), Verdict::Retry);
        assert_eq!(policy().classify(&t, &response(500, b"oops"), baseline()), Verdict::Retry);
    }

    #[test]
    fn unexpected_status_is_absent() {
        let t = DiscoveryTask::new("/a", "A");
        assert_eq!(
            policy().classify(&t, &response(404, b"whatever body"), baseline()),
            Verdict::Absent(AbsentReason::UnexpectedStatus(404))
        );
    }

    #[test]
    fn soft_404_matches_baseline_even_with_200() {
        let t = DiscoveryTask::new("/admin", "Admin");
        let r = response(200, NOT_FOUND);
        assert_eq!(policy().fingerprint(&r.body), baseline());
        assert_eq!(
            policy().classify(&t, &r, baseline()),
            Verdict::Absent(AbsentReason::MatchesBaseline)
        );
    }

    #[test]
    fn unauthorized_is_protected_and_never_a_result() {
        let t = DiscoveryTask::new("/secret", "Secret");
        let v = policy().classify(&t, &response(401, b"login required"), baseline());
        assert_eq!(v, Verdict::Protected);
        assert!(v.into_result(t, 401).is_none());
    }

    #[test]
    fn unauthorized_soft_404_is_absent_not_protected() {
        let t = DiscoveryTask::new("/secret", "Secret");
        assert_eq!(
            policy().classify(&t, &response(401, NOT_FOUND), baseline()),
            Verdict::Absent(AbsentReason::MatchesBaseline)
        );
    }

    #[test]
    fn match_string_is_case_insensitive_literal() {
        let t = DiscoveryTask::new("/backup.zip", "Backup").with_match_string("backup contents");
        let v = policy().classify(&t, &response(200, b"PK.. BACKUP Contents here"), baseline());
        assert_eq!(v, Verdict::Valid { string_matched: true });
        let r = v.into_result(t, 200).unwrap();
        assert!(r.string_matched);
        assert!(!r.protected);
    }

    #[test]
    fn match_string_special_characters_are_literal() {
        let t = DiscoveryTask::new("/x", "X").with_match_string("a.b(c");
        assert_eq!(
            policy().classify(&t, &response(200, b"zzzzzzzzzz axb(c"), baseline()),
            Verdict::Absent(AbsentReason::MatchStringMissing)
        );
        assert_eq!(
            policy().classify(&t, &response(200, b"zzzzzzzzzz a.b(c"), baseline()),
            Verdict::Valid { string_matched: true }
        );
    }

    #[test]
    fn match_string_is_compiled_once() {
        let first = matcher("Index of /backups").unwrap();
        let second = matcher("Index of /backups").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &matcher("index of /logs").unwrap()));
        assert!(body_contains(b"<title>INDEX OF /backups</title>", "Index of /backups"));
    }

    #[test]
    fn missing_match_string_is_absent_despite_expected_status() {
        let t = DiscoveryTask::new("/backup.zip", "Backup").with_match_string("backup contents");
        assert_eq!(
            policy().classify(&t, &response(200, b"an ordinary page"), baseline()),
            Verdict::Absent(AbsentReason::MatchStringMissing)
        );
    }

    #[test]
    fn status_alone_confirms_without_match_string() {
        let t = DiscoveryTask::new("/images", "Images");
        assert_eq!(
            policy().classify(&t, &response(403, b"Forbidden directory"), baseline()),
            Verdict::Valid { string_matched: false }
        );
    }

    #[test]
    fn settings_require_absolute_host() {
        let mut cfg = ScanConfig::default();
        assert!(matches!(
            ProbeSettings::from_config(&cfg),
            Err(ScanError::InvalidUrl(_))
        ));
        cfg.target_host = "http://example.com/".into();
        cfg.debug = true;
        cfg.display_output = false;
        let s = ProbeSettings::from_config(&cfg).unwrap();
        assert!(s.echo_hits);
        assert_eq!(s.timeout, Duration::from_secs(10));
        assert_eq!(s.url_for("/admin").unwrap(), "http://example.com/admin");
    }

    #[test]
    fn from_config_copies_knobs() {
        let mut cfg = ScanConfig::default();
        cfg.expected_path_responses = vec![200];
        cfg.max_timeout_count = 5;
        cfg.server_error_status = 503;
        cfg.crc_sample_len = 64;
        let p = ProbePolicy::from_config(&cfg);
        assert_eq!(p.expected_statuses.len(), 1);
        assert_eq!(p.timeouts.max_timeout_count, 5);
        assert_eq!(p.timeouts.server_error_status, 503);
        assert_eq!(p.crc_sample_len, 64);
    }
}
