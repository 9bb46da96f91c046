//! Retry loop: fetch a task until it produces a response or the policy gives up.

use crate::fetch::FetchResponse;
use crate::task::DiscoveryTask;

use super::error::RetryExhausted;
use super::policy::{RetryDecision, TimeoutPolicy};

/// Calls `fetch` until it returns a non-retryable status or `task` runs out of
/// timeouts. Used where there is no queue to requeue onto (the batch backend).
///
/// `task.timeout_count` is updated in place, so the caller sees how many
/// retries were spent.
pub fn run_with_retry<F>(
    policy: &TimeoutPolicy,
    task: &mut DiscoveryTask,
    url: &str,
    mut fetch: F,
) -> Result<FetchResponse, RetryExhausted>
where
    F: FnMut() -> FetchResponse,
{
    let mut attempts = 0u32;
    loop {
        let response = fetch();
        attempts += 1;
        if !policy.is_retryable(response.status) {
            return Ok(response);
        }
        match policy.handle_timeout(task) {
            RetryDecision::Requeue => {
                tracing::debug!(url, attempt = attempts, "retrying after transport failure");
            }
            RetryDecision::Exhausted => {
                return Err(RetryExhausted {
                    url: url.to_string(),
                    attempts,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u32) -> FetchResponse {
        FetchResponse {
            status: code,
            body: Vec::new(),
            headers: Vec::new(),
        }
    }

    #[test]
    fn succeeds_after_two_failures() {
        let policy = TimeoutPolicy::default();
        let mut task = DiscoveryTask::new("/flaky", "Flaky");
        let mut script = vec![status(200), status(0), status(0)];
        let res = run_with_retry(&policy, &mut task, "http://h/flaky", || {
            script.pop().unwrap()
        })
        .unwrap();
        assert_eq!(res.status, 200);
        assert_eq!(task.timeout_count, 2);
    }

    #[test]
    fn third_failure_exhausts() {
        let policy = TimeoutPolicy::default();
        let mut task = DiscoveryTask::new("/flaky", "Flaky");
        let mut calls = 0;
        let err = run_with_retry(&policy, &mut task, "http://h/flaky", || {
            calls += 1;
            status(500)
        })
        .unwrap_err();
        assert_eq!(calls, 3);
        assert_eq!(err.attempts, 3);
        assert_eq!(err.url, "http://h/flaky");
    }
}
