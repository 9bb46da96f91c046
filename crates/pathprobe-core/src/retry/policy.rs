use crate::task::DiscoveryTask;

use super::classify::{classify_status, ResponseKind};

/// Decision returned by the timeout policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Put the task back on the queue; its `timeout_count` was incremented.
    Requeue,
    /// Give up on the task; report it once and drop it.
    Exhausted,
}

/// Bounded requeue policy for transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    /// How many times a task may be requeued before it is dropped.
    pub max_timeout_count: u32,
    /// HTTP status handled exactly like a transport failure.
    pub server_error_status: u32,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            max_timeout_count: 2,
            server_error_status: 500,
        }
    }
}

impl TimeoutPolicy {
    pub fn classify(&self, status: u32) -> ResponseKind {
        classify_status(status, self.server_error_status)
    }

    pub fn is_retryable(&self, status: u32) -> bool {
        self.classify(status).is_retryable()
    }

    /// Record a timeout on `task` and decide whether it goes back on the queue.
    ///
    /// A task therefore sees at most `max_timeout_count + 1` fetch attempts.
    pub fn handle_timeout(&self, task: &mut DiscoveryTask) -> RetryDecision {
        if task.timeout_count < self.max_timeout_count {
            task.timeout_count += 1;
            RetryDecision::Requeue
        } else {
            RetryDecision::Exhausted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requeues_until_max_then_exhausts() {
        let p = TimeoutPolicy {
            max_timeout_count: 2,
            server_error_status: 500,
        };
        let mut task = DiscoveryTask::new("/flaky", "Flaky");
        assert_eq!(p.handle_timeout(&mut task), RetryDecision::Requeue);
        assert_eq!(task.timeout_count, 1);
        assert_eq!(p.handle_timeout(&mut task), RetryDecision::Requeue);
        assert_eq!(task.timeout_count, 2);
        assert_eq!(p.handle_timeout(&mut task), RetryDecision::Exhausted);
        assert_eq!(task.timeout_count, 2);
    }

    #[test]
    fn zero_max_never_requeues() {
        let p = TimeoutPolicy {
            max_timeout_count: 0,
            server_error_status: 500,
        };
        let mut task = DiscoveryTask::new("/x", "X");
        assert_eq!(p.handle_timeout(&mut task), RetryDecision::Exhausted);
    }

    #[test]
    fn server_error_status_is_configurable() {
        let p = TimeoutPolicy {
            max_timeout_count: 1,
            server_error_status: 503,
        };
        assert!(p.is_retryable(0));
        assert!(p.is_retryable(503));
        assert!(!p.is_retryable(500));
    }
}
