//! Error reported when a task runs out of retries.

use std::fmt;

/// A task kept failing at the transport level and was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryExhausted {
    /// Absolute URL of the last attempt.
    pub url: String,
    /// Total fetch attempts made (first attempt included).
    pub attempts: u32,
}

impl fmt::Display for RetryExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} timed out after {} attempt(s)", self.url, self.attempts)
    }
}

impl std::error::Error for RetryExhausted {}
