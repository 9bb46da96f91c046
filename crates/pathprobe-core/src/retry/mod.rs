//! Retry and timeout policy.
//!
//! Transport failures (status `0`) and the configured server-error status are
//! treated alike: the task is requeued until it has timed out
//! `max_timeout_count` times, then dropped with a single `RetryExhausted`
//! report. Both the worker pool and the batch backend go through this module.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify_status, ResponseKind, TRANSPORT_FAILURE};
pub use error::RetryExhausted;
pub use policy::{RetryDecision, TimeoutPolicy};
pub use run::run_with_retry;
