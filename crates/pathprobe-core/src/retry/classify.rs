//! Classify a fetch status for retry decisions.

/// Status reported by the fetch layer when no HTTP response was received.
pub const TRANSPORT_FAILURE: u32 = 0;

/// What a fetch status means for the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Connection, DNS, or timeout failure (status `0`).
    Transport,
    /// The configured server-error status (default 500). Retried like a transport failure.
    ServerError,
    /// Any other HTTP response; goes on to classification.
    Response,
}

impl ResponseKind {
    pub fn is_retryable(self) -> bool {
        !matches!(self, ResponseKind::Response)
    }
}

/// Classify `status` given the status configured as a server error.
pub fn classify_status(status: u32, server_error_status: u32) -> ResponseKind {
    if status == TRANSPORT_FAILURE {
        ResponseKind::Transport
    } else if status == server_error_status {
        ResponseKind::ServerError
    } else {
        ResponseKind::Response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_transport_failure() {
        assert_eq!(classify_status(0, 500), ResponseKind::Transport);
        assert!(classify_status(0, 500).is_retryable());
    }

    #[test]
    fn configured_server_error_is_retryable() {
        assert_eq!(classify_status(500, 500), ResponseKind::ServerError);
        assert_eq!(classify_status(502, 502), ResponseKind::ServerError);
        assert!(classify_status(500, 500).is_retryable());
    }

    #[test]
    fn other_statuses_are_responses() {
        assert_eq!(classify_status(502, 500), ResponseKind::Response);
        assert_eq!(classify_status(404, 500), ResponseKind::Response);
        assert!(!classify_status(200, 500).is_retryable());
    }
}
