use std::time::Duration;

/// Error type returned by this crate.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// Invalid method, URL or options. Raised before any transport call
    /// and never retried.
    #[error("invalid argument: {0}")]
    Argument(String),
    /// The attempt's deadline elapsed before the transport completed.
    #[error("Request timed out after {duration_ms}ms")]
    Timeout {
        /// Elapsed milliseconds since the attempt started.
        duration_ms: u64,
    },
    /// Network or request execution failure reported by the transport.
    #[error("transport error: {0}")]
    Transport(String),
    /// Status rejected by [`Response::error_for_status`](crate::Response::error_for_status).
    #[error("http error {status} for {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },
    /// A `json` payload could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),
    /// A response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl RequestError {
    pub(crate) fn argument(message: impl Into<String>) -> Self {
        Self::Argument(message.into())
    }

    /// Builds a transport failure from any displayable cause.
    pub fn transport(cause: impl std::fmt::Display) -> Self {
        Self::Transport(cause.to_string())
    }

    /// Returns `true` for the timeout variant.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` for argument validation failures.
    pub fn is_argument(&self) -> bool {
        matches!(self, Self::Argument(_))
    }

    /// Elapsed time of a timed-out attempt.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Self::Timeout { duration_ms } => Some(Duration::from_millis(*duration_ms)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::RequestError;

    #[test]
    fn timeout_message_and_markers() {
        let err = RequestError::Timeout { duration_ms: 42 };
        assert_eq!(err.to_string(), "Request timed out after 42ms");
        assert!(err.is_timeout());
        assert_eq!(err.duration(), Some(Duration::from_millis(42)));
    }

    #[test]
    fn transport_error_has_no_timeout_marker() {
        let err = RequestError::transport("connection refused");
        assert!(!err.is_timeout());
        assert_eq!(err.duration(), None);
        assert_eq!(err.to_string(), "transport error: connection refused");
    }
}
