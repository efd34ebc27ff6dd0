//! Error taxonomy for the fetch stages.
//!
//! Client failures are carried inside [`crate::FetchOutcome::Failure`] rather
//! than propagated, so these types are `Clone` and comparable.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Non-2xx response.
    #[error("HTTP error! status: {status}")]
    Http { status: u16 },

    /// Body was not JSON or lacked required fields.
    #[error("parse error: {0}")]
    Parse(String),

    /// Request never produced a response (DNS, TLS, connection reset...).
    #[error("transport error: {0}")]
    Transport(String),

    /// Skipped because an earlier stage this one is keyed on failed.
    #[error("skipped: {stage} stage did not succeed")]
    DependencyFailed { stage: &'static str },

    /// Client was handed a key it cannot query with.
    #[error("{client} cannot be queried by {key}")]
    UnsupportedKey { client: &'static str, key: &'static str },
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        // The URL may carry an API key.
        let err = err.without_url();
        match err.status() {
            Some(status) => FetchError::Http { status: status.as_u16() },
            None if err.is_decode() => FetchError::Parse(err.to_string()),
            None => FetchError::Transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}

/// Why the device location could not be obtained. Always recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location is not supported")]
    Unsupported,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_carries_status() {
        let err = FetchError::Http { status: 401 };
        assert_eq!(err.status(), Some(401));
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn json_errors_become_parse_errors() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(FetchError::from(json_err), FetchError::Parse(_)));
    }
}
