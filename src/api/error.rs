//! Errors returned by a single request to an Unmand service.
//!
//! [`ApiError`] classifies every failed request into the categories the
//! poller needs for its retry decision: only [`ApiError::Transport`] is
//! worth trying again.

use thiserror::Error;

/// Failure of one authenticated request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The credential was rejected (HTTP 401 or 403).
    #[error("credential rejected (status {status}): {message}")]
    Auth { status: u16, message: String },

    /// The service does not know the requested resource (HTTP 404).
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// The service answered with any other non-success status, or with a
    /// body that could not be understood.
    #[error("remote error (status {status}): {message}")]
    Remote { status: u16, message: String },

    /// The request never got an answer (DNS, refused connection, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The request could not be built from local input, such as a credential
    /// that is not a valid header value or an unusable base address. Nothing
    /// was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ApiError::InvalidRequest(err.to_string())
        } else if err.is_decode() {
            ApiError::Remote {
                status: err.status().map(|s| s.as_u16()).unwrap_or(200),
                message: format!("malformed response body: {err}"),
            }
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}
