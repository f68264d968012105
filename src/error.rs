use thiserror::Error;

use crate::api::ApiError;
use crate::extraction::Status;

#[derive(Debug, Error)]
pub enum UnmandError {
    /// Local input was rejected before any request was made.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("API error: {0}")]
    Api(#[source] ApiError),

    /// A status query failed for a reason retrying would not fix, or
    /// transport retries ran out.
    #[error("Polling of extraction {id} failed while {last_status}: {source}")]
    Poll {
        id: String,
        last_status: Status,
        source: ApiError,
    },

    /// The extraction was still in progress when the poll budget ran out.
    #[error("Extraction {id} still {last_status} after {attempts} status queries")]
    PollTimeout {
        id: String,
        last_status: Status,
        attempts: u32,
    },

    #[error("Polling of extraction {id} cancelled while {last_status}")]
    Cancelled { id: String, last_status: Status },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

// A request that could not even be built is bad local input.
impl From<ApiError> for UnmandError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::InvalidRequest(message) => UnmandError::Validation(message),
            other => UnmandError::Api(other),
        }
    }
}

impl UnmandError {
    /// The request failure behind this error, whether or not it happened
    /// while polling.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            UnmandError::Api(err) | UnmandError::Poll { source: err, .. } => Some(err),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, UnmandError::Validation(_))
    }

    pub fn is_auth(&self) -> bool {
        matches!(self.api_error(), Some(ApiError::Auth { .. }))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.api_error(), Some(ApiError::NotFound { .. }))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self.api_error(), Some(ApiError::Transport(_)))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.api_error(), Some(ApiError::Remote { .. }))
    }

    pub fn is_poll_timeout(&self) -> bool {
        matches!(self, UnmandError::PollTimeout { .. })
    }
}

pub type Result<T, E = UnmandError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_timeout_display_carries_context() {
        let err = UnmandError::PollTimeout {
            id: "job-1".into(),
            last_status: Status::Processing,
            attempts: 5,
        };
        assert_eq!(
            err.to_string(),
            "Extraction job-1 still PROCESSING after 5 status queries"
        );
        assert!(err.is_poll_timeout());
    }

    #[test]
    fn api_errors_classify() {
        let auth: UnmandError = ApiError::Auth {
            status: 401,
            message: "bad token".into(),
        }
        .into();
        assert!(auth.is_auth());
        assert!(!auth.is_transport());

        let missing: UnmandError = ApiError::NotFound {
            resource: "extraction x".into(),
        }
        .into();
        assert!(missing.is_not_found());

        let net: UnmandError = ApiError::Transport("reset".into()).into();
        assert!(net.is_transport());
    }

    #[test]
    fn unbuildable_request_is_validation() {
        let err: UnmandError = ApiError::InvalidRequest("bad credential".into()).into();
        assert!(err.is_validation());
        assert!(err.api_error().is_none());
    }

    #[test]
    fn poll_failure_keeps_context_and_classification() {
        let err = UnmandError::Poll {
            id: "job-9".into(),
            last_status: Status::Processing,
            source: ApiError::Remote {
                status: 502,
                message: "bad gateway".into(),
            },
        };
        assert!(err.is_remote());
        assert!(!err.is_transport());
        assert_eq!(
            err.to_string(),
            "Polling of extraction job-9 failed while PROCESSING: \
             remote error (status 502): bad gateway"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
