//! Error types for the flight API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because a `filter` against an expired
//! `searchId` comes back as 404 and the session reports it differently from
//! an outage. All other non-2xx responses land in `HttpError` with the raw
//! status code and body for debugging. Network failures never produce a
//! response at all, so they surface as `Transport` or `Timeout`.

use thiserror::Error;

/// Errors returned by `PetflyClient` parse methods and by repositories.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The server returned 404 for the requested resource.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The request never produced a response (DNS, connect, reset).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,
}

impl ApiError {
    /// True when the remote call itself failed (network, timeout or 5xx),
    /// as opposed to a contract problem with an otherwise healthy server.
    pub fn is_transport(&self) -> bool {
        match self {
            ApiError::Transport(_) | ApiError::Timeout => true,
            ApiError::HttpError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Errors raised while reading or writing persisted preferences.
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("preference file i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("preference file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_count_as_transport_failures() {
        let err = ApiError::HttpError {
            status: 503,
            body: String::new(),
        };
        assert!(err.is_transport());
        assert!(ApiError::Timeout.is_transport());
        assert!(ApiError::Transport("connection refused".into()).is_transport());
    }

    #[test]
    fn client_errors_are_not_transport_failures() {
        let err = ApiError::HttpError {
            status: 422,
            body: "bad segment".into(),
        };
        assert!(!err.is_transport());
        assert!(!ApiError::NotFound.is_transport());
        assert!(!ApiError::DeserializationError("eof".into()).is_transport());
    }

    #[test]
    fn display_includes_status_and_body() {
        let err = ApiError::HttpError {
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(err.to_string(), "HTTP 500: boom");
    }
}
