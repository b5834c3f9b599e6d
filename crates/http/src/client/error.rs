//! Client error types

use paddock_core::{CoreError, ErrorInfo};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Raw error payload returned by the backend.
///
/// JSON bodies are kept as parsed; anything else is kept as a JSON string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody(pub Value);

impl ErrorBody {
    /// Parse a response body
    pub fn from_text(text: &str) -> Self {
        Self(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
    }

    /// Normalized `{code, message}` view of the payload
    pub fn info(&self) -> ErrorInfo {
        ErrorInfo::from_payload(&self.0)
    }
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let info = self.info();
        match (&info.code, &info.message, &self.0) {
            (Some(code), Some(message), _) => write!(f, "{code}: {message}"),
            (None, Some(message), _) | (Some(message), None, _) => f.write_str(message),
            (None, None, Value::String(text)) => f.write_str(text),
            (None, None, other) => write!(f, "{other}"),
        }
    }
}

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or transport error, no response received
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(ErrorBody),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(ErrorBody),

    /// Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(ErrorBody),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(ErrorBody),

    /// Server returned another error status
    #[error("Server error {status}: {body}")]
    ServerError { status: u16, body: ErrorBody },

    /// Access token renewal failed; the session was torn down
    #[error("Token refresh failed: {0}")]
    RefreshFailed(#[source] Box<ClientError>),

    /// Login answered with success but carried no session, only an error payload
    #[error("Login rejected: {0}")]
    LoginRejected(ErrorBody),

    /// An administrator login came back without an access token
    #[error("Administrator login returned no access token")]
    AdminTokenRequired,

    /// The backend answered with an unusable success payload
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Credential storage failed
    #[error("Credential storage error: {0}")]
    Storage(#[from] CoreError),
}

impl ClientError {
    /// Create error from HTTP status code and raw body text
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let body = ErrorBody::from_text(body);
        match status.as_u16() {
            400 => Self::BadRequest(body),
            401 => Self::AuthenticationFailed(body),
            403 => Self::Forbidden(body),
            404 => Self::NotFound(body),
            status => Self::ServerError { status, body },
        }
    }

    /// Build an error from a non-success response
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        Self::from_status(status, &text)
    }

    /// HTTP status of the failed response, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest(_) => Some(400),
            Self::AuthenticationFailed(_) => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::ServerError { status, .. } => Some(*status),
            Self::RefreshFailed(inner) => inner.status(),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Raw error payload, if the backend sent one
    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            Self::BadRequest(body)
            | Self::AuthenticationFailed(body)
            | Self::Forbidden(body)
            | Self::NotFound(body)
            | Self::LoginRejected(body)
            | Self::ServerError { body, .. } => Some(body),
            Self::RefreshFailed(inner) => inner.body(),
            _ => None,
        }
    }

    /// Normalized `{code, message}` for display; empty when no payload exists
    pub fn error_info(&self) -> ErrorInfo {
        self.body().map(ErrorBody::info).unwrap_or_default()
    }

    /// No response was received (connection refused, timeout, ...)
    pub fn is_network(&self) -> bool {
        match self {
            Self::Request(e) => e.status().is_none(),
            Self::RefreshFailed(inner) => inner.is_network(),
            _ => false,
        }
    }

    /// Check if this error indicates the credentials are no longer accepted
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthenticationFailed(_) | Self::RefreshFailed(_))
    }
}
