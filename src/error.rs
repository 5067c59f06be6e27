// Client-side error taxonomy for calls against the VMS API
use thiserror::Error;

/// Errors surfaced by the resource client and the typed API wrappers.
///
/// The type is `Clone` so a single failure can be handed to every caller that
/// joined the same in-flight operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    // Transport failure: connection refused, TLS, DNS
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    // Non-2xx response. `message` is the server's `message` field when the body
    // was JSON and carried one, otherwise `HTTP <status>: <reason>`.
    #[error("{message}")]
    Http { status: u16, message: String },

    // Local validation failure, no request was issued
    #[error("{0}")]
    Validation(String),

    // Body did not have the shape the caller expected
    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Not signed in")]
    NotSignedIn,
}

impl ClientError {
    /// Build the generic status-line error used when the server gave no message.
    pub fn http_status(status: u16, reason: &str) -> Self {
        ClientError::Http {
            status,
            message: format!("HTTP {}: {}", status, reason),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether repeating the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Transport(_)
                | ClientError::Timeout(_)
                | ClientError::Http { .. }
                | ClientError::UnexpectedShape(_)
        )
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else if err.is_decode() {
            ClientError::UnexpectedShape(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::http_status(status.as_u16(), status.canonical_reason().unwrap_or(""))
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::UnexpectedShape(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidEndpoint(err.to_string())
    }
}
