//! Error types for the conversation layer.

use quatuor_core::QuatuorError;

/// Failures talking to the backend or the credential store.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("not signed in: no access token available")]
    MissingCredential,
    #[error("access token rejected by the backend")]
    Unauthorized,
    #[error("backend returned {status}: {body}")]
    Http { status: u16, body: String },
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            TransportError::Http {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Decode(err.to_string())
    }
}

/// Errors from conversation operations.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("a message is already being sent")]
    Busy,
    #[error("session name cannot be empty")]
    EmptyName,
    #[error("file upload is not available")]
    UploadUnavailable,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("core error: {0}")]
    Core(#[from] QuatuorError),
}
