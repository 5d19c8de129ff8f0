//! Error types shared across the client.

use thiserror::Error;

/// Boxed error produced by a transport implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Possible failures while talking to the service desk API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status (other than 401).
    /// The message is the body's `detail`, or a generic fallback.
    #[error("{message}")]
    Request { status: u16, message: String },

    /// The request never produced a response.
    #[error("network request failed: {0}")]
    Transport(#[source] BoxError),

    /// The response body was not the JSON we expected.
    #[error("failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Reading or writing the stored credential failed.
    #[error("credential storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        ApiError::Transport(Box::new(error))
    }
}

impl ApiError {
    /// The HTTP status of an application-level failure, if that's what this is.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failures from a credential store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// A previous holder of the session lock panicked.
    #[error("credential store lock poisoned")]
    Poisoned,
}

/// Failures while inspecting a bearer token locally.
#[derive(Debug, Error)]
pub enum ClaimsError {
    /// The token is not three `.`-separated segments.
    #[error("token is not a JWT")]
    Malformed,

    #[error("token payload is not base64url: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("token payload is not valid claims JSON: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Convenient result alias for API calls.
pub type Result<T> = std::result::Result<T, ApiError>;
