//! Error types for the Skytap client.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Structured error returned by the API for a non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status code
    pub status: u16,
    /// Message from the error payload, or the canonical status text
    pub message: String,
    /// Value of the `X-Request-Id` response header
    pub request_id: Option<String>,
    /// Delay requested by the server through `Retry-After`
    pub retry_after: Option<Duration>,
    /// Existing resource referenced by the error body (409 on create)
    pub resource_url: Option<String>,
}

impl ApiError {
    /// Create an API error with only a status and message.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            request_id: None,
            retry_after: None,
            resource_url: None,
        }
    }

    /// 423 Locked, 429 Too Many Requests and the 5xx range can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self.status, 423 | 429 | 500..=599)
    }

    /// Whether the server rejected the request because the resource exists.
    pub fn is_conflict(&self) -> bool {
        self.status == 409
    }

    /// Whether the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API error: {} - {}", self.status, self.message)?;
        if let Some(id) = &self.request_id {
            write!(f, " (request id {})", id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Main error type for the client.
#[derive(Error, Debug)]
pub enum Error {
    // ===== Request Errors =====
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    // ===== API Errors =====
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("maximum retries reached after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    // ===== Convergence Errors =====
    #[error(
        "{resource} did not reach desired state within {}s (last observed: {last_state})",
        elapsed.as_secs()
    )]
    ConvergenceTimeout {
        resource: String,
        elapsed: Duration,
        last_state: String,
    },

    // ===== Cancellation =====
    #[error("Cancelled: operation was cancelled")]
    Cancelled,

    #[error("Deadline exceeded: operation deadline passed")]
    DeadlineExceeded,

    // ===== Transport Errors =====
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ===== Configuration Errors =====
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create an API error from a status and message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api(ApiError::new(status, message))
    }

    /// Check if the retry controller may re-issue the request.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Check if the error came from a cancellation or deadline.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// The structured API error, looking through retry exhaustion.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            Self::RetriesExhausted { source, .. } => source.api_error(),
            _ => None,
        }
    }

    /// HTTP status of the underlying API error, if any.
    pub fn status(&self) -> Option<u16> {
        self.api_error().map(|e| e.status)
    }

    /// Server-requested retry delay of the underlying API error, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Api(e) => e.retry_after,
            _ => None,
        }
    }
}
